//! All kinds of errors in this crate.

use crate::cells::{Coord, State};
use displaydoc::Display;
use thiserror::Error;

/// All kinds of errors in this crate.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// Unable to set cell at {0:?}.
    SetCellError(Coord),
    /// Cell at {0:?} has invalid state: {1:?}.
    InvalidState(Coord, State),
    /// Width / height / period should be positive.
    NonPositiveError,
    /// Symmetry or transformation requires the soup to be square.
    SquareWorldError,
    /// Invalid soup settings: exhaustive search needs C1 symmetry, random soups need a density of at most 100 and some states.
    SoupError,
    /// The search space is too large to enumerate.
    SearchSpaceError,
    /// B0 is not supported in Generations rules yet.
    B0GenerationsError,
    /// The rule does not support minimum and maximum rules.
    RuleRangeUnsupported,
    /// The minimum and maximum rules are inconsistent.
    InvalidRuleRange,
    /// The speed {0}c/{1} is not supported; dy and the period must be coprime and 0 < dy < period.
    InvalidSpeed(i32, i32),
    /// The background of the rule alternates with period {0}, which does not divide {1}.
    AlternatingPeriodError(usize, i32),
    /// The rule needs at least one neighbour and two states.
    InvalidRule,
    /// Unable to write results: {0}.
    WriteError(String),
}
