//! Cellular automata rules.
//!
//! The engine only talks to rules through the [`Rule`] trait.
//! Parsing rule strings is left to the caller; the rule families here
//! are built from their parameters directly.

mod generations;
mod hrot;
pub mod neighbourhood;
mod totalistic;

use crate::{
    cells::{Coord, State, DEAD},
    error::Error,
};
use rand::Rng;
use std::fmt::{Debug, Display};

pub use generations::HrotGenerations;
pub use hrot::Hrot;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single observed transition of a cell, in absolute states.
///
/// Collected along a trajectory to narrow down the rules
/// that would have produced the same evolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transition {
    /// States of the neighbours, in the order of the neighbourhood.
    pub neighbours: Vec<State>,
    /// State of the cell itself.
    pub state: State,
    /// State of the cell in the next generation.
    pub next: State,
}

/// A cellular automaton rule.
///
/// Rules display as their rule strings.
///
/// A rule must be a pure function of its inputs, so that one instance
/// can be shared read-only by every search worker.
///
/// The last few methods form the optional "rule range" capability,
/// which is needed by [`RuleSearch`](crate::RuleSearch) and by
/// min / max rule inference. Rules that don't support it keep the
/// default implementations, which return
/// [`Error::RuleRangeUnsupported`].
pub trait Rule: Clone + Debug + Display + Send + Sync {
    /// The neighbourhood of a cell, as offsets relative to the cell.
    ///
    /// Neighbour states are passed to [`transition`](Rule::transition)
    /// in exactly this order.
    fn neighbourhood(&self, generation: u64) -> &[Coord];

    /// Weights of the neighbours, if the rule is weighted.
    fn weights(&self) -> Option<&[u32]> {
        None
    }

    /// The number of states.
    fn num_states(&self) -> usize;

    /// The background state at a given generation.
    ///
    /// For rules with `B0`, the background changes periodically.
    fn background(&self, _generation: u64) -> State {
        DEAD
    }

    /// The period with which the background changes.
    fn alternating_period(&self) -> usize {
        1
    }

    /// Computes the next state of a cell.
    ///
    /// All states are absolute, i.e., not relative to the background.
    fn transition(&self, neighbours: &[State], state: State, generation: u64, coord: Coord)
        -> State;

    /// The range of the neighbourhood, i.e., the largest absolute value
    /// of any coordinate of any neighbour.
    fn range(&self) -> i32 {
        self.neighbourhood(0)
            .iter()
            .map(|c| c.x.abs().max(c.y.abs()))
            .max()
            .unwrap_or(0)
    }

    /// Converts between absolute states and states relative to the background.
    ///
    /// The background and [`DEAD`] trade places; every other state stays.
    /// Applying it twice gives back the original state.
    #[inline]
    fn convert_state(&self, state: State, generation: u64) -> State {
        let background = self.background(generation);
        if state == DEAD {
            background
        } else if state == background {
            DEAD
        } else {
            state
        }
    }

    /// Whether the rule supports minimum and maximum rules.
    fn supports_range(&self) -> bool {
        false
    }

    /// Whether `min` and `max` are a consistent pair of bounding rules
    /// of the same family as this rule.
    fn valid_min_max(&self, _min: &Self, _max: &Self) -> bool {
        false
    }

    /// Whether this rule lies between `min` and `max`.
    fn between(&self, _min: &Self, _max: &Self) -> Result<bool, Error> {
        Err(Error::RuleRangeUnsupported)
    }

    /// Picks a random rule between `min` and `max`.
    fn randomise<G: Rng + ?Sized>(
        &self,
        _min: &Self,
        _max: &Self,
        _rng: &mut G,
    ) -> Result<Self, Error> {
        Err(Error::RuleRangeUnsupported)
    }

    /// The tightest minimum and maximum rules that agree with
    /// every observed transition.
    fn min_max_rule(&self, _transitions: &[Transition]) -> Result<(Self, Self), Error> {
        Err(Error::RuleRangeUnsupported)
    }
}
