//! Outer totalistic rules of arbitrary range.

use super::{
    neighbourhood::moore,
    totalistic::{count, Conditions},
    Rule, Transition,
};
use crate::{
    cells::{Coord, State, ALIVE, DEAD},
    error::Error,
};
use rand::Rng;
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A higher range outer totalistic (HROT) rule.
///
/// A dead cell becomes alive when its (weighted) number of living
/// neighbours is in the birth conditions; a living cell stays alive when
/// the number is in the survival conditions.
///
/// Rules with `B0` are emulated with an alternating background.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hrot {
    neighbourhood: Cow<'static, [Coord]>,
    weights: Option<Vec<u32>>,
    conditions: Conditions,
    /// The background state in each generation of the alternating period.
    background: Vec<State>,
}

impl Hrot {
    /// Constructs a new rule from the birth and survival counts.
    pub fn new(
        birth: &[u32],
        survival: &[u32],
        neighbourhood: Cow<'static, [Coord]>,
    ) -> Result<Self, Error> {
        if neighbourhood.is_empty() {
            return Err(Error::InvalidRule);
        }
        let max_count = neighbourhood.len() as u32;
        Ok(Hrot::from_parts(
            neighbourhood,
            None,
            Conditions::new(birth, survival, max_count),
        ))
    }

    /// Constructs a new rule where each neighbour counts with a weight.
    pub fn with_weights(
        birth: &[u32],
        survival: &[u32],
        neighbourhood: Cow<'static, [Coord]>,
        weights: Vec<u32>,
    ) -> Result<Self, Error> {
        if neighbourhood.is_empty() || weights.len() != neighbourhood.len() {
            return Err(Error::InvalidRule);
        }
        let max_count = weights.iter().sum();
        Ok(Hrot::from_parts(
            neighbourhood,
            Some(weights),
            Conditions::new(birth, survival, max_count),
        ))
    }

    /// A range 1 Moore rule.
    pub fn moore(birth: &[u32], survival: &[u32]) -> Self {
        let neighbourhood = moore(1);
        let max_count = neighbourhood.len() as u32;
        Hrot::from_parts(
            neighbourhood,
            None,
            Conditions::new(birth, survival, max_count),
        )
    }

    /// Conway's Game of Life, `B3/S23`.
    pub fn life() -> Self {
        Hrot::moore(&[3], &[2, 3])
    }

    fn from_parts(
        neighbourhood: Cow<'static, [Coord]>,
        weights: Option<Vec<u32>>,
        conditions: Conditions,
    ) -> Self {
        let background = if !conditions.has_b0() {
            vec![DEAD]
        } else if conditions.has_smax() {
            vec![ALIVE]
        } else {
            vec![DEAD, ALIVE]
        };
        Hrot {
            neighbourhood,
            weights,
            conditions,
            background,
        }
    }

    /// Birth conditions.
    pub fn birth(&self) -> Vec<u32> {
        Conditions::list(&self.conditions.birth)
    }

    /// Survival conditions.
    pub fn survival(&self) -> Vec<u32> {
        Conditions::list(&self.conditions.survival)
    }

    /// Whether the rule contains `B0`.
    pub fn has_b0(&self) -> bool {
        self.conditions.has_b0()
    }

    fn same_family(&self, other: &Self) -> bool {
        self.neighbourhood == other.neighbourhood && self.weights == other.weights
    }
}

impl Rule for Hrot {
    fn neighbourhood(&self, _generation: u64) -> &[Coord] {
        &self.neighbourhood
    }

    fn weights(&self) -> Option<&[u32]> {
        self.weights.as_deref()
    }

    fn num_states(&self) -> usize {
        2
    }

    fn background(&self, generation: u64) -> State {
        self.background[generation as usize % self.background.len()]
    }

    fn alternating_period(&self) -> usize {
        self.background.len()
    }

    #[inline]
    fn transition(&self, neighbours: &[State], state: State, _: u64, _: Coord) -> State {
        let n = count(neighbours, self.weights());
        let alive = if state == DEAD {
            self.conditions.birth(n)
        } else {
            self.conditions.survival(n)
        };
        if alive {
            ALIVE
        } else {
            DEAD
        }
    }

    fn supports_range(&self) -> bool {
        true
    }

    fn valid_min_max(&self, min: &Self, max: &Self) -> bool {
        self.same_family(min) && self.same_family(max) && min.conditions.is_subset(&max.conditions)
    }

    fn between(&self, min: &Self, max: &Self) -> Result<bool, Error> {
        if !self.valid_min_max(min, max) {
            return Err(Error::InvalidRuleRange);
        }
        Ok(min.conditions.is_subset(&self.conditions) && self.conditions.is_subset(&max.conditions))
    }

    fn randomise<G: Rng + ?Sized>(&self, min: &Self, max: &Self, rng: &mut G) -> Result<Self, Error> {
        if !self.valid_min_max(min, max) {
            return Err(Error::InvalidRuleRange);
        }
        let conditions = Conditions::randomise(&min.conditions, &max.conditions, rng);
        Ok(Hrot::from_parts(
            self.neighbourhood.clone(),
            self.weights.clone(),
            conditions,
        ))
    }

    fn min_max_rule(&self, transitions: &[Transition]) -> Result<(Self, Self), Error> {
        let weights = self.weights();
        let (min, max) = Conditions::min_max(
            self.conditions.max_count(),
            transitions
                .iter()
                .map(|t| (count(&t.neighbours, weights), t.state, t.next)),
        );
        Ok((
            Hrot::from_parts(self.neighbourhood.clone(), self.weights.clone(), min),
            Hrot::from_parts(self.neighbourhood.clone(), self.weights.clone(), max),
        ))
    }
}

/// Writes the conditions like `B3/S23`, with commas once any count
/// has more than one digit.
pub(crate) fn write_conditions(f: &mut Formatter, birth: &[u32], survival: &[u32]) -> fmt::Result {
    let sep = if birth.iter().chain(survival).any(|&n| n > 9) {
        ","
    } else {
        ""
    };
    let join = |list: &[u32]| {
        list.iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(sep)
    };
    write!(f, "B{}/S{}", join(birth), join(survival))
}

impl Display for Hrot {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write_conditions(f, &self.birth(), &self.survival())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn life() {
        let life = Hrot::life();
        assert_eq!(life.to_string(), "B3/S23");
        assert_eq!(life.alternating_period(), 1);
        let mut neighbours = vec![DEAD; 8];
        neighbours[..3].copy_from_slice(&[ALIVE; 3]);
        assert_eq!(life.transition(&neighbours, DEAD, 0, Coord::ORIGIN), ALIVE);
        neighbours[3] = ALIVE;
        assert_eq!(life.transition(&neighbours, ALIVE, 0, Coord::ORIGIN), DEAD);
    }

    #[test]
    fn b0_background() {
        let rule = Hrot::moore(&[0, 1], &[2]);
        assert_eq!(rule.alternating_period(), 2);
        assert_eq!(rule.background(1), ALIVE);
        assert_eq!(rule.convert_state(DEAD, 1), ALIVE);
        assert_eq!(rule.convert_state(ALIVE, 1), DEAD);
        let rule = Hrot::moore(&[0], &[8]);
        assert_eq!(rule.background(0), ALIVE);
    }

    #[test]
    fn range_capability() -> Result<(), Error> {
        let min = Hrot::moore(&[3], &[2, 3]);
        let max = Hrot::moore(&[3, 4, 5], &[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(1);
        let rule = min.randomise(&min, &max, &mut rng)?;
        assert!(rule.between(&min, &max)?);
        assert_eq!(
            max.randomise(&max, &min, &mut rng),
            Err(Error::InvalidRuleRange)
        );
        Ok(())
    }

    #[test]
    fn weighted_count() -> Result<(), Error> {
        let rule = Hrot::with_weights(&[2], &[], moore(1), vec![2, 1, 1, 1, 1, 1, 1, 1])?;
        let mut neighbours = vec![DEAD; 8];
        neighbours[0] = ALIVE;
        assert_eq!(rule.transition(&neighbours, DEAD, 0, Coord::ORIGIN), ALIVE);
        assert!(Hrot::with_weights(&[2], &[], moore(1), vec![1]).is_err());
        Ok(())
    }
}
