//! Outer totalistic Generations rules.

use super::{
    hrot::write_conditions,
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

/// An outer totalistic Generations rule.
///
/// State `1` is alive, states from `2` to `num_states - 1` are dying.
/// Only living cells count as neighbours. A living cell that does not
/// survive starts dying, and a dying cell moves on to the next state
/// until it wraps back to [`DEAD`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HrotGenerations {
    neighbourhood: Cow<'static, [Coord]>,
    weights: Option<Vec<u32>>,
    conditions: Conditions,
    num_states: usize,
}

impl HrotGenerations {
    /// Constructs a new rule from the birth and survival counts
    /// and the number of states.
    pub fn new(
        birth: &[u32],
        survival: &[u32],
        num_states: usize,
        neighbourhood: Cow<'static, [Coord]>,
    ) -> Result<Self, Error> {
        HrotGenerations::build(birth, survival, num_states, neighbourhood, None)
    }

    /// Constructs a new weighted rule.
    pub fn with_weights(
        birth: &[u32],
        survival: &[u32],
        num_states: usize,
        neighbourhood: Cow<'static, [Coord]>,
        weights: Vec<u32>,
    ) -> Result<Self, Error> {
        if weights.len() != neighbourhood.len() {
            return Err(Error::InvalidRule);
        }
        HrotGenerations::build(birth, survival, num_states, neighbourhood, Some(weights))
    }

    fn build(
        birth: &[u32],
        survival: &[u32],
        num_states: usize,
        neighbourhood: Cow<'static, [Coord]>,
        weights: Option<Vec<u32>>,
    ) -> Result<Self, Error> {
        if neighbourhood.is_empty() || num_states < 2 {
            return Err(Error::InvalidRule);
        }
        if birth.contains(&0) {
            return Err(Error::B0GenerationsError);
        }
        let max_count = match &weights {
            Some(weights) => weights.iter().sum(),
            None => neighbourhood.len() as u32,
        };
        Ok(HrotGenerations {
            neighbourhood,
            weights,
            conditions: Conditions::new(birth, survival, max_count),
            num_states,
        })
    }

    /// Birth conditions.
    pub fn birth(&self) -> Vec<u32> {
        Conditions::list(&self.conditions.birth)
    }

    /// Survival conditions.
    pub fn survival(&self) -> Vec<u32> {
        Conditions::list(&self.conditions.survival)
    }

    fn with_conditions(&self, conditions: Conditions) -> Self {
        HrotGenerations {
            conditions,
            ..self.clone()
        }
    }

    fn same_family(&self, other: &Self) -> bool {
        self.neighbourhood == other.neighbourhood
            && self.weights == other.weights
            && self.num_states == other.num_states
    }

    /// The state after `state` for a cell that does not stay alive.
    fn decay(&self, state: State) -> State {
        if state.0 + 1 >= self.num_states {
            DEAD
        } else {
            State(state.0 + 1)
        }
    }
}

impl Rule for HrotGenerations {
    fn neighbourhood(&self, _generation: u64) -> &[Coord] {
        &self.neighbourhood
    }

    fn weights(&self) -> Option<&[u32]> {
        self.weights.as_deref()
    }

    fn num_states(&self) -> usize {
        self.num_states
    }

    #[inline]
    fn transition(&self, neighbours: &[State], state: State, _: u64, _: Coord) -> State {
        match state {
            DEAD => {
                if self.conditions.birth(count(neighbours, self.weights())) {
                    ALIVE
                } else {
                    DEAD
                }
            }
            ALIVE => {
                if self.conditions.survival(count(neighbours, self.weights())) {
                    ALIVE
                } else {
                    self.decay(ALIVE)
                }
            }
            dying => self.decay(dying),
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
        let mut conditions = Conditions::randomise(&min.conditions, &max.conditions, rng);
        conditions.birth[0] = false;
        Ok(self.with_conditions(conditions))
    }

    fn min_max_rule(&self, transitions: &[Transition]) -> Result<(Self, Self), Error> {
        let weights = self.weights();
        let (min, mut max) = Conditions::min_max(
            self.conditions.max_count(),
            transitions
                .iter()
                .map(|t| (count(&t.neighbours, weights), t.state, t.next)),
        );
        max.birth[0] = false;
        Ok((self.with_conditions(min), self.with_conditions(max)))
    }
}

impl Display for HrotGenerations {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write_conditions(f, &self.birth(), &self.survival())?;
        write!(f, "/G{}", self.num_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::neighbourhood::moore;

    #[test]
    fn brians_brain() -> Result<(), Error> {
        let rule = HrotGenerations::new(&[2], &[], 3, moore(1))?;
        assert_eq!(rule.to_string(), "B2/S/G3");
        let mut neighbours = vec![DEAD; 8];
        neighbours[0] = ALIVE;
        neighbours[5] = ALIVE;
        assert_eq!(rule.transition(&neighbours, DEAD, 0, Coord::ORIGIN), ALIVE);
        assert_eq!(rule.transition(&neighbours, ALIVE, 0, Coord::ORIGIN), State(2));
        assert_eq!(rule.transition(&neighbours, State(2), 0, Coord::ORIGIN), DEAD);
        Ok(())
    }

    #[test]
    fn rejects_b0() {
        assert_eq!(
            HrotGenerations::new(&[0, 2], &[], 3, moore(1)),
            Err(Error::B0GenerationsError)
        );
    }
}
