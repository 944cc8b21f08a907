//! Birth and survival conditions shared by the outer totalistic families.

use crate::cells::{State, ALIVE, DEAD};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts the living neighbours, weighted if needed.
#[inline]
pub(crate) fn count(neighbours: &[State], weights: Option<&[u32]>) -> u32 {
    match weights {
        Some(weights) => neighbours
            .iter()
            .zip(weights)
            .filter(|&(&s, _)| s == ALIVE)
            .map(|(_, &w)| w)
            .sum(),
        None => neighbours.iter().filter(|&&s| s == ALIVE).count() as u32,
    }
}

/// Birth and survival conditions, indexed by neighbour count.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct Conditions {
    pub(crate) birth: Vec<bool>,
    pub(crate) survival: Vec<bool>,
}

impl Conditions {
    /// Conditions from lists of counts. Counts above `max_count` are dropped.
    pub(crate) fn new(birth: &[u32], survival: &[u32], max_count: u32) -> Self {
        let mut conditions = Conditions::empty(max_count);
        for &b in birth.iter().filter(|&&b| b <= max_count) {
            conditions.birth[b as usize] = true;
        }
        for &s in survival.iter().filter(|&&s| s <= max_count) {
            conditions.survival[s as usize] = true;
        }
        conditions
    }

    pub(crate) fn empty(max_count: u32) -> Self {
        let len = max_count as usize + 1;
        Conditions {
            birth: vec![false; len],
            survival: vec![false; len],
        }
    }

    pub(crate) fn full(max_count: u32) -> Self {
        let len = max_count as usize + 1;
        Conditions {
            birth: vec![true; len],
            survival: vec![true; len],
        }
    }

    pub(crate) fn max_count(&self) -> u32 {
        self.birth.len() as u32 - 1
    }

    #[inline]
    pub(crate) fn birth(&self, count: u32) -> bool {
        self.birth.get(count as usize).copied().unwrap_or(false)
    }

    #[inline]
    pub(crate) fn survival(&self, count: u32) -> bool {
        self.survival.get(count as usize).copied().unwrap_or(false)
    }

    pub(crate) fn has_b0(&self) -> bool {
        self.birth(0)
    }

    pub(crate) fn has_smax(&self) -> bool {
        self.survival(self.max_count())
    }

    /// The counts in a condition, as a list.
    pub(crate) fn list(set: &[bool]) -> Vec<u32> {
        set.iter()
            .enumerate()
            .filter(|&(_, &b)| b)
            .map(|(i, _)| i as u32)
            .collect()
    }

    pub(crate) fn is_subset(&self, other: &Self) -> bool {
        self.birth.len() == other.birth.len()
            && subset(&self.birth, &other.birth)
            && subset(&self.survival, &other.survival)
    }

    /// Keeps everything in `min`, and each extra condition of `max`
    /// with a probability drawn once per call.
    pub(crate) fn randomise<G: Rng + ?Sized>(min: &Self, max: &Self, rng: &mut G) -> Self {
        Conditions {
            birth: randomise_set(&min.birth, &max.birth, rng),
            survival: randomise_set(&min.survival, &max.survival, rng),
        }
    }

    /// Narrows the full range of conditions down by the observed transitions.
    ///
    /// Each item is `(count, state, next)`.
    pub(crate) fn min_max<I>(max_count: u32, observed: I) -> (Self, Self)
    where
        I: IntoIterator<Item = (u32, State, State)>,
    {
        let mut min = Conditions::empty(max_count);
        let mut max = Conditions::full(max_count);
        for (count, state, next) in observed {
            let i = count as usize;
            if i > max_count as usize {
                continue;
            }
            match (state, next) {
                (DEAD, ALIVE) => min.birth[i] = true,
                (DEAD, _) => max.birth[i] = false,
                (ALIVE, ALIVE) => min.survival[i] = true,
                (ALIVE, _) => max.survival[i] = false,
                _ => {}
            }
        }
        (min, max)
    }
}

fn subset(a: &[bool], b: &[bool]) -> bool {
    a.iter().zip(b).all(|(&x, &y)| !x || y)
}

fn randomise_set<G: Rng + ?Sized>(min: &[bool], max: &[bool], rng: &mut G) -> Vec<bool> {
    let p: f64 = rng.gen_range(0.25..0.75);
    min.iter()
        .zip(max)
        .map(|(&lo, &hi)| lo || (hi && rng.gen::<f64>() >= p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn randomised_lies_between() {
        let min = Conditions::new(&[3], &[2, 3], 8);
        let max = Conditions::new(&[1, 2, 3, 4], &[1, 2, 3, 5, 8], 8);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let c = Conditions::randomise(&min, &max, &mut rng);
            assert!(min.is_subset(&c));
            assert!(c.is_subset(&max));
        }
    }

    #[test]
    fn min_max_from_transitions() {
        let observed = vec![(3, DEAD, ALIVE), (2, DEAD, DEAD), (1, ALIVE, DEAD), (2, ALIVE, ALIVE)];
        let (min, max) = Conditions::min_max(8, observed);
        assert_eq!(Conditions::list(&min.birth), vec![3]);
        assert_eq!(Conditions::list(&min.survival), vec![2]);
        assert!(!max.birth(2));
        assert!(max.birth(4));
        assert!(!max.survival(1));
        assert!(min.is_subset(&max));
    }
}
