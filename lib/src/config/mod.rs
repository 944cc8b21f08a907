//! Search parameters.
//!
//! Each search engine is built from one of these parameter structs.
//! The parameters are checked once, when the search is created.

mod d8;

pub use d8::{Symmetry, Transform};

use crate::{
    cells::{State, ALIVE},
    error::Error,
    grid::Grid,
    identify::IdentifyOptions,
    rules::Rule,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of a [`BruteForceSearch`](crate::BruteForceSearch).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BruteForceParams<R: Rule> {
    /// The rule.
    pub rule: R,

    /// Soups that do not repeat within this many generations are ignored.
    pub max_period: u64,

    /// Width of the soup.
    pub width: i32,

    /// Height of the soup.
    pub height: i32,

    /// Whether to draw random soups instead of enumerating every soup.
    pub random: bool,

    /// Symmetry of random soups.
    ///
    /// Enumeration only supports [`Symmetry::C1`].
    pub symmetry: Symmetry,

    /// Probability in percent that a cell of a random soup is filled.
    pub density: u32,

    /// States that may appear in a random soup.
    pub states: Vec<State>,

    /// Seed of the random number generator.
    ///
    /// `None` means a seed from the operating system.
    pub seed: Option<u64>,
}

impl<R: Rule> BruteForceParams<R> {
    /// Enumerates every soup of the given size.
    pub fn new(rule: R, width: i32, height: i32) -> Self {
        BruteForceParams {
            rule,
            max_period: 100,
            width,
            height,
            random: false,
            symmetry: Symmetry::C1,
            density: 50,
            states: vec![ALIVE],
            seed: None,
        }
    }

    /// Sets the maximal period.
    pub fn set_max_period(mut self, max_period: u64) -> Self {
        self.max_period = max_period;
        self
    }

    /// Switches to random soups with the given symmetry and density.
    pub fn set_random(mut self, symmetry: Symmetry, density: u32) -> Self {
        self.random = true;
        self.symmetry = symmetry;
        self.density = density;
        self
    }

    /// Sets the states of random soups.
    pub fn set_states(mut self, states: Vec<State>) -> Self {
        self.states = states;
        self
    }

    /// Sets the seed.
    pub fn set_seed<T: Into<Option<u64>>>(mut self, seed: T) -> Self {
        self.seed = seed.into();
        self
    }

    /// Identification options of each soup.
    pub fn identify_options(&self) -> IdentifyOptions {
        IdentifyOptions::new(self.max_period).set_orientation_invariant(true)
    }

    /// The number of soups in exhaustive mode, `num_states ^ (width × height)`.
    pub fn search_space(&self) -> Result<u64, Error> {
        let cells = (self.width as u32).saturating_mul(self.height as u32);
        (self.rule.num_states() as u64)
            .checked_pow(cells)
            .ok_or(Error::SearchSpaceError)
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.width <= 0 || self.height <= 0 || self.max_period == 0 {
            return Err(Error::NonPositiveError);
        }
        if self.random {
            if self.density > 100 || self.states.is_empty() {
                return Err(Error::SoupError);
            }
            if let Some(&state) = self
                .states
                .iter()
                .find(|s| s.0 == 0 || s.0 >= self.rule.num_states())
            {
                return Err(Error::InvalidState(Default::default(), state));
            }
            if self.symmetry.square_world() && self.width != self.height {
                return Err(Error::SquareWorldError);
            }
        } else {
            if self.symmetry != Symmetry::C1 {
                return Err(Error::SoupError);
            }
            self.search_space()?;
        }
        Ok(())
    }
}

/// Parameters of a [`RuleSearch`](crate::RuleSearch).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleSearchParams<R: Rule> {
    /// The pattern to run under each random rule.
    pub target: Grid,

    /// The minimal rule.
    pub min_rule: R,

    /// The maximal rule.
    pub max_rule: R,

    /// Patterns that do not repeat within this many generations are ignored.
    pub max_period: u64,

    /// Identification stops once the population drops below this.
    pub min_population: usize,

    /// Identification stops once the population exceeds this.
    pub max_population: usize,

    /// Identification stops once the bounding box is wider than this.
    pub max_width: i32,

    /// Identification stops once the bounding box is taller than this.
    pub max_height: i32,

    /// Spaceships with a larger period are reported immediately.
    pub high_period: u64,

    /// Seed of the random number generator.
    ///
    /// `None` means a seed from the operating system.
    pub seed: Option<u64>,
}

impl<R: Rule> RuleSearchParams<R> {
    /// Searches the rules between `min_rule` and `max_rule`.
    pub fn new(target: Grid, min_rule: R, max_rule: R) -> Self {
        RuleSearchParams {
            target,
            min_rule,
            max_rule,
            max_period: 100,
            min_population: 1,
            max_population: 1000,
            max_width: 100,
            max_height: 100,
            high_period: 100,
            seed: None,
        }
    }

    /// Sets the maximal period.
    pub fn set_max_period(mut self, max_period: u64) -> Self {
        self.max_period = max_period;
        self
    }

    /// Sets the population bounds.
    pub fn set_population(mut self, min_population: usize, max_population: usize) -> Self {
        self.min_population = min_population;
        self.max_population = max_population;
        self
    }

    /// Sets the bounding box limits.
    pub fn set_max_bounds(mut self, max_width: i32, max_height: i32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Sets the period above which spaceships are reported immediately.
    pub fn set_high_period(mut self, high_period: u64) -> Self {
        self.high_period = high_period;
        self
    }

    /// Sets the seed.
    pub fn set_seed<T: Into<Option<u64>>>(mut self, seed: T) -> Self {
        self.seed = seed.into();
        self
    }

    /// Identification options of each rule.
    pub fn identify_options(&self) -> IdentifyOptions {
        IdentifyOptions::new(self.max_period)
            .set_orientation_invariant(true)
            .set_min_max_rule(true)
    }

    /// Whether a generation stays within the population and size limits.
    pub fn within_limits(&self, grid: &Grid) -> bool {
        let population = grid.population();
        if population < self.min_population || population > self.max_population {
            return false;
        }
        match grid.bounds() {
            Some((min, max)) => {
                max.x - min.x < self.max_width && max.y - min.y < self.max_height
            }
            None => true,
        }
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.max_period == 0 || self.max_width <= 0 || self.max_height <= 0 {
            return Err(Error::NonPositiveError);
        }
        if !self.min_rule.supports_range() {
            return Err(Error::RuleRangeUnsupported);
        }
        if !self.min_rule.valid_min_max(&self.min_rule, &self.max_rule) {
            return Err(Error::InvalidRuleRange);
        }
        Ok(())
    }
}

/// Symmetry of a spaceship across its direction of travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShipSymmetry {
    /// No symmetry.
    Asymmetric,
    /// Mirror symmetric with an even total width.
    Even,
    /// Mirror symmetric with an odd total width.
    Odd,
    /// After half of the period, the ship is its own mirror image.
    Glide,
}

impl Default for ShipSymmetry {
    fn default() -> Self {
        ShipSymmetry::Asymmetric
    }
}

/// Parameters of a [`ShipSearch`](crate::ShipSearch).
///
/// The ship moves `dy` cells upwards every `period` generations.
/// For [`ShipSymmetry::Glide`], `period` is half of the full period,
/// after which the ship is mirrored and has moved `dy` cells.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShipSearchParams<R: Rule> {
    /// The rule.
    pub rule: R,

    /// Width of the searched rows.
    ///
    /// For symmetric ships, the width of one half, including the middle
    /// column for [`ShipSymmetry::Odd`].
    pub width: i32,

    /// The period.
    pub period: i32,

    /// The displacement per period.
    pub dy: i32,

    /// Symmetry of the ship.
    pub symmetry: ShipSymmetry,

    /// The breadth-first queue never grows beyond this size.
    pub max_queue_size: usize,

    /// How deep each frontier state must be extendable to survive a
    /// deepening pass.
    ///
    /// `None` means the period.
    pub min_deepening_increment: Option<usize>,

    /// Capacity of the transposition cache.
    pub cache_size: usize,

    /// Stops after this many ships are found.
    pub num_ships: usize,
}

impl<R: Rule> ShipSearchParams<R> {
    /// Searches ships of the given width and speed.
    pub fn new(rule: R, width: i32, dy: i32, period: i32) -> Self {
        ShipSearchParams {
            rule,
            width,
            period,
            dy,
            symmetry: ShipSymmetry::Asymmetric,
            max_queue_size: 1 << 20,
            min_deepening_increment: None,
            cache_size: 1 << 16,
            num_ships: 1,
        }
    }

    /// Sets the symmetry.
    pub fn set_symmetry(mut self, symmetry: ShipSymmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Sets the maximal queue size.
    pub fn set_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Sets the minimal deepening increment.
    pub fn set_min_deepening_increment<T: Into<Option<usize>>>(mut self, increment: T) -> Self {
        self.min_deepening_increment = increment.into();
        self
    }

    /// Sets the capacity of the transposition cache.
    pub fn set_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Sets how many ships to find.
    pub fn set_num_ships(mut self, num_ships: usize) -> Self {
        self.num_ships = num_ships;
        self
    }

    /// The full period of the ship, counting the mirrored half for
    /// [`ShipSymmetry::Glide`].
    pub fn full_period(&self) -> i32 {
        match self.symmetry {
            ShipSymmetry::Glide => 2 * self.period,
            _ => self.period,
        }
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.width <= 0 || self.period <= 0 || self.max_queue_size == 0 || self.num_ships == 0 {
            return Err(Error::NonPositiveError);
        }
        if self.dy <= 0 || self.dy >= self.period || gcd(self.dy, self.period) != 1 {
            return Err(Error::InvalidSpeed(self.dy, self.period));
        }
        let alternating_period = self.rule.alternating_period();
        if self.period as usize % alternating_period != 0 {
            return Err(Error::AlternatingPeriodError(alternating_period, self.period));
        }
        Ok(())
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::rules::{Hrot, HrotGenerations};
    use serde::de::DeserializeOwned;

    fn serializable<T: Serialize + DeserializeOwned>() {}

    #[test]
    fn params_are_serializable() {
        serializable::<BruteForceParams<Hrot>>();
        serializable::<RuleSearchParams<Hrot>>();
        serializable::<ShipSearchParams<Hrot>>();
        serializable::<ShipSearchParams<HrotGenerations>>();
    }
}
