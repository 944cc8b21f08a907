//! Brute force soup search.

use super::{guarded, shards, Progress, ResultSet, SearchProgram, Status};
use crate::{
    cells::{Coord, State},
    config::{BruteForceParams, Transform},
    error::Error,
    grid::Grid,
    identify::{PatternKind, PatternResult},
    rules::Rule,
    simulator::Simulator,
};
use auto_enums::auto_enum;
use log::{debug, error, info};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    collections::{hash_map::DefaultHasher, HashSet},
    hash::{Hash, Hasher},
    io::{self, Write},
    ops::Range,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
    thread,
};

/// Runs every soup in a box, or random soups, and collects everything
/// that is not a still life.
///
/// In exhaustive mode, soup number `n` has the base `num_states` digits
/// of `n` as its cells, least significant digit first, row by row.
/// Before a soup is run, its four rotations within its bounding box are
/// marked as tried, so later soups that are rotations of it are skipped.
/// Reflections are not skipped.
#[derive(Debug)]
pub struct BruteForceSearch<R: Rule> {
    params: BruteForceParams<R>,
    progress: Progress,
    enumerated: AtomicU64,
    results: Mutex<ResultSet<R>>,
}

impl<R: Rule> BruteForceSearch<R> {
    /// Creates a new search. Fails if the parameters are invalid.
    pub fn new(params: BruteForceParams<R>) -> Result<Self, Error> {
        params.check()?;
        Ok(BruteForceSearch {
            params,
            progress: Progress::new("soup search"),
            enumerated: AtomicU64::new(0),
            results: Mutex::new(ResultSet::default()),
        })
    }

    /// The parameters.
    pub fn params(&self) -> &BruteForceParams<R> {
        &self.params
    }

    /// The number of soups enumerated, including skipped ones.
    pub fn num_enumerated(&self) -> u64 {
        self.enumerated.load(Ordering::Relaxed)
    }

    /// Soup number `n` in exhaustive mode.
    pub fn soup(&self, mut n: u64) -> Grid {
        let base = self.params.rule.num_states() as u64;
        let mut soup = Grid::new();
        let mut i = 0;
        while n > 0 {
            let coord = Coord::new(i % self.params.width, i / self.params.width);
            soup.set(coord, State((n % base) as usize));
            n /= base;
            i += 1;
        }
        soup
    }

    #[auto_enum(Iterator)]
    fn soups<'a>(
        &'a self,
        shard: Range<u64>,
        rng: &'a mut StdRng,
    ) -> impl Iterator<Item = (u64, Grid)> + 'a {
        let params = &self.params;
        if params.random {
            shard.map(move |n| {
                let soup = Grid::random_soup(
                    params.width,
                    params.height,
                    params.symmetry,
                    params.density,
                    &params.states,
                    &mut *rng,
                );
                (n, soup.unwrap_or_default())
            })
        } else {
            shard.map(move |n| (n, self.soup(n)))
        }
    }

    fn run_shard(&self, shard: Range<u64>, seed: Option<u64>) -> Vec<PatternResult<R>> {
        let rule = &self.params.rule;
        let options = self.params.identify_options();
        let exhaustive = !self.params.random;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut known = HashSet::new();
        let mut tried = HashSet::new();
        let mut found = Vec::new();

        for (n, soup) in self.soups(shard, &mut rng) {
            if self.progress.is_stopped() {
                break;
            }
            self.enumerated.fetch_add(1, Ordering::Relaxed);

            if exhaustive {
                if tried.contains(&position_hash(&soup)) {
                    continue;
                }
                tried.extend(rotations_in_place(&soup).iter().map(position_hash));
            }

            self.progress.record();
            let result = guarded(format_args!("soup {}", n), || {
                Simulator::new(rule, soup).identify(&options)
            });
            if let Some(result) = result {
                if result.is_identified()
                    && result.kind != PatternKind::StillLife
                    && known.insert(result.hash)
                {
                    debug!("soup {}: {}", n, result);
                    found.push(result);
                }
            }
        }
        found
    }
}

/// Hash of a grid at its exact position.
fn position_hash(grid: &Grid) -> u64 {
    let mut hasher = DefaultHasher::new();
    grid.hash(&mut hasher);
    hasher.finish()
}

/// The four rotations of a grid, each placed with the same top-left
/// corner as the grid itself.
fn rotations_in_place(grid: &Grid) -> Vec<Grid> {
    let corner = grid.bounds().map_or(Coord::ORIGIN, |(min, _)| min);
    Transform::ROTATIONS
        .iter()
        .map(|&t| grid.transformed(t).normalized().shifted(corner))
        .collect()
}

impl<R: Rule> SearchProgram<R> for BruteForceSearch<R> {
    /// Runs `num` soups.
    ///
    /// In exhaustive mode, soups `0..num` are run, but never more than
    /// the whole search space.
    fn search_threaded(&self, num: u64, threads: usize) -> Status {
        let total = if self.params.random {
            num
        } else {
            self.params
                .search_space()
                .map_or(num, |space| num.min(space))
        };
        let seed = self.params.seed;
        let shards = shards(total, threads);

        let per_worker: Vec<Vec<PatternResult<R>>> = if shards.len() == 1 {
            shards
                .into_iter()
                .map(|shard| self.run_shard(shard, seed))
                .collect()
        } else {
            thread::scope(|s| {
                let handles: Vec<_> = shards
                    .into_iter()
                    .enumerate()
                    .map(|(i, shard)| {
                        let seed = seed.map(|seed| seed.wrapping_add(i as u64));
                        s.spawn(move || {
                            let found = self.run_shard(shard, seed);
                            info!("Completed shard {} of the search space", i);
                            found
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            error!("a soup search worker panicked");
                            Vec::new()
                        })
                    })
                    .collect()
            })
        };

        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        for found in per_worker {
            let new = results.merge(found);
            self.progress.record_found(new);
        }
        info!("{} soups searched, {} objects found", self.num_searched(), results.len());

        if self.progress.is_stopped() {
            Status::Stopped
        } else {
            Status::Completed
        }
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn results(&self) -> Vec<PatternResult<R>> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    fn write_header(&self, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "# Rule: {}", self.params.rule)?;
        writeln!(writer, "# Max Period: {}", self.params.max_period)?;
        writeln!(
            writer,
            "# Soup: {}x{}, {}",
            self.params.width,
            self.params.height,
            if self.params.random {
                format!("random {} at {}%", self.params.symmetry, self.params.density)
            } else {
                String::from("exhaustive")
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Hrot;

    #[test]
    fn numerals_fill_rows() -> Result<(), Error> {
        let search = BruteForceSearch::new(BruteForceParams::new(Hrot::life(), 3, 2))?;
        let soup = search.soup(0b100_011);
        assert_eq!(soup, "oo./..o".parse::<Grid>()?);
        Ok(())
    }

    #[test]
    fn rotations_share_a_corner() -> Result<(), Error> {
        let grid: Grid = "oo/o.".parse::<Grid>()?.shifted(Coord::new(2, 3));
        let rotations = rotations_in_place(&grid);
        assert_eq!(rotations[0], grid);
        assert!(rotations
            .iter()
            .all(|r| r.bounds().map(|(min, _)| min) == Some(Coord::new(2, 3))));
        Ok(())
    }
}
