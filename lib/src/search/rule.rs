//! Random search through a range of rules.

use super::{guarded, shards, Progress, ResultSet, SearchProgram, Status};
use crate::{
    config::RuleSearchParams,
    error::Error,
    identify::{PatternKind, PatternResult},
    rules::Rule,
    simulator::Simulator,
};
use log::{debug, error, info};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    collections::HashSet,
    io::{self, Write},
    sync::{Mutex, PoisonError},
    thread,
};

/// Runs a fixed pattern under random rules between a minimal and a
/// maximal rule, and collects everything that is not a still life.
///
/// Spaceships that move obliquely, or whose period exceeds
/// [`high_period`](RuleSearchParams::high_period), are logged and added to
/// [`interesting`](RuleSearch::interesting) as soon as they are found.
#[derive(Debug)]
pub struct RuleSearch<R: Rule> {
    params: RuleSearchParams<R>,
    progress: Progress,
    results: Mutex<ResultSet<R>>,
    interesting: Mutex<ResultSet<R>>,
}

impl<R: Rule> RuleSearch<R> {
    /// Creates a new search.
    ///
    /// Fails if the rule does not support minimum and maximum rules,
    /// or if the two rules are not a valid range.
    pub fn new(params: RuleSearchParams<R>) -> Result<Self, Error> {
        params.check()?;
        Ok(RuleSearch {
            params,
            progress: Progress::new("rule search"),
            results: Mutex::new(ResultSet::default()),
            interesting: Mutex::new(ResultSet::default()),
        })
    }

    /// The parameters.
    pub fn params(&self) -> &RuleSearchParams<R> {
        &self.params
    }

    /// Interesting spaceships found so far, including those of searches
    /// that are still running.
    pub fn interesting(&self) -> Vec<PatternResult<R>> {
        self.interesting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    fn is_interesting(&self, result: &PatternResult<R>) -> bool {
        result.kind == PatternKind::Spaceship
            && (result.is_oblique() || result.period > self.params.high_period)
    }

    /// Runs the target under one random rule.
    fn trial(&self, rng: &mut StdRng) -> Result<PatternResult<R>, Error> {
        let params = &self.params;
        let rule = params
            .min_rule
            .randomise(&params.min_rule, &params.max_rule, rng)?;
        let mut sim = Simulator::new(&rule, params.target.clone());
        Ok(sim.identify_with(&params.identify_options(), |grid| {
            params.within_limits(grid)
        }))
    }

    fn run_shard(&self, count: u64, seed: Option<u64>) -> Vec<PatternResult<R>> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut known = HashSet::new();
        let mut found = Vec::new();

        for i in 0..count {
            if self.progress.is_stopped() {
                break;
            }
            self.progress.record();

            let result = match guarded(format_args!("rule trial {}", i), || self.trial(&mut rng)) {
                Some(Ok(result)) => result,
                Some(Err(e)) => {
                    error!("rule trial {} failed: {}", i, e);
                    continue;
                }
                None => continue,
            };
            if !result.is_identified()
                || result.kind == PatternKind::StillLife
                || !known.insert(result.hash)
            {
                continue;
            }

            if self.is_interesting(&result) {
                let mut interesting = self
                    .interesting
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if interesting.insert(result.clone()) {
                    info!("Found {} in {}", result, result.rule);
                }
            } else {
                debug!("found {} in {}", result, result.rule);
            }
            found.push(result);
        }
        found
    }
}

impl<R: Rule> SearchProgram<R> for RuleSearch<R> {
    /// Tries `num` random rules.
    fn search_threaded(&self, num: u64, threads: usize) -> Status {
        let seed = self.params.seed;
        let counts: Vec<u64> = shards(num, threads)
            .into_iter()
            .map(|shard| shard.end - shard.start)
            .collect();

        let per_worker: Vec<Vec<PatternResult<R>>> = if counts.len() == 1 {
            counts
                .into_iter()
                .map(|count| self.run_shard(count, seed))
                .collect()
        } else {
            thread::scope(|s| {
                let handles: Vec<_> = counts
                    .into_iter()
                    .enumerate()
                    .map(|(i, count)| {
                        let seed = seed.map(|seed| seed.wrapping_add(i as u64));
                        s.spawn(move || self.run_shard(count, seed))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            error!("a rule search worker panicked");
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
        info!("{} rules searched, {} objects found", self.num_searched(), results.len());

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
        writeln!(writer, "# Min Rule: {}", self.params.min_rule)?;
        writeln!(writer, "# Max Rule: {}", self.params.max_rule)?;
        writeln!(writer, "# Max Period: {}", self.params.max_period)?;
        write!(writer, "# Target:\n{}", self.params.target)
    }
}
