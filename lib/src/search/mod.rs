//! Search engines.
//!
//! Every engine implements [`SearchProgram`]. A search runs on the
//! calling thread, or on a fixed number of worker threads, until its units
//! of work are used up or [`stop`](SearchProgram::stop) is called.
//! The stop flag is only checked between units, so a soup, rule or row
//! in progress is always finished.

mod brute;
mod rule;
mod ship;

pub use brute::BruteForceSearch;
pub use rule::RuleSearch;
pub use ship::ShipSearch;

use crate::{error::Error, identify::PatternResult, rules::Rule};
use log::{error, info};
use std::{
    any::Any,
    collections::HashSet,
    fmt::Display,
    io::Write,
    ops::Range,
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Instant,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Units of work between two progress reports.
pub const REPORT_INTERVAL: u64 = 5000;

/// Search status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    /// Not started yet.
    Initial,
    /// Still searching.
    Searching,
    /// Stopped by [`stop`](SearchProgram::stop) before all work was done.
    Stopped,
    /// All requested work is done.
    Completed,
}

/// A search engine.
///
/// All methods take `&self`, so a search can be stopped or inspected
/// from another thread while it runs.
pub trait SearchProgram<R: Rule>: Sync {
    /// Runs `num` units of work on the current thread.
    fn search(&self, num: u64) -> Status {
        self.search_threaded(num, 1)
    }

    /// Runs `num` units of work, split among `threads` worker threads.
    fn search_threaded(&self, num: u64, threads: usize) -> Status;

    /// Shared progress counters and the stop flag.
    fn progress(&self) -> &Progress;

    /// A copy of the results found so far.
    fn results(&self) -> Vec<PatternResult<R>>;

    /// Writes a header describing the search.
    fn write_header(&self, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Asks the search to stop after the current units of work.
    fn stop(&self) {
        self.progress().stop();
    }

    /// Clears the stop flag, so that the next search runs again.
    fn resume(&self) {
        self.progress().resume();
    }

    /// Whether the stop flag is set.
    fn is_stopped(&self) -> bool {
        self.progress().is_stopped()
    }

    /// The number of units of work done so far.
    fn num_searched(&self) -> u64 {
        self.progress().searched()
    }

    /// Writes the results, one per line, followed by the canonical pattern.
    ///
    /// The search state is not touched, so a failed write can be retried.
    fn write_results(&self, writer: &mut dyn Write) -> Result<(), Error> {
        let write = |writer: &mut dyn Write| -> std::io::Result<()> {
            self.write_header(writer)?;
            for result in self.results() {
                writeln!(
                    writer,
                    "{}, population {}, rule {}",
                    result,
                    result.population(),
                    result.rule
                )?;
                if let (Some(min), Some(max)) = (&result.min_rule, &result.max_rule) {
                    writeln!(writer, "# min rule {}, max rule {}", min, max)?;
                }
                write!(writer, "{}", result.canonical)?;
                writeln!(writer)?;
            }
            writer.flush()
        };
        write(writer).map_err(|e| Error::WriteError(e.to_string()))
    }
}

/// Progress counters and the stop flag shared by all workers of a search.
#[derive(Debug)]
pub struct Progress {
    name: &'static str,
    stop: AtomicBool,
    searched: AtomicU64,
    found: AtomicU64,
    started: Instant,
}

impl Progress {
    pub(crate) fn new(name: &'static str) -> Self {
        Progress {
            name,
            stop: AtomicBool::new(false),
            searched: AtomicU64::new(0),
            found: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Sets the stop flag.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Clears the stop flag.
    pub fn resume(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    /// Whether the stop flag is set.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// The number of units of work done.
    pub fn searched(&self) -> u64 {
        self.searched.load(Ordering::Relaxed)
    }

    /// The number of results found.
    pub fn found(&self) -> u64 {
        self.found.load(Ordering::Relaxed)
    }

    /// Counts one unit of work, and reports the throughput every
    /// [`REPORT_INTERVAL`] units.
    pub(crate) fn record(&self) {
        let searched = self.searched.fetch_add(1, Ordering::Relaxed) + 1;
        if searched % REPORT_INTERVAL == 0 {
            let secs = self.started.elapsed().as_secs_f64().max(1e-9);
            info!(
                "{}: {} searched ({:.0}/s), {} found",
                self.name,
                searched,
                searched as f64 / secs,
                self.found()
            );
        }
    }

    pub(crate) fn record_found(&self, count: u64) {
        self.found.fetch_add(count, Ordering::Relaxed);
    }
}

/// Results deduplicated by the hash of their canonical forms.
#[derive(Debug)]
pub(crate) struct ResultSet<R: Rule> {
    known: HashSet<u64>,
    list: Vec<PatternResult<R>>,
}

impl<R: Rule> Default for ResultSet<R> {
    fn default() -> Self {
        ResultSet {
            known: HashSet::new(),
            list: Vec::new(),
        }
    }
}

impl<R: Rule> ResultSet<R> {
    /// Adds a result unless an equivalent one is known.
    /// Returns whether it was added.
    pub(crate) fn insert(&mut self, result: PatternResult<R>) -> bool {
        if self.known.insert(result.hash) {
            self.list.push(result);
            true
        } else {
            false
        }
    }

    /// Merges results from a worker. Returns how many were new.
    pub(crate) fn merge(&mut self, results: Vec<PatternResult<R>>) -> u64 {
        results
            .into_iter()
            .map(|result| self.insert(result) as u64)
            .sum()
    }

    pub(crate) fn to_vec(&self) -> Vec<PatternResult<R>> {
        self.list.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }
}

/// Splits `0..total` into `shards` contiguous ranges covering all of it.
pub(crate) fn shards(total: u64, shards: usize) -> Vec<Range<u64>> {
    let shards = shards.max(1) as u64;
    let (size, rem) = (total / shards, total % shards);
    let mut start = 0;
    (0..shards)
        .map(|i| {
            let len = size + (i < rem) as u64;
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Runs one unit of work, logging and swallowing a panic instead of
/// letting it take down the whole shard.
pub(crate) fn guarded<T, F: FnOnce() -> T>(what: impl Display, f: F) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(t) => Some(t),
        Err(payload) => {
            error!("{} failed: {}", what, panic_message(&*payload));
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shards_cover_everything() {
        let ranges = shards(512, 3);
        assert_eq!(ranges, vec![0..171, 171..342, 342..512]);
        assert_eq!(shards(2, 4).iter().map(|r| r.end - r.start).sum::<u64>(), 2);
        assert_eq!(shards(10, 0), vec![0..10]);
    }

    #[test]
    fn panics_are_contained() {
        assert_eq!(guarded("ok", || 1), Some(1));
        assert_eq!(guarded("boom", || -> i32 { panic!("boom") }), None);
    }
}
