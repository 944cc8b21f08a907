//! Spaceship search.
//!
//! The ship is built row by row, breadth first. Each partial ship is a
//! node of a tree; its children are the rows that may follow it. When the
//! queue of unexpanded nodes is full, every queued node is extended depth
//! first by a few rows and replaced by the rows it reached. Nodes that
//! cannot be extended are dropped.

mod rows;
mod tree;

use self::{
    rows::{Row, RowBuilder},
    tree::{is_empty, Branch, Node, Nodes, Tree},
};
use super::{guarded, Progress, ResultSet, SearchProgram, Status};
use crate::{
    cache::LruCache,
    cells::{Coord, State, DEAD},
    config::ShipSearchParams,
    error::Error,
    grid::Grid,
    identify::{IdentifyOptions, PatternKind, PatternResult},
    rules::Rule,
    simulator::Simulator,
};
use log::{debug, error, info, warn};
use std::{
    collections::VecDeque,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
    thread,
};

/// The key of a transposition: the last rows, and the phase of the
/// next row.
type WindowKey = (Vec<State>, usize);

fn window_key(window: &[&[State]], period: usize, next: usize) -> WindowKey {
    (window.concat(), next % period)
}

/// The part of the search that changes while it runs.
#[derive(Debug)]
struct ShipState {
    tree: Tree,
    queue: VecDeque<usize>,
    /// The shallowest depth at which each window has been expanded.
    transpositions: LruCache<WindowKey, usize>,
    /// How many rows a deepening pass extends each queued node by.
    increment: usize,
    status: Status,
}

/// Searches spaceships of a given speed, width and symmetry.
///
/// Calling [`search`](SearchProgram::search) again continues where the
/// last call stopped. Here a unit of work is the expansion of one node,
/// breadth first or depth first.
#[derive(Debug)]
pub struct ShipSearch<R: Rule> {
    params: ShipSearchParams<R>,
    progress: Progress,
    state: Mutex<ShipState>,
    results: Mutex<ResultSet<R>>,
}

/// What a deepening worker reports.
#[derive(Debug, Default)]
struct Deepened {
    /// New nodes, numbered after the tree's nodes.
    nodes: Vec<Node>,
    /// The nodes that replace the deepened ones in the queue.
    queue: Vec<usize>,
    ships: Vec<Vec<Row>>,
    pruned: usize,
    expanded: u64,
}

/// Sorts the successors of a node into rows that extend it, and
/// complete ships.
fn sort_successors<N: Nodes>(
    nodes: &N,
    id: usize,
    window: &[&[State]],
    successors: impl IntoIterator<Item = Row>,
    ships: &mut Vec<Vec<Row>>,
) -> Vec<Row> {
    let live = nodes.node(id).live;
    let tail_empty = window[1..].iter().all(|row| is_empty(row));
    let mut rows = Vec::new();
    for row in successors {
        let empty = is_empty(&row);
        if !live && empty {
            continue;
        }
        if live && empty && tail_empty {
            let mut ship: Vec<Row> = nodes.path(id).into_iter().map(Row::from).collect();
            ship.push(row);
            ships.push(ship);
        } else {
            rows.push(row);
        }
    }
    rows
}

impl<R: Rule> ShipSearch<R> {
    /// Creates a new search.
    ///
    /// Fails if the speed is not valid, or the rule's alternating period
    /// does not divide the period.
    pub fn new(params: ShipSearchParams<R>) -> Result<Self, Error> {
        params.check()?;
        let (tree, root, increment) = {
            let builder = RowBuilder::new(&params);
            let (tree, root) = Tree::with_prefix(&builder.empty_row(), builder.window_len());
            let increment = params
                .min_deepening_increment
                .unwrap_or_else(|| builder.period())
                .max(1);
            (tree, root, increment)
        };
        let state = ShipState {
            tree,
            queue: vec![root].into(),
            transpositions: LruCache::new(params.cache_size),
            increment,
            status: Status::Initial,
        };
        Ok(ShipSearch {
            params,
            progress: Progress::new("ship search"),
            state: Mutex::new(state),
            results: Mutex::new(ResultSet::default()),
        })
    }

    /// The parameters.
    pub fn params(&self) -> &ShipSearchParams<R> {
        &self.params
    }

    /// The current number of queued nodes.
    pub fn queue_len(&self) -> usize {
        self.lock_state().queue.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ShipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn num_found(&self) -> usize {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Expands the oldest queued node.
    fn expand(&self, builder: &RowBuilder<R>, state: &mut ShipState) {
        let ShipState {
            tree,
            queue,
            transpositions,
            ..
        } = state;
        let id = match queue.pop_front() {
            Some(id) => id,
            None => return,
        };
        self.progress.record();

        let depth = tree.node(id).depth;
        let window = tree.window(id, builder.window_len());
        let key = window_key(&window, builder.period(), depth + 1);
        if matches!(transpositions.get(&key), Some(&known) if known <= depth) {
            return;
        }
        transpositions.put(key, depth);

        let successors = builder.successors(&window, depth + 1);
        let mut ships = Vec::new();
        let rows = sort_successors(&*tree, id, &window, successors, &mut ships);
        for ship in &ships {
            self.report_ship(builder, ship);
        }
        for row in rows {
            let child = tree.push(id, row);
            queue.push_back(child);
        }
    }

    /// Extends every queued node depth first by the increment.
    ///
    /// A node is replaced by the rows the extension left on its stack,
    /// the deepest one included, or dropped if every branch dies out.
    /// Returns the number of expanded nodes.
    fn deepen(&self, builder: &RowBuilder<R>, state: &mut ShipState, threads: usize) -> u64 {
        let ShipState {
            tree,
            queue,
            increment,
            ..
        } = state;
        let frontier: Vec<usize> = queue.drain(..).collect();
        let base = tree.len();
        let outcomes = self.deepen_frontier(builder, tree, &frontier, *increment, threads);

        let (mut pruned, mut expanded) = (0, 0);
        for outcome in outcomes {
            for rows in &outcome.ships {
                self.report_ship(builder, rows);
            }
            pruned += outcome.pruned;
            expanded += outcome.expanded;
            let renumber = tree.merge(base, outcome.nodes);
            queue.extend(outcome.queue.into_iter().map(renumber));
        }
        info!(
            "deepened {} nodes by {} rows, {} pruned, queue size {}",
            frontier.len(),
            increment,
            pruned,
            queue.len()
        );

        let before = tree.len();
        tree.compact(queue);
        debug!("compacted the tree from {} to {} nodes", before, tree.len());
        expanded
    }

    fn deepen_frontier(
        &self,
        builder: &RowBuilder<R>,
        tree: &Tree,
        frontier: &[usize],
        increment: usize,
        threads: usize,
    ) -> Vec<Deepened> {
        let threads = threads.max(1);
        let cache_size = self.params.cache_size / threads;
        let chunk = ((frontier.len() + threads - 1) / threads).max(1);

        if threads == 1 || frontier.len() <= 1 {
            return vec![self.deepen_chunk(builder, tree, frontier, increment, cache_size)];
        }
        thread::scope(|s| {
            let handles: Vec<_> = frontier
                .chunks(chunk)
                .map(|ids| {
                    s.spawn(move || self.deepen_chunk(builder, tree, ids, increment, cache_size))
                })
                .collect();
            handles
                .into_iter()
                .zip(frontier.chunks(chunk))
                .map(|(handle, ids)| {
                    handle.join().unwrap_or_else(|_| {
                        error!("a deepening worker panicked");
                        Deepened {
                            queue: ids.to_vec(),
                            ..Deepened::default()
                        }
                    })
                })
                .collect()
        })
    }

    fn deepen_chunk(
        &self,
        builder: &RowBuilder<R>,
        tree: &Tree,
        ids: &[usize],
        increment: usize,
        cache_size: usize,
    ) -> Deepened {
        let mut dfs = Dfs {
            builder,
            progress: &self.progress,
            cache: LruCache::new(cache_size),
            branch: Branch::new(tree),
            ships: Vec::new(),
            expanded: 0,
        };
        let mut queue = Vec::new();
        let mut pruned = 0;
        for &id in ids {
            match guarded(format_args!("deepening node {}", id), || {
                dfs.extend(id, increment)
            }) {
                Some(Some(reached)) => queue.extend(reached),
                Some(None) => pruned += 1,
                None => queue.push(id),
            }
        }
        Deepened {
            nodes: dfs.branch.into_nodes(),
            queue,
            ships: dfs.ships,
            pruned,
            expanded: dfs.expanded,
        }
    }

    /// Builds the first phase of a ship from its rows, and identifies it.
    fn report_ship(&self, builder: &RowBuilder<R>, rows: &[Row]) {
        let mut grid = Grid::new();
        for (index, row) in rows.iter().enumerate() {
            if !builder.is_first_phase(index) {
                continue;
            }
            let y = (index / builder.period()) as i32;
            for x in 0..builder.full_width() {
                let state = builder.cell(row, x);
                if state != DEAD {
                    grid.set(Coord::new(x, y), state);
                }
            }
        }

        let options = IdentifyOptions::new(2 * self.params.full_period() as u64)
            .set_orientation_invariant(true);
        let result = Simulator::new(&self.params.rule, grid).identify(&options);
        if result.kind != PatternKind::Spaceship {
            warn!("a ship found at depth {} is a {}", rows.len(), result);
            return;
        }
        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        if results.insert(result.clone()) {
            self.progress.record_found(1);
            info!("Found {}, population {}", result, result.population());
        }
    }
}

/// Successors of a window, remembered across the nodes of one worker.
fn cached_successors<R: Rule>(
    builder: &RowBuilder<R>,
    cache: &mut LruCache<WindowKey, Arc<[Row]>>,
    window: &[&[State]],
    next: usize,
) -> Arc<[Row]> {
    let key = window_key(window, builder.period(), next);
    if let Some(rows) = cache.get(&key) {
        return rows.clone();
    }
    let rows: Arc<[Row]> = builder.successors(window, next).into();
    cache.put(key, rows.clone());
    rows
}

/// The depth-first extension of queued nodes on one worker.
struct Dfs<'a, 'r, R: Rule> {
    builder: &'a RowBuilder<'r, R>,
    progress: &'a Progress,
    cache: LruCache<WindowKey, Arc<[Row]>>,
    branch: Branch<'a>,
    /// Ships completed on the way.
    ships: Vec<Vec<Row>>,
    expanded: u64,
}

impl<'a, 'r, R: Rule> Dfs<'a, 'r, R> {
    /// Extends a node until some row reaches `increment` rows past the
    /// depth the node was last deepened to.
    ///
    /// Returns what is left on the stack, the reached row last, or `None`
    /// if the node is a dead end. A stopped search keeps the node as is.
    fn extend(&mut self, id: usize, increment: usize) -> Option<Vec<usize>> {
        let target = self.branch.node(id).pruned + increment;
        let len = self.builder.window_len();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.progress.is_stopped() {
                return Some(vec![id]);
            }
            let depth = self.branch.node(current).depth;
            if depth >= target {
                stack.push(current);
                return Some(stack);
            }
            self.progress.record();
            self.expanded += 1;

            let window = self.branch.window(current, len);
            let successors = cached_successors(self.builder, &mut self.cache, &window, depth + 1);
            let rows = sort_successors(
                &self.branch,
                current,
                &window,
                successors.iter().cloned(),
                &mut self.ships,
            );
            for row in rows {
                stack.push(self.branch.push(current, row, target));
            }
        }
        None
    }
}

impl<R: Rule> SearchProgram<R> for ShipSearch<R> {
    /// Expands about `num` nodes. A deepening pass is never cut short,
    /// so the last one may go over. Deepening passes are split among
    /// `threads` worker threads.
    ///
    /// Returns [`Status::Searching`] if the nodes are used up before a
    /// ship is found or the queue runs empty.
    fn search_threaded(&self, num: u64, threads: usize) -> Status {
        let builder = RowBuilder::new(&self.params);
        let mut state = self.lock_state();
        let mut budget = num;

        let status = loop {
            if state.status == Status::Completed {
                break Status::Completed;
            }
            if self.progress.is_stopped() {
                break Status::Stopped;
            }
            if self.num_found() >= self.params.num_ships {
                info!("{} ships found", self.num_found());
                break Status::Completed;
            }
            if state.queue.is_empty() {
                info!("search space exhausted after {} nodes", self.num_searched());
                break Status::Completed;
            }
            if budget == 0 {
                break Status::Searching;
            }
            if state.queue.len() >= self.params.max_queue_size {
                let expanded = self.deepen(&builder, &mut state, threads);
                budget = budget.saturating_sub(expanded.max(1));
                continue;
            }
            budget -= 1;
            self.expand(&builder, &mut state);
        };
        state.status = status;
        status
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
        let params = &self.params;
        writeln!(writer, "# Rule: {}", params.rule)?;
        writeln!(
            writer,
            "# Speed: {}c/{}, width {}, {:?}",
            params.dy,
            params.period,
            params.width,
            params.symmetry
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ShipSymmetry, rules::Hrot};

    #[test]
    fn invalid_speeds_are_rejected() {
        let search = ShipSearch::new(ShipSearchParams::new(Hrot::life(), 5, 2, 4));
        assert_eq!(search.err(), Some(Error::InvalidSpeed(2, 4)));
        let search = ShipSearch::new(ShipSearchParams::new(Hrot::life(), 5, 3, 3));
        assert_eq!(search.err(), Some(Error::InvalidSpeed(3, 3)));
        let search = ShipSearch::new(ShipSearchParams::new(Hrot::life(), 0, 1, 2));
        assert_eq!(search.err(), Some(Error::NonPositiveError));
    }

    #[test]
    fn narrow_search_runs_out() {
        let search = ShipSearch::new(ShipSearchParams::new(Hrot::life(), 1, 1, 2)).unwrap();
        assert_eq!(search.search(u64::MAX), Status::Completed);
        assert!(search.results().is_empty());
        assert_eq!(search.queue_len(), 0);
    }

    #[test]
    fn budget_is_respected() {
        let params = ShipSearchParams::new(Hrot::life(), 5, 1, 2).set_symmetry(ShipSymmetry::Glide);
        let search = ShipSearch::new(params).unwrap();
        assert_eq!(search.search(1), Status::Searching);
        assert_eq!(search.num_searched(), 1);
    }

    #[test]
    fn known_windows_are_not_expanded_again() {
        let search = ShipSearch::new(ShipSearchParams::new(Hrot::life(), 3, 1, 2)).unwrap();
        let builder = RowBuilder::new(&search.params);
        let mut state = search.lock_state();
        let root = state.queue[0];
        search.expand(&builder, &mut state);
        assert!(!state.queue.is_empty());

        // The same empty window, one period deeper.
        let mut deeper = root;
        for _ in 0..builder.period() {
            deeper = state.tree.push(deeper, builder.empty_row());
        }
        state.queue.clear();
        state.queue.push_back(deeper);
        let nodes = state.tree.len();
        search.expand(&builder, &mut state);
        assert!(state.queue.is_empty());
        assert_eq!(state.tree.len(), nodes);
    }

    #[test]
    fn deepening_moves_the_frontier_forward() {
        let params = ShipSearchParams::new(Hrot::life(), 10, 1, 3).set_max_queue_size(64);
        let search = ShipSearch::new(params).unwrap();
        let builder = RowBuilder::new(&search.params);
        let mut state = search.lock_state();
        while state.queue.len() < 64 {
            search.expand(&builder, &mut state);
        }

        let increment = state.increment;
        assert_eq!(increment, 3);
        let deepest = state
            .queue
            .iter()
            .map(|&id| state.tree.node(id).depth)
            .max()
            .unwrap();
        let target = state
            .queue
            .iter()
            .map(|&id| state.tree.node(id).pruned)
            .min()
            .unwrap()
            + increment;

        let expanded = search.deepen(&builder, &mut state, 2);
        assert!(expanded > 0);
        assert!(!state.queue.is_empty());
        assert!(state
            .queue
            .iter()
            .all(|&id| state.tree.node(id).pruned >= target));
        assert!(state
            .queue
            .iter()
            .any(|&id| state.tree.node(id).depth > deepest));
    }

    #[test]
    fn stopped_deepening_keeps_the_queue() {
        let params = ShipSearchParams::new(Hrot::life(), 10, 1, 3).set_max_queue_size(64);
        let search = ShipSearch::new(params).unwrap();
        let builder = RowBuilder::new(&search.params);
        let mut state = search.lock_state();
        while state.queue.len() < 64 {
            search.expand(&builder, &mut state);
        }
        let depths: Vec<usize> = state
            .queue
            .iter()
            .map(|&id| state.tree.node(id).depth)
            .collect();

        search.stop();
        assert_eq!(search.deepen(&builder, &mut state, 1), 0);
        let after: Vec<usize> = state
            .queue
            .iter()
            .map(|&id| state.tree.node(id).depth)
            .collect();
        assert_eq!(after, depths);
    }
}
