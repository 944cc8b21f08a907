//! Stepping a grid through generations.

use crate::{
    cells::{Coord, State, DEAD},
    error::Error,
    grid::Grid,
    identify::{identify, IdentifyOptions, PatternResult},
    rules::Rule,
    topology::Topology,
};
use std::{collections::HashSet, mem};

/// Drives a [`Grid`] through generations under a [`Rule`] and a [`Topology`].
///
/// The rule is borrowed, so that many simulators, possibly on different
/// threads, can share one rule.
///
/// Cloning a simulator gives a deep copy of its grid.
#[derive(Clone, Debug)]
pub struct Simulator<'r, R: Rule> {
    rule: &'r R,
    topology: Topology,
    /// Cells of the current generation, relative to the background.
    grid: Grid,
    /// Buffer for the next generation.
    next: Grid,
    generation: u64,
}

impl<'r, R: Rule> Simulator<'r, R> {
    /// Creates a simulator on the infinite plane, starting at generation 0.
    ///
    /// The states in `grid` are taken relative to the background of
    /// generation 0.
    pub fn new(rule: &'r R, grid: Grid) -> Self {
        Simulator {
            rule,
            topology: Topology::Unbounded,
            grid,
            next: Grid::new(),
            generation: 0,
        }
    }

    /// Changes the topology.
    ///
    /// Cells are moved to their canonical positions;
    /// cells outside a bounded rectangle are dropped.
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        let grid = mem::take(&mut self.grid);
        self.insert_cells(&grid, Coord::ORIGIN);
        self
    }

    /// The rule.
    pub fn rule(&self) -> &'r R {
        self.rule
    }

    /// The topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The current grid, with states relative to the background.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Consumes the simulator and returns its grid.
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The absolute state of a cell.
    pub fn get_cell(&self, coord: Coord) -> State {
        let state = match self.topology.map(coord) {
            Some(coord) => self.grid.get(coord),
            None => DEAD,
        };
        self.rule.convert_state(state, self.generation)
    }

    /// Sets the absolute state of a cell.
    pub fn set_cell(&mut self, coord: Coord, state: State) -> Result<(), Error> {
        if state.0 >= self.rule.num_states() {
            return Err(Error::InvalidState(coord, state));
        }
        let mapped = self
            .topology
            .map(coord)
            .ok_or(Error::SetCellError(coord))?;
        let state = self.rule.convert_state(state, self.generation);
        self.grid.set(mapped, state);
        Ok(())
    }

    /// Copies the cells of `grid` into the current grid, shifted by `offset`.
    ///
    /// States are taken relative to the current background;
    /// cells that fall outside the topology are dropped.
    pub fn insert_cells(&mut self, grid: &Grid, offset: Coord) {
        for (coord, state) in grid.cells() {
            if let Some(coord) = self.topology.map(coord + offset) {
                self.grid.set(coord, state);
            }
        }
    }

    /// Advances one generation.
    pub fn step(&mut self) {
        let rule = self.rule;
        let generation = self.generation;
        let neighbourhood = rule.neighbourhood(generation);
        let mut neighbours = Vec::with_capacity(neighbourhood.len());

        self.next.clear();
        for coord in active_cells(&self.grid, neighbourhood, &self.topology) {
            neighbour_states(
                rule,
                &self.grid,
                &self.topology,
                neighbourhood,
                coord,
                generation,
                &mut neighbours,
            );
            let state = rule.convert_state(self.grid.get(coord), generation);
            let new_state = rule.transition(&neighbours, state, generation, coord);
            let new_state = rule.convert_state(new_state, generation + 1);
            if new_state != DEAD {
                self.next.set(coord, new_state);
            }
        }

        mem::swap(&mut self.grid, &mut self.next);
        self.generation += 1;
    }

    /// Advances `n` generations.
    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Runs the pattern until it repeats, and classifies it.
    ///
    /// See [`identify_with`](Simulator::identify_with).
    pub fn identify(&mut self, options: &IdentifyOptions) -> PatternResult<R> {
        identify(self, options, |_| true)
    }

    /// Runs the pattern until it repeats, and classifies it.
    ///
    /// `keep_going` is called on each new generation; returning `false`
    /// stops early with an [`Unidentified`](crate::PatternKind::Unidentified)
    /// result.
    pub fn identify_with<F>(&mut self, options: &IdentifyOptions, keep_going: F) -> PatternResult<R>
    where
        F: FnMut(&Grid) -> bool,
    {
        identify(self, options, keep_going)
    }
}

/// Every cell that may change in the next generation: the cells not in
/// the background state and every cell that has one of them as a neighbour.
pub(crate) fn active_cells(
    grid: &Grid,
    neighbourhood: &[Coord],
    topology: &Topology,
) -> HashSet<Coord> {
    let mut active = HashSet::with_capacity(grid.population() * (neighbourhood.len() + 1));
    for (coord, _) in grid.cells() {
        active.extend(topology.map(coord));
        for &offset in neighbourhood {
            active.extend(topology.map(coord - offset));
        }
    }
    active
}

/// Collects the absolute states of the neighbours of a cell into `buf`.
pub(crate) fn neighbour_states<R: Rule>(
    rule: &R,
    grid: &Grid,
    topology: &Topology,
    neighbourhood: &[Coord],
    coord: Coord,
    generation: u64,
    buf: &mut Vec<State>,
) {
    buf.clear();
    buf.extend(neighbourhood.iter().map(|&offset| {
        let state = topology
            .map(coord + offset)
            .map_or(DEAD, |coord| grid.get(coord));
        rule.convert_state(state, generation)
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cells::ALIVE, rules::Hrot};

    #[test]
    fn b0_background_round_trip() -> Result<(), Error> {
        let rule = Hrot::moore(&[0, 1, 2], &[1, 2, 3]);
        let mut sim = Simulator::new(&rule, Grid::new());
        sim.step();
        assert!(sim.grid().is_empty());
        assert_eq!(sim.get_cell(Coord::new(100, 100)), ALIVE);
        sim.set_cell(Coord::ORIGIN, DEAD)?;
        assert_eq!(sim.grid().population(), 1);
        assert_eq!(sim.get_cell(Coord::ORIGIN), DEAD);
        Ok(())
    }

    #[test]
    fn set_cell_errors() {
        let rule = Hrot::life();
        let mut sim = Simulator::new(&rule, Grid::new()).with_topology(Topology::bounded(4, 4));
        assert_eq!(
            sim.set_cell(Coord::new(4, 0), ALIVE),
            Err(Error::SetCellError(Coord::new(4, 0)))
        );
        assert_eq!(
            sim.set_cell(Coord::new(0, 0), State(2)),
            Err(Error::InvalidState(Coord::new(0, 0), State(2)))
        );
    }
}
