//! Which rows may follow a window of rows.
//!
//! Rows of all phases are interleaved into one sequence: the row at
//! height `y` of phase `t` gets index `period * y + dy * t`. Since `dy` and
//! the period are coprime, every index belongs to exactly one phase, and
//! the same index describes the same row whichever way it is reached.
//!
//! For a rule of range `r`, the row of index `m` in the next generation is
//! the row of index `m + dy`, and it depends on the rows `m + i * period`
//! for `-r <= i <= r`. So when row `n` is appended, the evolution of row
//! `n - r * period` can be checked against row `n - r * period + dy`.
//! All of these lie in the last `2 * r * period` rows before `n`.

use crate::{
    cells::{Coord, State, DEAD},
    config::{ShipSearchParams, ShipSymmetry},
    rules::Rule,
};

/// A row of the search, with states relative to the background.
pub(crate) type Row = Box<[State]>;

/// Where a neighbour is read from when checking a cell.
#[derive(Clone, Copy, Debug)]
enum Source {
    /// A row of the window.
    Window(usize),
    /// The row being built.
    New,
}

/// The neighbourhood and the checks of one phase.
#[derive(Clone, Debug)]
struct Phase {
    generation: u64,
    neighbours: Vec<(i32, Source)>,
    /// `checks[j]` lists the columns that can be checked once the first
    /// `j` cells of the new row are known.
    checks: Vec<Vec<i32>>,
    /// Whether the successor row is mirrored.
    mirrored: bool,
}

/// Builds the rows that may follow a window.
#[derive(Clone, Debug)]
pub(crate) struct RowBuilder<'r, R: Rule> {
    rule: &'r R,
    width: i32,
    period: usize,
    dy: usize,
    symmetry: ShipSymmetry,
    num_states: usize,
    /// `2 * range * period`.
    window: usize,
    middle: usize,
    phases: Vec<Phase>,
    /// Phase of each index modulo the period.
    phase_of: Vec<usize>,
}

impl<'r, R: Rule> RowBuilder<'r, R> {
    pub(crate) fn new(params: &'r ShipSearchParams<R>) -> Self {
        let rule = &params.rule;
        let period = params.period as usize;
        let dy = params.dy as usize;
        let range = rule.range().max(1) as usize;
        let middle = range * period;

        let mut phase_of = vec![0; period];
        for t in 0..period {
            phase_of[(dy * t) % period] = t;
        }

        let mut builder = RowBuilder {
            rule,
            width: params.width,
            period,
            dy,
            symmetry: params.symmetry,
            num_states: rule.num_states(),
            window: 2 * middle,
            middle,
            phases: Vec::new(),
            phase_of,
        };
        builder.phases = (0..period)
            .map(|t| builder.build_phase(t, range as i32))
            .collect();
        builder
    }

    fn build_phase(&self, t: usize, range: i32) -> Phase {
        let generation = t as u64;
        let neighbours: Vec<(i32, Source)> = self
            .rule
            .neighbourhood(generation)
            .iter()
            .map(|&Coord { x, y }| {
                let source = if y == range {
                    Source::New
                } else {
                    Source::Window(((range + y) as usize) * self.period)
                };
                (x, source)
            })
            .collect();

        let mut checks = vec![Vec::new(); self.width as usize + 1];
        for c in self.check_columns(range) {
            let ready = neighbours
                .iter()
                .filter(|(_, source)| matches!(source, Source::New))
                .filter_map(|&(x, _)| self.column(c + x))
                .max()
                .map_or(0, |j| j + 1);
            checks[ready].push(c);
        }

        Phase {
            generation,
            neighbours,
            checks,
            mirrored: self.symmetry == ShipSymmetry::Glide && t + 1 == self.period,
        }
    }

    /// Columns whose evolution must be checked.
    ///
    /// For mirror symmetric ships the right half mirrors the left half.
    fn check_columns(&self, range: i32) -> std::ops::Range<i32> {
        match self.symmetry {
            ShipSymmetry::Asymmetric | ShipSymmetry::Glide => -range..self.width + range,
            ShipSymmetry::Even | ShipSymmetry::Odd => -range..self.width,
        }
    }

    /// The stored column that a column of the full ship reads from.
    #[inline]
    fn column(&self, c: i32) -> Option<usize> {
        let w = self.width;
        let c = match self.symmetry {
            ShipSymmetry::Asymmetric | ShipSymmetry::Glide => c,
            ShipSymmetry::Even if c >= w => 2 * w - 1 - c,
            ShipSymmetry::Odd if c >= w => 2 * w - 2 - c,
            _ => c,
        };
        if (0..w).contains(&c) {
            Some(c as usize)
        } else {
            None
        }
    }

    /// The state of a cell of the full ship, mirrored columns included.
    #[inline]
    pub(crate) fn cell(&self, row: &[State], c: i32) -> State {
        self.column(c).map_or(DEAD, |c| row[c])
    }

    /// Number of rows in a window.
    pub(crate) fn window_len(&self) -> usize {
        self.window
    }

    /// The period.
    pub(crate) fn period(&self) -> usize {
        self.period
    }

    /// The phase of the row with this index.
    pub(crate) fn phase(&self, index: usize) -> usize {
        self.phase_of[index % self.period]
    }

    /// Whether the row at this index belongs to phase 0.
    pub(crate) fn is_first_phase(&self, index: usize) -> bool {
        index % self.period == 0
    }

    /// The total width of the ship, including the mirrored half.
    pub(crate) fn full_width(&self) -> i32 {
        match self.symmetry {
            ShipSymmetry::Asymmetric | ShipSymmetry::Glide => self.width,
            ShipSymmetry::Even => 2 * self.width,
            ShipSymmetry::Odd => 2 * self.width - 1,
        }
    }

    /// An empty row.
    pub(crate) fn empty_row(&self) -> Row {
        vec![DEAD; self.width as usize].into_boxed_slice()
    }

    /// All rows that may follow `window`, when appended at `index`.
    ///
    /// `window` holds the last [`window_len`](RowBuilder::window_len) rows
    /// before `index`, oldest first.
    pub(crate) fn successors(&self, window: &[&[State]], index: usize) -> Vec<Row> {
        debug_assert_eq!(window.len(), self.window);
        let phase = &self.phases[self.phase(index)];
        let mut new = vec![DEAD; self.width as usize];
        let mut buf = Vec::with_capacity(phase.neighbours.len());
        let mut rows = Vec::new();
        if self.check_all(window, phase, &new, 0, &mut buf) {
            self.assign(window, phase, &mut new, 0, &mut buf, &mut rows);
        }
        rows
    }

    fn assign(
        &self,
        window: &[&[State]],
        phase: &Phase,
        new: &mut Vec<State>,
        j: usize,
        buf: &mut Vec<State>,
        rows: &mut Vec<Row>,
    ) {
        if j == new.len() {
            rows.push(new.clone().into_boxed_slice());
            return;
        }
        for s in 0..self.num_states {
            new[j] = State(s);
            if self.check_all(window, phase, new, j + 1, buf) {
                self.assign(window, phase, new, j + 1, buf, rows);
            }
        }
        new[j] = DEAD;
    }

    fn check_all(
        &self,
        window: &[&[State]],
        phase: &Phase,
        new: &[State],
        known: usize,
        buf: &mut Vec<State>,
    ) -> bool {
        phase.checks[known]
            .iter()
            .all(|&c| self.check(window, phase, new, c, buf))
    }

    /// Whether the cell in column `c` of the middle row evolves into the
    /// same cell of its successor.
    fn check(
        &self,
        window: &[&[State]],
        phase: &Phase,
        new: &[State],
        c: i32,
        buf: &mut Vec<State>,
    ) -> bool {
        let rule = self.rule;
        let generation = phase.generation;
        buf.clear();
        buf.extend(phase.neighbours.iter().map(|&(x, source)| {
            let row = match source {
                Source::Window(i) => window[i],
                Source::New => new,
            };
            rule.convert_state(self.cell(row, c + x), generation)
        }));
        let state = rule.convert_state(self.cell(window[self.middle], c), generation);
        let next = rule.transition(buf, state, generation, Coord::new(c, 0));
        let next = rule.convert_state(next, generation + 1);

        let successor = window[self.middle + self.dy];
        let expected = if phase.mirrored {
            self.cell(successor, self.width - 1 - c)
        } else {
            self.cell(successor, c)
        };
        next == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cells::ALIVE, rules::Hrot};

    #[test]
    fn phases_of_interleaved_rows() {
        let params = ShipSearchParams::new(Hrot::life(), 3, 2, 5);
        let builder = RowBuilder::new(&params);
        // index = 5 * y + 2 * t
        assert_eq!(builder.phase(0), 0);
        assert_eq!(builder.phase(2), 1);
        assert_eq!(builder.phase(4), 2);
        assert_eq!(builder.phase(1), 3);
        assert_eq!(builder.phase(3), 4);
        assert_eq!(builder.window_len(), 10);
    }

    #[test]
    fn empty_window_allows_empty_row() {
        let params = ShipSearchParams::new(Hrot::life(), 3, 1, 2);
        let builder = RowBuilder::new(&params);
        let empty = builder.empty_row();
        let window: Vec<&[State]> = vec![&empty[..]; builder.window_len()];
        let rows = builder.successors(&window, 4);
        assert!(rows.contains(&empty));
        // A lone row of three would give births in front of it.
        assert!(!rows.contains(&vec![ALIVE; 3].into_boxed_slice()));
    }

    #[test]
    fn even_symmetry_mirrors_columns() {
        let params = ShipSearchParams::new(Hrot::life(), 3, 1, 2).set_symmetry(ShipSymmetry::Even);
        let builder = RowBuilder::new(&params);
        let row = vec![State(0), State(1), State(0)];
        assert_eq!(builder.full_width(), 6);
        assert_eq!(builder.cell(&row, 4), ALIVE);
        assert_eq!(builder.cell(&row, 6), DEAD);
    }
}
