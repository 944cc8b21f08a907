//! Sparse finite patterns.

use crate::{
    cells::{Coord, State, DEAD},
    config::{Symmetry, Transform},
    error::Error,
};
use rand::Rng;
use std::{
    collections::{hash_map::DefaultHasher, HashMap, HashSet},
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    iter::FromIterator,
    str::FromStr,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A finite pattern on the plane.
///
/// Only cells that are not in the background state are stored.
/// States are relative to the background: `State(0)` is the background,
/// whatever it is in absolute terms.
///
/// Two grids are equal when they have exactly the same cells at the same
/// positions. Use [`canonical`](Grid::canonical) to compare patterns up
/// to translation, rotation and reflection.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grid {
    cells: HashMap<Coord, State>,

    /// Cached bounding box, valid unless [`stale`](#structfield.stale).
    #[cfg_attr(feature = "serde", serde(skip))]
    bounds: Option<(Coord, Coord)>,

    /// Whether a cell on the bounding box has been removed since the box
    /// was last computed.
    #[cfg_attr(feature = "serde", serde(skip, default = "stale"))]
    stale: bool,
}

#[cfg(feature = "serde")]
fn stale() -> bool {
    true
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new()
    }
}

impl Grid {
    /// An empty grid.
    pub fn new() -> Self {
        Grid {
            cells: HashMap::new(),
            bounds: None,
            stale: false,
        }
    }

    /// The state of a cell.
    #[inline]
    pub fn get(&self, coord: Coord) -> State {
        self.cells.get(&coord).copied().unwrap_or(DEAD)
    }

    /// Sets the state of a cell.
    pub fn set(&mut self, coord: Coord, state: State) {
        if state == DEAD {
            if self.cells.remove(&coord).is_some() {
                if let Some((min, max)) = self.bounds {
                    if coord.x == min.x || coord.y == min.y || coord.x == max.x || coord.y == max.y
                    {
                        self.stale = true;
                    }
                }
            }
        } else {
            self.cells.insert(coord, state);
            if !self.stale {
                self.bounds = Some(match self.bounds {
                    Some((min, max)) => (min.min(coord), max.max(coord)),
                    None => (coord, coord),
                });
            }
        }
    }

    /// Removes every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.bounds = None;
        self.stale = false;
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The number of cells not in the background state.
    pub fn population(&self) -> usize {
        self.cells.len()
    }

    /// Iterates over the cells not in the background state, in no
    /// particular order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, State)> + '_ {
        self.cells.iter().map(|(&c, &s)| (c, s))
    }

    /// The cells sorted by row, then by column.
    pub fn sorted_cells(&self) -> Vec<(Coord, State)> {
        let mut cells: Vec<_> = self.cells().collect();
        cells.sort_unstable_by_key(|&(c, s)| (c.y, c.x, s));
        cells
    }

    /// The bounding box, as the top-left and bottom-right corners.
    ///
    /// Returns `None` for an empty grid.
    pub fn bounds(&self) -> Option<(Coord, Coord)> {
        if self.stale {
            self.compute_bounds()
        } else {
            self.bounds
        }
    }

    /// Recomputes the cached bounding box.
    pub fn update_bounds(&mut self) {
        if self.stale {
            self.bounds = self.compute_bounds();
            self.stale = false;
        }
    }

    fn compute_bounds(&self) -> Option<(Coord, Coord)> {
        let mut iter = self.cells.keys();
        let &first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), &c| (min.min(c), max.max(c))))
    }

    /// Copies all cells of `other` into this grid, shifted by `offset`.
    pub fn insert_cells(&mut self, other: &Grid, offset: Coord) {
        for (coord, state) in other.cells() {
            self.set(coord + offset, state);
        }
    }

    /// The grid shifted by `offset`.
    pub fn shifted(&self, offset: Coord) -> Grid {
        self.cells().map(|(c, s)| (c + offset, s)).collect()
    }

    /// The grid under a rotation or reflection about the origin.
    pub fn transformed(&self, transform: Transform) -> Grid {
        self.cells().map(|(c, s)| (transform.apply(c), s)).collect()
    }

    /// The grid rotated 90° clockwise about the origin.
    pub fn rotate_cw(&self) -> Grid {
        self.transformed(Transform::Rotate90)
    }

    /// The grid rotated 90° anticlockwise about the origin.
    pub fn rotate_ccw(&self) -> Grid {
        self.transformed(Transform::Rotate270)
    }

    /// The grid translated so that its bounding box starts at the origin.
    pub fn normalized(&self) -> Grid {
        match self.bounds() {
            Some((min, _)) => self.shifted(-min),
            None => Grid::new(),
        }
    }

    /// The canonical form of the grid.
    ///
    /// The grid is translated so that its bounding box starts at the origin.
    /// If `orientation_invariant`, the smallest of the 8 rotations and
    /// reflections is chosen, comparing the sorted cell lists.
    pub fn canonical(&self, orientation_invariant: bool) -> Grid {
        if !orientation_invariant {
            return self.normalized();
        }
        Transform::ALL
            .iter()
            .map(|&t| self.transformed(t).normalized())
            .min_by_key(Grid::sorted_cells)
            .unwrap_or_default()
    }

    /// A hash of the canonical form.
    pub fn canonical_hash(&self, orientation_invariant: bool) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.canonical(orientation_invariant).hash(&mut hasher);
        hasher.finish()
    }

    /// Whether `other` equals this grid shifted by `offset`.
    pub fn equals_shifted(&self, other: &Grid, offset: Coord) -> bool {
        self.population() == other.population()
            && self.cells().all(|(c, s)| other.get(c + offset) == s)
    }

    /// Generates a random soup in the box `[0, width) × [0, height)`.
    ///
    /// Each orbit of cells under the symmetry is filled with probability
    /// `density` percent, with a state chosen uniformly from `states`.
    pub fn random_soup<G: Rng + ?Sized>(
        width: i32,
        height: i32,
        symmetry: Symmetry,
        density: u32,
        states: &[State],
        rng: &mut G,
    ) -> Result<Grid, Error> {
        if width <= 0 || height <= 0 || states.is_empty() {
            return Err(Error::NonPositiveError);
        }
        if symmetry.square_world() && width != height {
            return Err(Error::SquareWorldError);
        }
        let members = symmetry.members();
        let mut soup = Grid::new();
        let mut visited = HashSet::new();
        for y in 0..height {
            for x in 0..width {
                let coord = Coord::new(x, y);
                if visited.contains(&coord) {
                    continue;
                }
                let state = if rng.gen_range(0..100) < density {
                    states[rng.gen_range(0..states.len())]
                } else {
                    DEAD
                };
                for &t in &members {
                    let image = t.apply_in_box(coord, width, height);
                    visited.insert(image);
                    soup.set(image, state);
                }
            }
        }
        Ok(soup)
    }
}

impl FromIterator<(Coord, State)> for Grid {
    fn from_iter<I: IntoIterator<Item = (Coord, State)>>(iter: I) -> Self {
        let mut grid = Grid::new();
        for (coord, state) in iter {
            grid.set(coord, state);
        }
        grid
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Grid {}

impl Hash for Grid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_cells().hash(state);
    }
}

fn state_char(state: State) -> char {
    match state.0 {
        0 => '.',
        1 => 'o',
        n => (b'A' + ((n - 2) % 26) as u8) as char,
    }
}

/// Draws the bounding box row by row, `.` for the background,
/// `o` for state 1 and letters from `A` for higher states.
impl Display for Grid {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some((min, max)) = self.bounds() {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    write!(f, "{}", state_char(self.get(Coord::new(x, y))))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Reads the picture written by [`Display`], with rows separated by
/// newlines or `/`. The top-left character is placed at the origin.
impl FromStr for Grid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut grid = Grid::new();
        for (y, row) in s.trim().split(|c| c == '\n' || c == '/').enumerate() {
            for (x, c) in row.trim().chars().enumerate() {
                let coord = Coord::new(x as i32, y as i32);
                let state = match c {
                    '.' | 'b' => DEAD,
                    'o' => State(1),
                    'A'..='Z' => State(c as usize - 'A' as usize + 2),
                    _ => return Err(Error::InvalidState(coord, DEAD)),
                };
                grid.set(coord, state);
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_after_removal() -> Result<(), Error> {
        let mut grid: Grid = "oo./..o".parse()?;
        assert_eq!(grid.bounds(), Some((Coord::new(0, 0), Coord::new(2, 1))));
        grid.set(Coord::new(2, 1), DEAD);
        assert_eq!(grid.bounds(), Some((Coord::new(0, 0), Coord::new(1, 0))));
        grid.update_bounds();
        grid.set(Coord::new(-3, 4), State(1));
        assert_eq!(grid.bounds(), Some((Coord::new(-3, 0), Coord::new(1, 4))));
        assert_eq!(grid.population(), 3);
        Ok(())
    }

    #[test]
    fn display_round_trip() -> Result<(), Error> {
        let grid: Grid = ".o./..o/ooo".parse()?;
        assert_eq!(grid.to_string(), ".o.\n..o\nooo\n");
        Ok(())
    }
}
