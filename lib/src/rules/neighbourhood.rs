//! Common neighbourhoods.
//!
//! Neighbourhoods of small ranges are built once per process and shared;
//! larger ones are built on demand.

use crate::cells::Coord;
use once_cell::sync::Lazy;
use std::borrow::Cow;

/// Neighbourhoods up to this range are cached.
const CACHED_RANGE: i32 = 5;

/// The shape of a neighbourhood.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Every cell in the surrounding square.
    Moore,
    /// Cells within the given taxicab distance.
    VonNeumann,
    /// Cells on the same row or column.
    Cross,
    /// Cells within the given distance on a hexagonal lattice,
    /// represented on the square lattice by skewing.
    Hexagonal,
}

impl Shape {
    fn contains(self, range: i32, c: Coord) -> bool {
        match self {
            Shape::Moore => true,
            Shape::VonNeumann => c.x.abs() + c.y.abs() <= range,
            Shape::Cross => c.x == 0 || c.y == 0,
            Shape::Hexagonal => (c.x - c.y).abs() <= range,
        }
    }

    fn build(self, range: i32) -> Vec<Coord> {
        let mut nbhd = Vec::new();
        for y in -range..=range {
            for x in -range..=range {
                let c = Coord::new(x, y);
                if c != Coord::ORIGIN && self.contains(range, c) {
                    nbhd.push(c);
                }
            }
        }
        nbhd
    }
}

type Table = Vec<Vec<Coord>>;

fn table(shape: Shape) -> Table {
    (0..=CACHED_RANGE).map(|range| shape.build(range)).collect()
}

static MOORE: Lazy<Table> = Lazy::new(|| table(Shape::Moore));
static VON_NEUMANN: Lazy<Table> = Lazy::new(|| table(Shape::VonNeumann));
static CROSS: Lazy<Table> = Lazy::new(|| table(Shape::Cross));
static HEXAGONAL: Lazy<Table> = Lazy::new(|| table(Shape::Hexagonal));

/// The neighbourhood of the given shape and range, ordered row by row
/// from the top-left corner. The cell itself is not included.
pub fn neighbourhood(shape: Shape, range: i32) -> Cow<'static, [Coord]> {
    if (0..=CACHED_RANGE).contains(&range) {
        let table: &'static Table = match shape {
            Shape::Moore => &*MOORE,
            Shape::VonNeumann => &*VON_NEUMANN,
            Shape::Cross => &*CROSS,
            Shape::Hexagonal => &*HEXAGONAL,
        };
        Cow::Borrowed(&table[range as usize])
    } else {
        Cow::Owned(shape.build(range.max(0)))
    }
}

/// The Moore neighbourhood of the given range.
pub fn moore(range: i32) -> Cow<'static, [Coord]> {
    neighbourhood(Shape::Moore, range)
}

/// The von Neumann neighbourhood of the given range.
pub fn von_neumann(range: i32) -> Cow<'static, [Coord]> {
    neighbourhood(Shape::VonNeumann, range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(moore(1).len(), 8);
        assert_eq!(moore(2).len(), 24);
        assert_eq!(von_neumann(1).len(), 4);
        assert_eq!(von_neumann(2).len(), 12);
        assert_eq!(neighbourhood(Shape::Cross, 2).len(), 8);
        assert_eq!(neighbourhood(Shape::Hexagonal, 1).len(), 6);
        assert_eq!(moore(7).len(), 15 * 15 - 1);
    }

    #[test]
    fn cached_tables_are_shared() {
        assert!(matches!(moore(1), Cow::Borrowed(_)));
        assert!(matches!(moore(6), Cow::Owned(_)));
    }
}
