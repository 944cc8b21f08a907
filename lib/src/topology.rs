//! Boundary conditions of the plane.

use crate::cells::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How coordinates are resolved at each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Topology {
    /// The infinite plane.
    Unbounded,

    /// A finite rectangle without wrapping.
    ///
    /// Cells outside the rectangle are permanently in the background state.
    Bounded {
        /// The top-left corner.
        origin: Coord,
        /// Width of the rectangle.
        width: i32,
        /// Height of the rectangle.
        height: i32,
    },

    /// A rectangle whose opposite edges are glued together.
    ///
    /// A width or height of `0` leaves that axis unbounded,
    /// which gives a cylinder.
    Torus {
        /// The top-left corner.
        origin: Coord,
        /// Width of the fundamental domain.
        width: i32,
        /// Height of the fundamental domain.
        height: i32,
    },
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Unbounded
    }
}

impl Topology {
    /// A bounded rectangle with its top-left corner at the origin.
    pub fn bounded(width: i32, height: i32) -> Self {
        Topology::Bounded {
            origin: Coord::ORIGIN,
            width,
            height,
        }
    }

    /// A torus with its top-left corner at the origin.
    pub fn torus(width: i32, height: i32) -> Self {
        Topology::Torus {
            origin: Coord::ORIGIN,
            width,
            height,
        }
    }

    /// Maps a coordinate to its canonical position.
    ///
    /// Returns `None` if the cell lies outside a bounded rectangle;
    /// such a cell is always in the background state.
    #[inline]
    pub fn map(&self, coord: Coord) -> Option<Coord> {
        match *self {
            Topology::Unbounded => Some(coord),
            Topology::Bounded {
                origin,
                width,
                height,
            } => {
                let rel = coord - origin;
                if (0..width).contains(&rel.x) && (0..height).contains(&rel.y) {
                    Some(coord)
                } else {
                    None
                }
            }
            Topology::Torus {
                origin,
                width,
                height,
            } => {
                let rel = coord - origin;
                let x = if width > 0 {
                    rel.x.rem_euclid(width)
                } else {
                    rel.x
                };
                let y = if height > 0 {
                    rel.y.rem_euclid(height)
                } else {
                    rel.y
                };
                Some(origin + Coord::new(x, y))
            }
        }
    }

    /// Whether the coordinate lies inside the topology.
    ///
    /// For a torus, only the fundamental domain counts as inside.
    pub fn contains(&self, coord: Coord) -> bool {
        match *self {
            Topology::Unbounded => true,
            Topology::Bounded { .. } => self.map(coord).is_some(),
            Topology::Torus { .. } => self.map(coord) == Some(coord),
        }
    }

    /// Whether the coordinate lies on the edge of the topology.
    ///
    /// The infinite plane has no edge. A coordinate outside a bounded
    /// rectangle is not at its edge.
    pub fn at_edge(&self, coord: Coord) -> bool {
        match *self {
            Topology::Unbounded => false,
            Topology::Bounded {
                origin,
                width,
                height,
            }
            | Topology::Torus {
                origin,
                width,
                height,
            } => {
                if !self.contains(coord) {
                    return false;
                }
                let rel = coord - origin;
                (width > 0 && (rel.x == 0 || rel.x == width - 1))
                    || (height > 0 && (rel.y == 0 || rel.y == height - 1))
            }
        }
    }

    /// Whether the topology wraps around.
    pub fn is_periodic(&self) -> bool {
        matches!(self, Topology::Torus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torus_wraps_by_multiples() {
        let torus = Topology::torus(7, 5);
        for k in -3..=3 {
            for x in -10..10 {
                for y in -6..6 {
                    assert_eq!(
                        torus.map(Coord::new(x + k * 7, y)),
                        torus.map(Coord::new(x, y))
                    );
                }
            }
        }
    }

    #[test]
    fn cylinder_keeps_open_axis() {
        let cylinder = Topology::torus(4, 0);
        assert_eq!(cylinder.map(Coord::new(5, -9)), Some(Coord::new(1, -9)));
    }

    #[test]
    fn bounded_edges() {
        let bounded = Topology::bounded(3, 3);
        assert_eq!(bounded.map(Coord::new(3, 0)), None);
        assert!(bounded.at_edge(Coord::new(0, 1)));
        assert!(!bounded.at_edge(Coord::new(1, 1)));
        assert!(!bounded.at_edge(Coord::new(-1, 1)));
        assert!(!Topology::Unbounded.at_edge(Coord::new(0, 0)));
    }
}
