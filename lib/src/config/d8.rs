//! Rotations and reflections of the plane.

use crate::cells::Coord;
use educe::Educe;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The 8 elements of the dihedral group _D_<sub>8</sub>.
///
/// The notations are stolen from Oscar Cunningham's
/// [Logic Life Search](https://github.com/OscarCunningham/logic-life-search).
#[derive(Clone, Copy, Debug, Educe, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[educe(Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Transform {
    /// `Id`.
    #[educe(Default)]
    #[cfg_attr(feature = "serde", serde(rename = "Id"))]
    Id,
    /// `R90`, 90° clockwise rotation.
    #[cfg_attr(feature = "serde", serde(rename = "R90"))]
    Rotate90,
    /// `R180`, 180° rotation.
    #[cfg_attr(feature = "serde", serde(rename = "R180"))]
    Rotate180,
    /// `R270`, 270° clockwise rotation.
    #[cfg_attr(feature = "serde", serde(rename = "R270"))]
    Rotate270,
    /// `F-`, reflection across the x axis.
    #[cfg_attr(feature = "serde", serde(rename = "F-"))]
    FlipRow,
    /// `F|`, reflection across the y axis.
    #[cfg_attr(feature = "serde", serde(rename = "F|"))]
    FlipCol,
    /// `F\`, reflection across the diagonal.
    #[cfg_attr(feature = "serde", serde(rename = "F\\"))]
    FlipDiag,
    /// `F/`, reflection across the antidiagonal.
    #[cfg_attr(feature = "serde", serde(rename = "F/"))]
    FlipAntidiag,
}

impl FromStr for Transform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Id" => Ok(Transform::Id),
            "R90" => Ok(Transform::Rotate90),
            "R180" => Ok(Transform::Rotate180),
            "R270" => Ok(Transform::Rotate270),
            "F-" => Ok(Transform::FlipRow),
            "F|" => Ok(Transform::FlipCol),
            "F\\" => Ok(Transform::FlipDiag),
            "F/" => Ok(Transform::FlipAntidiag),
            _ => Err(String::from("invalid transformation")),
        }
    }
}

impl Display for Transform {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            Transform::Id => "Id",
            Transform::Rotate90 => "R90",
            Transform::Rotate180 => "R180",
            Transform::Rotate270 => "R270",
            Transform::FlipRow => "F-",
            Transform::FlipCol => "F|",
            Transform::FlipDiag => "F\\",
            Transform::FlipAntidiag => "F/",
        };
        write!(f, "{}", s)
    }
}

impl Transform {
    /// All 8 transformations.
    pub const ALL: [Transform; 8] = [
        Transform::Id,
        Transform::Rotate90,
        Transform::Rotate180,
        Transform::Rotate270,
        Transform::FlipRow,
        Transform::FlipCol,
        Transform::FlipDiag,
        Transform::FlipAntidiag,
    ];

    /// The 4 rotations.
    pub const ROTATIONS: [Transform; 4] = [
        Transform::Id,
        Transform::Rotate90,
        Transform::Rotate180,
        Transform::Rotate270,
    ];

    /// Whether this transformation requires the box to be square.
    pub fn square_world(self) -> bool {
        matches!(
            self,
            Transform::Rotate90
                | Transform::Rotate270
                | Transform::FlipDiag
                | Transform::FlipAntidiag
        )
    }

    /// The inverse of this transformation.
    pub fn inverse(self) -> Self {
        match self {
            Transform::Rotate90 => Transform::Rotate270,
            Transform::Rotate270 => Transform::Rotate90,
            x => x,
        }
    }

    /// Applies the transformation as a linear map fixing the origin.
    ///
    /// With the y axis pointing downwards, `R90` sends `(1, 0)` to `(0, 1)`.
    #[inline]
    pub fn apply(self, coord: Coord) -> Coord {
        let Coord { x, y } = coord;
        match self {
            Transform::Id => Coord::new(x, y),
            Transform::Rotate90 => Coord::new(-y, x),
            Transform::Rotate180 => Coord::new(-x, -y),
            Transform::Rotate270 => Coord::new(y, -x),
            Transform::FlipRow => Coord::new(x, -y),
            Transform::FlipCol => Coord::new(-x, y),
            Transform::FlipDiag => Coord::new(y, x),
            Transform::FlipAntidiag => Coord::new(-y, -x),
        }
    }

    /// Applies the transformation to a cell in the box
    /// `[0, width) × [0, height)`, keeping the box in place.
    ///
    /// Transformations that swap the axes need a square box.
    pub fn apply_in_box(self, coord: Coord, width: i32, height: i32) -> Coord {
        let Coord { x, y } = coord;
        match self {
            Transform::Id => Coord::new(x, y),
            Transform::Rotate90 => Coord::new(height - 1 - y, x),
            Transform::Rotate180 => Coord::new(width - 1 - x, height - 1 - y),
            Transform::Rotate270 => Coord::new(y, width - 1 - x),
            Transform::FlipRow => Coord::new(x, height - 1 - y),
            Transform::FlipCol => Coord::new(width - 1 - x, y),
            Transform::FlipDiag => Coord::new(y, x),
            Transform::FlipAntidiag => Coord::new(height - 1 - y, width - 1 - x),
        }
    }
}

/// Symmetries of a soup.
///
/// For each symmetry, its [symmetry group](https://en.wikipedia.org/wiki/Symmetry_group)
/// is a subgroup of the dihedral group _D_<sub>8</sub>.
/// Please see the [Life Wiki](https://conwaylife.com/wiki/Symmetry) for details.
///
/// Some of the symmetries are only valid when the box is square.
#[derive(Clone, Copy, Debug, Educe, PartialEq, Eq, Hash)]
#[educe(Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symmetry {
    /// `C1`.
    ///
    /// No symmetry at all.
    #[educe(Default)]
    C1,
    /// `C2`.
    ///
    /// Symmetry under 180° rotation.
    C2,
    /// `C4`.
    ///
    /// Symmetry under 90° rotation.
    C4,
    /// `D2-`.
    ///
    /// Symmetry under reflection across the middle row.
    #[cfg_attr(feature = "serde", serde(rename = "D2-"))]
    D2Row,
    /// `D2|`.
    ///
    /// Symmetry under reflection across the middle column.
    #[cfg_attr(feature = "serde", serde(rename = "D2|"))]
    D2Col,
    /// `D2\`.
    #[cfg_attr(feature = "serde", serde(rename = "D2\\"))]
    D2Diag,
    /// `D2/`.
    #[cfg_attr(feature = "serde", serde(rename = "D2/"))]
    D2Antidiag,
    /// `D4+`.
    ///
    /// Symmetry under reflections across the middle row
    /// and the middle column.
    #[cfg_attr(feature = "serde", serde(rename = "D4+"))]
    D4Ortho,
    /// `D4X`.
    ///
    /// Symmetry under reflections across both diagonals.
    #[cfg_attr(feature = "serde", serde(rename = "D4X"))]
    D4Diag,
    /// `D8`.
    ///
    /// Symmetry under all 8 transformations.
    D8,
}

impl FromStr for Symmetry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C1" => Ok(Symmetry::C1),
            "C2" => Ok(Symmetry::C2),
            "C4" => Ok(Symmetry::C4),
            "D2-" => Ok(Symmetry::D2Row),
            "D2|" => Ok(Symmetry::D2Col),
            "D2\\" => Ok(Symmetry::D2Diag),
            "D2/" => Ok(Symmetry::D2Antidiag),
            "D4+" => Ok(Symmetry::D4Ortho),
            "D4X" => Ok(Symmetry::D4Diag),
            "D8" => Ok(Symmetry::D8),
            _ => Err(String::from("invalid symmetry")),
        }
    }
}

impl Display for Symmetry {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            Symmetry::C1 => "C1",
            Symmetry::C2 => "C2",
            Symmetry::C4 => "C4",
            Symmetry::D2Row => "D2-",
            Symmetry::D2Col => "D2|",
            Symmetry::D2Diag => "D2\\",
            Symmetry::D2Antidiag => "D2/",
            Symmetry::D4Ortho => "D4+",
            Symmetry::D4Diag => "D4X",
            Symmetry::D8 => "D8",
        };
        write!(f, "{}", s)
    }
}

impl Symmetry {
    /// Whether this symmetry requires the box to be square.
    pub fn square_world(self) -> bool {
        self.members().into_iter().any(Transform::square_world)
    }

    /// Transformations contained in the symmetry group.
    pub fn members(self) -> Vec<Transform> {
        use Transform::*;
        match self {
            Symmetry::C1 => vec![Id],
            Symmetry::C2 => vec![Id, Rotate180],
            Symmetry::C4 => vec![Id, Rotate90, Rotate180, Rotate270],
            Symmetry::D2Row => vec![Id, FlipRow],
            Symmetry::D2Col => vec![Id, FlipCol],
            Symmetry::D2Diag => vec![Id, FlipDiag],
            Symmetry::D2Antidiag => vec![Id, FlipAntidiag],
            Symmetry::D4Ortho => vec![Id, FlipRow, FlipCol, Rotate180],
            Symmetry::D4Diag => vec![Id, FlipDiag, FlipAntidiag, Rotate180],
            Symmetry::D8 => Transform::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_undoes_transform() {
        let coord = Coord::new(3, -7);
        for &t in Transform::ALL.iter() {
            assert_eq!(t.inverse().apply(t.apply(coord)), coord);
            assert_eq!(t.to_string().parse::<Transform>(), Ok(t));
        }
    }

    #[test]
    fn box_transform_stays_in_box() {
        for &t in Transform::ALL.iter() {
            for x in 0..4 {
                for y in 0..4 {
                    let c = t.apply_in_box(Coord::new(x, y), 4, 4);
                    assert!((0..4).contains(&c.x) && (0..4).contains(&c.y));
                }
            }
        }
    }
}
