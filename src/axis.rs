//! Coordinate axes of a voxel stack.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// One of the three stack axes. `Z` indexes slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in sweep order (X first, Z last).
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Decode a numeric axis tag (0 = X, 1 = Y, 2 = Z).
    pub fn from_tag(tag: u8) -> Result<Self, FilterError> {
        match tag {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            2 => Ok(Axis::Z),
            _ => Err(FilterError::UnknownAxis { tag }),
        }
    }

    /// Split `extents` into (axis extent, perpendicular extents).
    ///
    /// The perpendicular pair sizes the one-slice scratch used by the
    /// separable sweeps.
    #[inline]
    pub(crate) fn split_extents(
        self,
        extents: (usize, usize, usize),
    ) -> (usize, (usize, usize)) {
        let (w, h, d) = extents;
        match self {
            Axis::X => (w, (h, d)),
            Axis::Y => (h, (w, d)),
            Axis::Z => (d, (w, h)),
        }
    }

    /// Rebuild `(x, y, z)` from an axis position `p` and perpendicular `(u, v)`.
    #[inline]
    pub(crate) fn assemble(self, p: usize, u: usize, v: usize) -> (usize, usize, usize) {
        match self {
            Axis::X => (p, u, v),
            Axis::Y => (u, p, v),
            Axis::Z => (u, v, p),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_decode_in_order() {
        assert_eq!(Axis::from_tag(0), Ok(Axis::X));
        assert_eq!(Axis::from_tag(1), Ok(Axis::Y));
        assert_eq!(Axis::from_tag(2), Ok(Axis::Z));
    }

    #[test]
    fn invalid_tag_is_rejected() {
        assert_eq!(Axis::from_tag(3), Err(FilterError::UnknownAxis { tag: 3 }));
    }
}
