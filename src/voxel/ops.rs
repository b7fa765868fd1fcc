//! Domain operations on whole stacks: border-padded enlargement and cropping.

use nalgebra::Vector3;

use super::stack::VoxelStack;
use super::traits::VoxelAccess;
use crate::error::FilterError;

/// How the padding band of an enlarged stack is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderFill {
    /// Repeat the nearest edge voxel.
    Replicate,
    /// Fill with a fixed sample value (clamped to storage on write).
    Constant(i64),
}

/// Copy `src` into a stack grown by `margins` voxels on *each* side per axis,
/// filling the border band according to `fill`.
///
/// The returned stack has extents `(w + 2mx, h + 2my, d + 2mz)`; the original
/// data sits at offset `margins`. Margin bookkeeping for operators built on
/// the enlarged stack is the caller's job (see `OperatorFactory`).
pub fn enlarge(src: &VoxelStack, margins: Vector3<usize>, fill: BorderFill) -> VoxelStack {
    let (w, h, d) = src.extents();
    let (mx, my, mz) = (margins.x, margins.y, margins.z);
    let mut out = VoxelStack::empty(w + 2 * mx, h + 2 * my, d + 2 * mz, src.bit_depth());

    for z in 0..out.depth() {
        for y in 0..out.height() {
            for x in 0..out.width() {
                let v = match fill {
                    BorderFill::Replicate => {
                        let sx = clamp_to(x as i64 - mx as i64, w);
                        let sy = clamp_to(y as i64 - my as i64, h);
                        let sz = clamp_to(z as i64 - mz as i64, d);
                        src.get_voxel(sx, sy, sz)
                    }
                    BorderFill::Constant(c) => {
                        let inside = x >= mx
                            && x < mx + w
                            && y >= my
                            && y < my + h
                            && z >= mz
                            && z < mz + d;
                        if inside {
                            src.get_voxel(x - mx, y - my, z - mz)
                        } else {
                            c
                        }
                    }
                };
                out.set_voxel(x, y, z, v);
            }
        }
    }
    out
}

/// Extract the window starting at `origin` with the given `extents`.
///
/// Fails with `DimensionMismatch` when the window does not fit inside `src`.
pub fn crop(
    src: &VoxelStack,
    origin: Vector3<usize>,
    extents: Vector3<usize>,
) -> Result<VoxelStack, FilterError> {
    let (w, h, d) = src.extents();
    if origin.x + extents.x > w || origin.y + extents.y > h || origin.z + extents.z > d {
        return Err(FilterError::DimensionMismatch {
            expected: (w, h, d),
            found: (origin.x + extents.x, origin.y + extents.y, origin.z + extents.z),
        });
    }
    let mut out = VoxelStack::empty(extents.x, extents.y, extents.z, src.bit_depth());
    for z in 0..extents.z {
        for y in 0..extents.y {
            for x in 0..extents.x {
                out.set_voxel(x, y, z, src.get_voxel(origin.x + x, origin.y + y, origin.z + z));
            }
        }
    }
    Ok(out)
}

#[inline]
fn clamp_to(idx: i64, upper: usize) -> usize {
    if idx < 0 {
        0
    } else if idx as usize >= upper {
        upper - 1
    } else {
        idx as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::stack::BitDepth;

    fn ramp_stack() -> VoxelStack {
        let mut s = VoxelStack::empty(3, 3, 3, BitDepth::Eight);
        for z in 0..3 {
            for y in 0..3 {
                for x in 0..3 {
                    s.set_voxel(x, y, z, (x + 3 * y + 9 * z) as i64);
                }
            }
        }
        s
    }

    #[test]
    fn replicate_border_repeats_edge_voxels() {
        let src = ramp_stack();
        let big = enlarge(&src, Vector3::new(1, 1, 1), BorderFill::Replicate);
        assert_eq!(big.extents(), (5, 5, 5));
        assert_eq!(big.get_voxel(0, 0, 0), src.get_voxel(0, 0, 0));
        assert_eq!(big.get_voxel(4, 4, 4), src.get_voxel(2, 2, 2));
        assert_eq!(big.get_voxel(2, 2, 2), src.get_voxel(1, 1, 1));
    }

    #[test]
    fn constant_border_keeps_interior() {
        let src = ramp_stack();
        let big = enlarge(&src, Vector3::new(2, 0, 0), BorderFill::Constant(9));
        assert_eq!(big.extents(), (7, 3, 3));
        assert_eq!(big.get_voxel(0, 1, 1), 9);
        assert_eq!(big.get_voxel(3, 1, 1), src.get_voxel(1, 1, 1));
    }

    #[test]
    fn crop_inverts_enlarge() {
        let src = ramp_stack();
        let big = enlarge(&src, Vector3::new(1, 2, 1), BorderFill::Replicate);
        let back = crop(&big, Vector3::new(1, 2, 1), Vector3::new(3, 3, 3)).unwrap();
        for z in 0..3 {
            for y in 0..3 {
                for x in 0..3 {
                    assert_eq!(back.get_voxel(x, y, z), src.get_voxel(x, y, z));
                }
            }
        }
    }

    #[test]
    fn oversized_crop_is_rejected() {
        let src = ramp_stack();
        let err = crop(&src, Vector3::new(2, 0, 0), Vector3::new(2, 1, 1)).unwrap_err();
        assert!(matches!(err, FilterError::DimensionMismatch { .. }));
    }
}
