//! Narrow access contract between the filtering core and a voxel buffer.

use super::stack::BitDepth;

/// Integer voxel access with an explicit current-slice cursor.
///
/// The 2D `get_pixel`/`set_pixel` pair reads the slice selected by
/// [`set_current_z`](VoxelAccess::set_current_z) and is the preferred path in
/// slice-ordered sweeps; `get_voxel`/`set_voxel` address the full grid and pay
/// the index arithmetic on every call.
pub trait VoxelAccess {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn depth(&self) -> usize;
    fn bit_depth(&self) -> BitDepth;

    /// Largest storable sample: `2^bits − 1`.
    fn white(&self) -> i64 {
        self.bit_depth().white()
    }

    /// `(width, height, depth)` in one tuple.
    fn extents(&self) -> (usize, usize, usize) {
        (self.width(), self.height(), self.depth())
    }

    fn get_voxel(&self, x: usize, y: usize, z: usize) -> i64;

    /// Store `v` clamped to `[0, white]`.
    fn set_voxel(&mut self, x: usize, y: usize, z: usize, v: i64);

    /// Select the slice addressed by `get_pixel`/`set_pixel`.
    fn set_current_z(&mut self, z: usize);

    fn get_pixel(&self, x: usize, y: usize) -> i64;

    fn set_pixel(&mut self, x: usize, y: usize, v: i64);
}
