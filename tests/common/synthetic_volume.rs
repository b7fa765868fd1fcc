use voxel_filter::{BitDepth, VoxelAccess, VoxelStack};

/// Stack filled with a single value everywhere.
pub fn uniform(extent: usize, depth: BitDepth, value: i64) -> VoxelStack {
    assert!(extent > 0, "extent must be positive");
    let mut stack = VoxelStack::empty(extent, extent, extent, depth);
    stack.fill(value);
    stack
}

/// All-zero stack with one bright voxel at the centre.
pub fn centered_impulse(extent: usize, depth: BitDepth, value: i64) -> VoxelStack {
    assert!(extent % 2 == 1, "impulse volume needs an odd extent");
    let mut stack = VoxelStack::empty(extent, extent, extent, depth);
    let c = extent / 2;
    stack.set_voxel(c, c, c, value);
    stack
}

/// Intensity ramp along x: value at (x, y, z) is `offset + slope * x`.
pub fn x_ramp(extent: usize, depth: BitDepth, offset: i64, slope: i64) -> VoxelStack {
    let mut stack = VoxelStack::empty(extent, extent, extent, depth);
    for z in 0..extent {
        for y in 0..extent {
            for x in 0..extent {
                stack.set_voxel(x, y, z, offset + slope * x as i64);
            }
        }
    }
    stack
}
