//! Owned dense voxel storage at 8 or 16 bits per sample.

use super::traits::VoxelAccess;

/// Storage width of a stack. Defines the white value `2^bits − 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Largest storable sample.
    #[inline]
    pub fn white(self) -> i64 {
        match self {
            BitDepth::Eight => 255,
            BitDepth::Sixteen => 65535,
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }
}

#[derive(Clone, Debug)]
enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

/// Owned width×height×depth grid in slice-major layout (x fastest, z slowest).
///
/// All value traffic uses `i64`; stores clamp into `[0, white]` so integer
/// arithmetic done by callers cannot wrap the storage width.
#[derive(Clone, Debug)]
pub struct VoxelStack {
    w: usize,
    h: usize,
    d: usize,
    samples: Samples,
    cur_z: usize,
}

impl VoxelStack {
    /// Zero-initialized stack of the given extents and depth.
    pub fn empty(w: usize, h: usize, d: usize, depth: BitDepth) -> Self {
        let n = w * h * d;
        let samples = match depth {
            BitDepth::Eight => Samples::U8(vec![0; n]),
            BitDepth::Sixteen => Samples::U16(vec![0; n]),
        };
        Self {
            w,
            h,
            d,
            samples,
            cur_z: 0,
        }
    }

    /// Wrap raw 8-bit samples; `data.len()` must equal `w*h*d`.
    pub fn from_u8(w: usize, h: usize, d: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), w * h * d, "sample count must match extents");
        Self {
            w,
            h,
            d,
            samples: Samples::U8(data),
            cur_z: 0,
        }
    }

    /// Wrap raw 16-bit samples; `data.len()` must equal `w*h*d`.
    pub fn from_u16(w: usize, h: usize, d: usize, data: Vec<u16>) -> Self {
        assert_eq!(data.len(), w * h * d, "sample count must match extents");
        Self {
            w,
            h,
            d,
            samples: Samples::U16(data),
            cur_z: 0,
        }
    }

    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.h + y) * self.w + x
    }

    /// True when `(x, y, z)` addresses a stored voxel.
    #[inline]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.w
            && (y as usize) < self.h
            && (z as usize) < self.d
    }

    /// Overwrite every sample with `v`, clamped to `[0, white]`.
    pub fn fill(&mut self, v: i64) {
        let v = v.clamp(0, self.bit_depth().white());
        match &mut self.samples {
            Samples::U8(data) => data.fill(v as u8),
            Samples::U16(data) => data.fill(v as u16),
        }
    }

    #[inline]
    fn load(&self, i: usize) -> i64 {
        match &self.samples {
            Samples::U8(data) => data[i] as i64,
            Samples::U16(data) => data[i] as i64,
        }
    }

    #[inline]
    fn store(&mut self, i: usize, v: i64) {
        let v = v.clamp(0, self.bit_depth().white());
        match &mut self.samples {
            Samples::U8(data) => data[i] = v as u8,
            Samples::U16(data) => data[i] = v as u16,
        }
    }
}

impl VoxelAccess for VoxelStack {
    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn depth(&self) -> usize {
        self.d
    }

    #[inline]
    fn bit_depth(&self) -> BitDepth {
        match self.samples {
            Samples::U8(_) => BitDepth::Eight,
            Samples::U16(_) => BitDepth::Sixteen,
        }
    }

    #[inline]
    fn get_voxel(&self, x: usize, y: usize, z: usize) -> i64 {
        self.load(self.idx(x, y, z))
    }

    #[inline]
    fn set_voxel(&mut self, x: usize, y: usize, z: usize, v: i64) {
        let i = self.idx(x, y, z);
        self.store(i, v);
    }

    #[inline]
    fn set_current_z(&mut self, z: usize) {
        debug_assert!(z < self.d, "slice cursor out of range");
        self.cur_z = z;
    }

    #[inline]
    fn get_pixel(&self, x: usize, y: usize) -> i64 {
        self.load(self.idx(x, y, self.cur_z))
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, v: i64) {
        let i = self.idx(x, y, self.cur_z);
        self.store(i, v);
    }
}
