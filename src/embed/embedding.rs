//! A voxel stack paired with a sign policy: zero-relative linear arithmetic.

use nalgebra::Vector3;

use super::policy::{embed_divisor, SignPolicy};
use crate::error::FilterError;
use crate::voxel::{BitDepth, VoxelAccess, VoxelStack};

/// Owned stack plus the policy defining its zero point and logical range.
///
/// Every operation here works on *logical* values (stored − zero); stores
/// clamp at 0 because storage is non-negative.
#[derive(Clone, Debug)]
pub struct Embedding {
    stack: VoxelStack,
    policy: SignPolicy,
}

impl Embedding {
    pub fn new(stack: VoxelStack, policy: SignPolicy) -> Self {
        Self { stack, policy }
    }

    /// Zero-filled embedding of the given extents. For a signed policy the
    /// raw storage is then *not* at logical zero; see [`Embedding::clear`].
    pub fn empty(w: usize, h: usize, d: usize, depth: BitDepth, policy: SignPolicy) -> Self {
        Self {
            stack: VoxelStack::empty(w, h, d, depth),
            policy,
        }
    }

    #[inline]
    pub fn policy(&self) -> SignPolicy {
        self.policy
    }

    #[inline]
    pub fn bit_depth(&self) -> BitDepth {
        self.stack.bit_depth()
    }

    #[inline]
    pub fn extents(&self) -> (usize, usize, usize) {
        self.stack.extents()
    }

    #[inline]
    pub fn white(&self) -> i64 {
        self.stack.white()
    }

    /// Stored sample representing logical zero.
    #[inline]
    pub fn zero(&self) -> i64 {
        self.policy.zero(self.bit_depth())
    }

    /// Smallest representable logical value (`−zero`).
    #[inline]
    pub fn min_value(&self) -> i64 {
        -self.zero()
    }

    /// Largest representable logical value (`white − zero`).
    #[inline]
    pub fn max_value(&self) -> i64 {
        self.white() - self.zero()
    }

    #[inline]
    pub fn stack(&self) -> &VoxelStack {
        &self.stack
    }

    #[inline]
    pub fn stack_mut(&mut self) -> &mut VoxelStack {
        &mut self.stack
    }

    pub fn into_stack(self) -> VoxelStack {
        self.stack
    }

    /// Logical value at `(x, y, z)`.
    #[inline]
    pub fn logical(&self, x: usize, y: usize, z: usize) -> i64 {
        self.stack.get_voxel(x, y, z) - self.zero()
    }

    /// Store `v + zero`, clamped to storage.
    #[inline]
    pub fn set_logical(&mut self, x: usize, y: usize, z: usize, v: i64) {
        let zero = self.zero();
        self.stack.set_voxel(x, y, z, v + zero);
    }

    /// Reset every voxel to logical zero.
    pub fn clear(&mut self) {
        let zero = self.zero();
        self.stack.fill(zero);
    }

    /// Re-embed into `target` depth under a signed/unsigned policy.
    ///
    /// Same-depth embeds rescale in place; cross-depth embeds allocate. The
    /// fixed divisor table (32 / 512 / 1 / 8192) guarantees that an embedded
    /// value squared still fits the target width.
    pub fn embed(self, signed: bool, target: BitDepth) -> Embedding {
        let from = self.bit_depth();
        let divisor = embed_divisor(from, target);
        let new_policy = SignPolicy::from_signed_flag(signed);
        let old_zero = self.zero();
        let new_zero = new_policy.zero(target);
        let (w, h, d) = self.extents();

        if from == target {
            let mut out = Embedding {
                stack: self.stack,
                policy: new_policy,
            };
            for z in 0..d {
                out.stack.set_current_z(z);
                for y in 0..h {
                    for x in 0..w {
                        let v = out.stack.get_pixel(x, y) - old_zero;
                        out.stack.set_pixel(x, y, new_zero + v / divisor);
                    }
                }
            }
            out
        } else {
            let mut out = Embedding::empty(w, h, d, target, new_policy);
            for z in 0..d {
                out.stack.set_current_z(z);
                for y in 0..h {
                    for x in 0..w {
                        let v = self.stack.get_voxel(x, y, z) - old_zero;
                        out.stack.set_pixel(x, y, new_zero + v / divisor);
                    }
                }
            }
            out
        }
    }

    /// Set every voxel to the raw sample `value`.
    pub fn set_constant(&mut self, value: i64) -> Result<(), FilterError> {
        if value < 0 || value > self.white() {
            return Err(FilterError::Range {
                value,
                white: self.white(),
            });
        }
        self.stack.fill(value);
        Ok(())
    }

    /// Multiply logical values by an integer factor.
    pub fn multiply(&mut self, factor: i64) {
        self.map_logical(|v| v * factor);
    }

    /// Divide logical values by an integer factor (truncating toward zero).
    pub fn divide(&mut self, factor: i64) {
        debug_assert!(factor != 0, "division by zero factor");
        self.map_logical(|v| v / factor);
    }

    /// Multiply logical values by a float factor, rounding to nearest.
    pub fn multiply_f64(&mut self, factor: f64) {
        self.map_logical(|v| (v as f64 * factor).round() as i64);
    }

    /// Divide logical values by a float factor, rounding to nearest.
    pub fn divide_f64(&mut self, factor: f64) {
        debug_assert!(factor != 0.0, "division by zero factor");
        self.map_logical(|v| (v as f64 / factor).round() as i64);
    }

    /// Reflect stored values around the zero point: `2·zero − v`, clamped at 0.
    ///
    /// Asymmetric by construction — storage cannot go negative, so values
    /// above `2·zero` collapse onto 0.
    pub fn opposite(&mut self) {
        self.map_logical(|v| -v);
    }

    /// Reverse the stored range: stored ← `max_value + zero − stored`, i.e.
    /// `white − stored` under every policy.
    pub fn reversed(&mut self) {
        let flip = self.max_value() - self.zero();
        self.map_logical(|v| flip - v);
    }

    /// Reflect negative logical values around zero.
    pub fn abs_values(&mut self) {
        self.map_logical(|v| v.abs());
    }

    /// Keep positive logical values, map the rest to zero.
    pub fn positive_part(&mut self) {
        self.map_logical(|v| v.max(0));
    }

    /// Keep the magnitude of negative logical values, map the rest to zero.
    pub fn negative_part(&mut self) {
        self.map_logical(|v| (-v).max(0));
    }

    /// Per-voxel square root of the logical value scaled by `scale`, rounded
    /// to nearest. Negative logical values map to 0.
    pub fn sqrt_values(&mut self, scale: f64) {
        self.map_logical(|v| {
            if v <= 0 {
                0
            } else {
                (v as f64 * scale).sqrt().round() as i64
            }
        });
    }

    /// Copy `other` into `self` with a coordinate translation.
    ///
    /// Destination voxels falling outside `self` are silently skipped. With
    /// `scale_for_bit_depth`, samples crossing 8↔16 bits are additionally
    /// scaled ×256 or ÷256; zero points are mapped on every copy.
    pub fn copy_shifted_from(
        &mut self,
        other: &Embedding,
        shift: Vector3<i64>,
        scale_for_bit_depth: bool,
    ) {
        let src_zero = other.zero();
        let dst_zero = self.zero();
        let (sw, sh, sd) = other.extents();
        let scale = bit_depth_scale(other.bit_depth(), self.bit_depth(), scale_for_bit_depth);

        for z in 0..sd {
            let tz = z as i64 + shift.z;
            for y in 0..sh {
                let ty = y as i64 + shift.y;
                for x in 0..sw {
                    let tx = x as i64 + shift.x;
                    if !self.stack.contains(tx, ty, tz) {
                        continue;
                    }
                    let v = other.stack.get_voxel(x, y, z) - src_zero;
                    let v = match scale {
                        DepthScale::One => v,
                        DepthScale::Up => v * 256,
                        DepthScale::Down => v / 256,
                    };
                    self.stack
                        .set_voxel(tx as usize, ty as usize, tz as usize, dst_zero + v);
                }
            }
        }
    }

    /// Add `other`'s logical values voxel-by-voxel (storage clamps at 0).
    pub fn add_values(&mut self, other: &Embedding) -> Result<(), FilterError> {
        self.combine(other, |a, b| a + b)
    }

    /// Subtract `other`'s logical values voxel-by-voxel (storage clamps at 0).
    pub fn subtract_values(&mut self, other: &Embedding) -> Result<(), FilterError> {
        self.combine(other, |a, b| a - b)
    }

    fn combine(
        &mut self,
        other: &Embedding,
        op: impl Fn(i64, i64) -> i64,
    ) -> Result<(), FilterError> {
        if self.extents() != other.extents() {
            return Err(FilterError::DimensionMismatch {
                expected: self.extents(),
                found: other.extents(),
            });
        }
        let (w, h, d) = self.extents();
        let zero = self.zero();
        let other_zero = other.zero();
        for z in 0..d {
            self.stack.set_current_z(z);
            for y in 0..h {
                for x in 0..w {
                    let a = self.stack.get_pixel(x, y) - zero;
                    let b = other.stack.get_voxel(x, y, z) - other_zero;
                    self.stack.set_pixel(x, y, zero + op(a, b));
                }
            }
        }
        Ok(())
    }

    fn map_logical(&mut self, op: impl Fn(i64) -> i64) {
        let (w, h, d) = self.extents();
        let zero = self.zero();
        for z in 0..d {
            self.stack.set_current_z(z);
            for y in 0..h {
                for x in 0..w {
                    let v = self.stack.get_pixel(x, y) - zero;
                    self.stack.set_pixel(x, y, zero + op(v));
                }
            }
        }
    }
}

enum DepthScale {
    One,
    Up,
    Down,
}

fn bit_depth_scale(from: BitDepth, to: BitDepth, enabled: bool) -> DepthScale {
    if !enabled || from == to {
        return DepthScale::One;
    }
    match (from, to) {
        (BitDepth::Eight, BitDepth::Sixteen) => DepthScale::Up,
        (BitDepth::Sixteen, BitDepth::Eight) => DepthScale::Down,
        _ => DepthScale::One,
    }
}
