//! Conversion of a filtered embedding into a displayable/storable stack.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::voxel::{BitDepth, VoxelAccess, VoxelStack};

/// How `Mask::into_convolved` maps proportional filtered values to an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// Hand the raw output back untouched.
    NoNormalization,
    /// Divide by 256 and convert to 8 bits (the natural 16→8 projection).
    DivideThenGray8,
    /// Clamp-convert to 8 bits without rescaling.
    Gray8Clamp,
    /// Linearly stretch the observed value range onto `[0, 255]`.
    Gray8MaximizeContrast,
    /// Linearly stretch the observed value range onto `[0, 65535]`.
    Gray16MaximizeContrast,
    /// Divide by the accumulated denominator; 16-bit output.
    Gray16Quantitative,
    /// Divide by the accumulated denominator, then clamp-convert to 8 bits.
    Gray8QuantitativeClamp,
}

/// Apply `policy` to the final output embedding of an applied mask.
pub(crate) fn convert(
    mut output: Embedding,
    denominator: i64,
    policy: NormalizationPolicy,
) -> VoxelStack {
    match policy {
        NormalizationPolicy::NoNormalization => output.into_stack(),
        NormalizationPolicy::DivideThenGray8 => to_depth(&output, BitDepth::Eight, true),
        NormalizationPolicy::Gray8Clamp => to_depth(&output, BitDepth::Eight, false),
        NormalizationPolicy::Gray8MaximizeContrast => {
            maximize_contrast(&output, BitDepth::Eight)
        }
        NormalizationPolicy::Gray16MaximizeContrast => {
            maximize_contrast(&output, BitDepth::Sixteen)
        }
        NormalizationPolicy::Gray16Quantitative => {
            output.divide(denominator.max(1));
            to_depth(&output, BitDepth::Sixteen, false)
        }
        NormalizationPolicy::Gray8QuantitativeClamp => {
            output.divide(denominator.max(1));
            to_depth(&output, BitDepth::Eight, false)
        }
    }
}

/// Convert to the target depth under the same sign policy.
///
/// With `scale` the copy applies the ×256/÷256 cross-depth factor; without it
/// magnitudes carry over and the storage clamp does the clamping.
fn to_depth(src: &Embedding, target: BitDepth, scale: bool) -> VoxelStack {
    if src.bit_depth() == target {
        return src.stack().clone();
    }
    let (w, h, d) = src.extents();
    let mut dst = Embedding::empty(w, h, d, target, src.policy());
    dst.copy_shifted_from(src, Vector3::zeros(), scale);
    dst.into_stack()
}

/// Stretch the observed logical range linearly onto `[0, white]` of `target`.
fn maximize_contrast(src: &Embedding, target: BitDepth) -> VoxelStack {
    let (w, h, d) = src.extents();
    let mut lo = i64::MAX;
    let mut hi = i64::MIN;
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let v = src.logical(x, y, z);
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }

    let mut out = VoxelStack::empty(w, h, d, target);
    if hi <= lo {
        return out;
    }
    let gain = target.white() as f64 / (hi - lo) as f64;
    for z in 0..d {
        out.set_current_z(z);
        for y in 0..h {
            for x in 0..w {
                let v = ((src.logical(x, y, z) - lo) as f64 * gain).round() as i64;
                out.set_pixel(x, y, v);
            }
        }
    }
    out
}
