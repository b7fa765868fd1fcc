//! Euclidean gradient magnitude from three accumulated difference passes.

use log::debug;
use nalgebra::Vector3;

use crate::axis::Axis;
use crate::factory::OperatorFactory;
use crate::mask::{Kernel, Mask, PassIo};

use super::{denominator, run_diff_axis, DiffFlags};

/// Gradient-norm mask with an isotropic skipping step.
///
/// `scale_denominator_intermediate_values` divides each squared axis
/// contribution while accumulating (keeping sums inside the embedded
/// headroom) and is folded back in by the square-root step, so the result is
/// the true per-voxel gradient magnitude.
pub fn gradient_norm(
    factory: &mut OperatorFactory,
    skip: usize,
    scale_denominator_intermediate_values: i64,
) -> Mask {
    gradient_norm_aniso(
        factory,
        Vector3::new(skip, skip, skip),
        scale_denominator_intermediate_values,
    )
}

/// Gradient-norm mask with per-axis skipping steps.
///
/// Unit recovery in the square-root step uses the X-axis step as the
/// reference; with anisotropic steps the caller is expected to have
/// calibrated the axes via [`gradient_norm_calibrated`].
pub fn gradient_norm_aniso(
    factory: &mut OperatorFactory,
    skips: Vector3<usize>,
    scale_denominator_intermediate_values: i64,
) -> Mask {
    debug!(
        "gradient_norm skips=({},{},{}) scale_den={scale_denominator_intermediate_values}",
        skips.x, skips.y, skips.z
    );
    factory.bound_mask(
        Kernel::GradientNorm {
            skips,
            scale_denominator: scale_denominator_intermediate_values.max(1),
        },
        1,
    )
}

/// Gradient norm with a physical step size, converted per axis to voxel
/// counts via the voxel edge lengths, clamped to a minimum of 1.
pub fn gradient_norm_calibrated(
    factory: &mut OperatorFactory,
    physical_step: f64,
    voxel_size: Vector3<f64>,
    scale_denominator_intermediate_values: i64,
) -> Mask {
    let skips = Vector3::new(
        to_voxels(physical_step, voxel_size.x),
        to_voxels(physical_step, voxel_size.y),
        to_voxels(physical_step, voxel_size.z),
    );
    gradient_norm_aniso(factory, skips, scale_denominator_intermediate_values)
}

#[inline]
fn to_voxels(physical: f64, edge: f64) -> usize {
    ((physical / edge).floor() as usize).max(1)
}

/// Zero the output, accumulate squared absolute differences for X, Y and Z,
/// then take the per-voxel square root with the unit-recovery scale.
pub(crate) fn run_gradient_norm(io: &mut PassIo, skips: Vector3<usize>, scale_denominator: i64) {
    io.clear_output();
    for (axis, skip) in Axis::ALL.into_iter().zip([skips.x, skips.y, skips.z]) {
        let flags = DiffFlags {
            absolute: true,
            squared: true,
            add_to_output: true,
            scale_denominator,
        };
        run_diff_axis(io, axis, 1, skip, flags);
    }
    // Each axis contributed d_raw²/(den·q) = d_true²·den/q; multiplying by
    // q/den under the root recovers the plain Euclidean magnitude.
    let den = denominator(1, skips.x) as f64;
    io.sqrt_output(scale_denominator as f64 / den);
}
