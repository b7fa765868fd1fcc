#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod axis;
pub mod error;
pub mod factory;
pub mod voxel;

// “Expert” modules – still public, but considered unstable internals.
// (You can tighten or feature-gate these later.)
pub mod blur;
pub mod diff;
pub mod embed;
pub mod mask;

// --- High-level re-exports -------------------------------------------------

// Main entry points: factory + mask algebra.
pub use crate::factory::OperatorFactory;
pub use crate::mask::{Mask, NormalizationPolicy};

// The filter builders most callers want.
pub use crate::blur::{binomial_blur, binomial_blur_calibrated};
pub use crate::diff::{
    finite_difference, finite_difference_axis, gradient_norm, gradient_norm_calibrated, DiffFlags,
};

// Shared leaf types.
pub use crate::axis::Axis;
pub use crate::embed::{Embedding, SignPolicy};
pub use crate::error::FilterError;
pub use crate::voxel::{BitDepth, BorderFill, VoxelAccess, VoxelStack};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use voxel_filter::prelude::*;
///
/// # fn main() {
/// let stack = VoxelStack::empty(64, 64, 16, BitDepth::Eight);
/// let mut factory = OperatorFactory::new(stack);
/// let blurred = binomial_blur(&mut factory, 3, 1)
///     .into_convolved(NormalizationPolicy::Gray8Clamp);
/// println!("blurred mid-slice value: {}", blurred.get_voxel(32, 32, 8));
/// # }
/// ```
pub mod prelude {
    pub use crate::blur::{binomial_blur, binomial_blur_calibrated};
    pub use crate::diff::{finite_difference, gradient_norm};
    pub use crate::voxel::{BitDepth, BorderFill, VoxelAccess, VoxelStack};
    pub use crate::{Axis, Mask, NormalizationPolicy, OperatorFactory, SignPolicy};
}
