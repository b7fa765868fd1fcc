//! Pipeline seeding: embeddings, margin bookkeeping, identity masks.
//!
//! An [`OperatorFactory`] binds one input stack to a sign-policy embedding,
//! optionally re-embeds either side, optionally pads the input with a border
//! (recording the margin every later mask subtracts on write), and then hands
//! its bindings to the first mask built on it. Masks built after the first
//! get fresh intermediate buffers shaped like the pipeline output.

use log::debug;
use nalgebra::Vector3;

use crate::embed::{Embedding, SignPolicy};
use crate::mask::{Bindings, Kernel, Mask};
use crate::voxel::{ops, BitDepth, BorderFill, VoxelAccess, VoxelStack};

#[derive(Clone, Copy, Debug)]
struct OutputShape {
    extents: (usize, usize, usize),
    depth: BitDepth,
    policy: SignPolicy,
}

/// Binds an input image to embeddings and seeds operator pipelines.
///
/// Embedding and enlargement must happen before the first mask is built; the
/// factory gives its buffers to that mask and only shapes intermediates
/// afterwards.
pub struct OperatorFactory {
    input: Option<Embedding>,
    output: Option<Embedding>,
    shape: Option<OutputShape>,
    margin: Vector3<i64>,
}

impl OperatorFactory {
    /// Bind `stack` under an unsigned policy at its native depth; the output
    /// side starts as an empty buffer of the same shape.
    pub fn new(stack: VoxelStack) -> Self {
        let (w, h, d) = stack.extents();
        let depth = stack.bit_depth();
        let output = Embedding::empty(w, h, d, depth, SignPolicy::Unsigned);
        Self {
            input: Some(Embedding::new(stack, SignPolicy::Unsigned)),
            output: Some(output),
            shape: None,
            margin: Vector3::zeros(),
        }
    }

    /// Re-embed the input side (rescaling samples per the divisor table).
    pub fn embed_input(&mut self, signed: bool, depth: BitDepth) {
        let e = self
            .input
            .take()
            .expect("operator factory already seeded a pipeline");
        self.input = Some(e.embed(signed, depth));
    }

    /// Rebind only the output side to a fresh buffer at the given policy and
    /// depth; extents stay those of the current output.
    pub fn embed_output(&mut self, signed: bool, depth: BitDepth) {
        let old = self
            .output
            .take()
            .expect("operator factory already seeded a pipeline");
        let (w, h, d) = old.extents();
        let mut out = Embedding::empty(w, h, d, depth, SignPolicy::from_signed_flag(signed));
        out.clear();
        self.output = Some(out);
    }

    /// Replace the input with a border-padded copy and record the margin
    /// shift applied by every mask built afterwards.
    pub fn enlarge_input(&mut self, mx: usize, my: usize, mz: usize, fill: BorderFill) {
        let e = self
            .input
            .take()
            .expect("operator factory already seeded a pipeline");
        let policy = e.policy();
        let enlarged = ops::enlarge(e.stack(), Vector3::new(mx, my, mz), fill);
        self.input = Some(Embedding::new(enlarged, policy));
        self.margin += Vector3::new(mx as i64, my as i64, mz as i64);
        debug!(
            "enlarge_input margin now ({}, {}, {})",
            self.margin.x, self.margin.y, self.margin.z
        );
    }

    /// Margin recorded by [`enlarge_input`](OperatorFactory::enlarge_input).
    pub fn margin(&self) -> Vector3<i64> {
        self.margin
    }

    /// No-op mask over the current bindings — the standard entry point for
    /// building a pipeline with `compose`.
    pub fn identity_mask(&mut self) -> Mask {
        self.bound_mask(Kernel::Identity, 1)
    }

    /// Identity mask operating on the input buffer itself. The explicit
    /// in-place binding; only legal while no margin is recorded.
    pub fn identity_mask_in_place(&mut self) -> Mask {
        self.bound_in_place(Kernel::Identity, 1)
    }

    /// Build a mask on the factory's bindings: the first call takes the bound
    /// input/output pair (with the recorded margin); later calls allocate
    /// intermediate buffers shaped like the pipeline output, margin-free.
    /// The margin band is consumed by that first pass, so passes built
    /// afterwards sweep already-cropped data and replicate line starts at the
    /// output border instead of reading padded samples.
    pub(crate) fn bound_mask(&mut self, kernel: Kernel, denominator: i64) -> Mask {
        if self.input.is_some() {
            let input = self.input.take().expect("input present");
            let output = self.output.take().expect("output side present");
            self.shape = Some(OutputShape {
                extents: output.extents(),
                depth: output.bit_depth(),
                policy: output.policy(),
            });
            let mut bindings = Bindings::Split { input, output };
            bindings.output_mut().clear();
            return Mask::stencil(kernel, bindings, denominator, self.margin);
        }
        let shape = self
            .shape
            .expect("operator factory has no bound image left");
        let (w, h, d) = shape.extents;
        let mut input = Embedding::empty(w, h, d, shape.depth, shape.policy);
        input.clear();
        let mut output = Embedding::empty(w, h, d, shape.depth, shape.policy);
        output.clear();
        Mask::stencil(
            kernel,
            Bindings::Split { input, output },
            denominator,
            Vector3::zeros(),
        )
    }

    /// In-place variant of [`bound_mask`](OperatorFactory::bound_mask): the
    /// input buffer is read and written by the same pass.
    pub(crate) fn bound_in_place(&mut self, kernel: Kernel, denominator: i64) -> Mask {
        assert_eq!(
            self.margin,
            Vector3::zeros(),
            "in-place masks require an unpadded input"
        );
        let buffer = self
            .input
            .take()
            .expect("operator factory already seeded a pipeline");
        self.shape = Some(OutputShape {
            extents: buffer.extents(),
            depth: buffer.bit_depth(),
            policy: buffer.policy(),
        });
        Mask::stencil(
            kernel,
            Bindings::InPlace { buffer },
            denominator,
            Vector3::zeros(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::NormalizationPolicy;

    fn impulse_stack() -> VoxelStack {
        let mut s = VoxelStack::empty(5, 5, 5, BitDepth::Eight);
        s.set_voxel(2, 2, 2, 200);
        s
    }

    #[test]
    fn identity_pipeline_reproduces_the_image() {
        let mut f = OperatorFactory::new(impulse_stack());
        let out = f
            .identity_mask()
            .into_convolved(NormalizationPolicy::NoNormalization);
        assert_eq!(out.get_voxel(2, 2, 2), 200);
        assert_eq!(out.get_voxel(0, 0, 0), 0);
    }

    #[test]
    fn enlarge_then_identity_crops_back_to_output_size() {
        let mut f = OperatorFactory::new(impulse_stack());
        f.enlarge_input(2, 2, 2, BorderFill::Replicate);
        assert_eq!(f.margin(), Vector3::new(2, 2, 2));
        let out = f
            .identity_mask()
            .into_convolved(NormalizationPolicy::NoNormalization);
        assert_eq!(out.extents(), (5, 5, 5));
        assert_eq!(out.get_voxel(2, 2, 2), 200);
        assert_eq!(out.get_voxel(4, 4, 4), 0);
    }

    #[test]
    fn embed_output_rebinds_only_the_output_side() {
        let mut f = OperatorFactory::new(impulse_stack());
        f.embed_input(true, BitDepth::Sixteen);
        f.embed_output(true, BitDepth::Sixteen);
        let mask = f.identity_mask();
        assert_eq!(mask.output().bit_depth(), BitDepth::Sixteen);
        let applied = mask.apply();
        assert_eq!(applied.output().logical(2, 2, 2), 200);
    }

    #[test]
    fn followers_are_shaped_like_the_output() {
        let mut f = OperatorFactory::new(impulse_stack());
        f.enlarge_input(1, 1, 1, BorderFill::Replicate);
        let first = f.bound_mask(Kernel::Identity, 1);
        let follower = f.bound_mask(Kernel::Identity, 1);
        assert_eq!(first.output().extents(), (5, 5, 5));
        assert_eq!(follower.output().extents(), (5, 5, 5));
        let composed = first.compose(follower).apply();
        assert_eq!(composed.output().logical(2, 2, 2), 200);
    }

    #[test]
    fn in_place_identity_keeps_the_buffer() {
        let mut f = OperatorFactory::new(impulse_stack());
        let m = f.identity_mask_in_place().apply();
        assert_eq!(m.output().logical(2, 2, 2), 200);
    }
}
