//! Deferred convolution masks and their composition algebra.
//!
//! A [`Mask`] binds a stencil kernel to an input/output embedding pair, an
//! accumulated normalization denominator and a margin shift. `apply` executes
//! the stencil eagerly and hands back an identity mask over the same bindings,
//! so repeated application is a no-op. `compose` chains masks lazily; the
//! overflow guard in [`Mask::compose`] trades laziness for numeric safety when
//! the combined denominator would endanger a 32-bit accumulator.

pub mod normalize;

use log::debug;
use nalgebra::Vector3;

use crate::axis::Axis;
use crate::blur;
use crate::diff::{self, DiffFlags};
use crate::embed::Embedding;
use crate::voxel::VoxelStack;

pub use self::normalize::NormalizationPolicy;

/// Largest denominator product `compose` defers without intervening.
///
/// Squaring a mid-range 16-bit embedded sample times this product stays within
/// a signed 32-bit accumulator; beyond it `compose` materializes and
/// normalizes eagerly instead of deferring.
pub const OVERFLOW_GUARD: i64 = 125;

/// Stencil kind executed by a leaf mask.
#[derive(Clone, Debug)]
pub(crate) enum Kernel {
    /// Already executed: further `apply` calls change nothing.
    Applied,
    /// Pass-through: materializes the input into the output (margin-shifted).
    /// The factory's standard entry point for building pipelines.
    Identity,
    /// One axis of the separable binomial blur.
    BinomialAxis { axis: Axis, order: usize, skip: usize },
    /// One axis of the iterated centered difference.
    DiffAxis {
        axis: Axis,
        order: usize,
        skip: usize,
        flags: DiffFlags,
    },
    /// Three squared, accumulated difference passes plus a square root.
    GradientNorm {
        skips: Vector3<usize>,
        scale_denominator: i64,
    },
}

/// Input/output bindings of a leaf mask.
///
/// The in-place case is a distinct variant constructed explicitly; incidental
/// aliasing of two bindings cannot be expressed.
#[derive(Clone, Debug)]
pub(crate) enum Bindings {
    Split { input: Embedding, output: Embedding },
    InPlace { buffer: Embedding },
}

impl Bindings {
    pub(crate) fn input(&self) -> &Embedding {
        match self {
            Bindings::Split { input, .. } => input,
            Bindings::InPlace { buffer } => buffer,
        }
    }

    pub(crate) fn input_mut(&mut self) -> &mut Embedding {
        match self {
            Bindings::Split { input, .. } => input,
            Bindings::InPlace { buffer } => buffer,
        }
    }

    pub(crate) fn output(&self) -> &Embedding {
        match self {
            Bindings::Split { output, .. } => output,
            Bindings::InPlace { buffer } => buffer,
        }
    }

    pub(crate) fn output_mut(&mut self) -> &mut Embedding {
        match self {
            Bindings::Split { output, .. } => output,
            Bindings::InPlace { buffer } => buffer,
        }
    }

    fn into_output(self) -> Embedding {
        match self {
            Bindings::Split { output, .. } => output,
            Bindings::InPlace { buffer } => buffer,
        }
    }
}

/// Read/write surface a stencil pass sweeps over.
///
/// Reads and writes are in *logical* (zero-relative) values. Writes subtract
/// the margin shift and silently drop destinations outside the output bounds.
pub(crate) struct PassIo<'a> {
    bindings: &'a mut Bindings,
    margin: Vector3<i64>,
}

impl<'a> PassIo<'a> {
    pub(crate) fn new(bindings: &'a mut Bindings, margin: Vector3<i64>) -> Self {
        Self { bindings, margin }
    }

    pub(crate) fn input_extents(&self) -> (usize, usize, usize) {
        self.bindings.input().extents()
    }

    pub(crate) fn output_extents(&self) -> (usize, usize, usize) {
        self.bindings.output().extents()
    }

    pub(crate) fn margin(&self) -> Vector3<i64> {
        self.margin
    }

    #[inline]
    pub(crate) fn read_input(&self, x: usize, y: usize, z: usize) -> i64 {
        self.bindings.input().logical(x, y, z)
    }

    #[inline]
    pub(crate) fn read_output(&self, x: usize, y: usize, z: usize) -> i64 {
        self.bindings.output().logical(x, y, z)
    }

    /// Write `v` at input coordinates minus the margin shift; drops silently
    /// when any axis falls outside the output.
    #[inline]
    pub(crate) fn write_shifted(&mut self, x: usize, y: usize, z: usize, v: i64) {
        let tx = x as i64 - self.margin.x;
        let ty = y as i64 - self.margin.y;
        let tz = z as i64 - self.margin.z;
        let out = self.bindings.output_mut();
        if out.stack().contains(tx, ty, tz) {
            out.set_logical(tx as usize, ty as usize, tz as usize, v);
        }
    }

    /// Read-modify-write variant of [`write_shifted`](PassIo::write_shifted).
    #[inline]
    pub(crate) fn add_shifted(&mut self, x: usize, y: usize, z: usize, v: i64) {
        let tx = x as i64 - self.margin.x;
        let ty = y as i64 - self.margin.y;
        let tz = z as i64 - self.margin.z;
        let out = self.bindings.output_mut();
        if out.stack().contains(tx, ty, tz) {
            let prev = out.logical(tx as usize, ty as usize, tz as usize);
            out.set_logical(tx as usize, ty as usize, tz as usize, prev + v);
        }
    }

    /// Write directly in output coordinates (iterations past the first run on
    /// the output buffer without any shift).
    #[inline]
    pub(crate) fn write_output(&mut self, x: usize, y: usize, z: usize, v: i64) {
        self.bindings.output_mut().set_logical(x, y, z, v);
    }

    pub(crate) fn clear_output(&mut self) {
        self.bindings.output_mut().clear();
    }

    /// Per-voxel square root of the output, scaled (gradient-norm final step).
    pub(crate) fn sqrt_output(&mut self, scale: f64) {
        self.bindings.output_mut().sqrt_values(scale);
    }

    /// Copy the input into the output, margin-shifted (the identity kernel).
    /// A no-op for in-place bindings: input and output already coincide.
    fn pass_through(&mut self) {
        let margin = self.margin;
        if let Bindings::Split { input, output } = &mut *self.bindings {
            output.copy_shifted_from(input, -margin, true);
        }
    }
}

/// A leaf operator: one kernel bound to embeddings, denominator and margin.
#[derive(Clone, Debug)]
pub struct StencilMask {
    pub(crate) kernel: Kernel,
    pub(crate) bindings: Bindings,
    pub(crate) denominator: i64,
    pub(crate) margin: Vector3<i64>,
}

impl StencilMask {
    fn run(&mut self) {
        let kernel = self.kernel.clone();
        let io = &mut PassIo {
            bindings: &mut self.bindings,
            margin: self.margin,
        };
        match kernel {
            Kernel::Applied => {}
            Kernel::Identity => io.pass_through(),
            Kernel::BinomialAxis { axis, order, skip } => {
                blur::run_binomial_axis(io, axis, order, skip);
            }
            Kernel::DiffAxis {
                axis,
                order,
                skip,
                flags,
            } => {
                diff::run_diff_axis(io, axis, order, skip, flags);
            }
            Kernel::GradientNorm {
                skips,
                scale_denominator,
            } => {
                diff::run_gradient_norm(io, skips, scale_denominator);
            }
        }
    }
}

/// Deferred convolution operator: a leaf stencil or a lazy composition.
#[derive(Clone, Debug)]
pub enum Mask {
    Stencil(StencilMask),
    Composite {
        lhs: Box<Mask>,
        rhs: Box<Mask>,
        denominator: i64,
    },
}

impl Mask {
    /// Pass-through mask over the given bindings.
    pub(crate) fn identity(bindings: Bindings, margin: Vector3<i64>) -> Mask {
        Mask::Stencil(StencilMask {
            kernel: Kernel::Identity,
            bindings,
            denominator: 1,
            margin,
        })
    }

    pub(crate) fn stencil(
        kernel: Kernel,
        bindings: Bindings,
        denominator: i64,
        margin: Vector3<i64>,
    ) -> Mask {
        Mask::Stencil(StencilMask {
            kernel,
            bindings,
            denominator,
            margin,
        })
    }

    /// Accumulated normalization denominator of the effective stencil.
    pub fn denominator(&self) -> i64 {
        match self {
            Mask::Stencil(m) => m.denominator,
            Mask::Composite { denominator, .. } => *denominator,
        }
    }

    /// Final output embedding of this operator.
    pub fn output(&self) -> &Embedding {
        match self {
            Mask::Stencil(m) => m.bindings.output(),
            Mask::Composite { rhs, .. } => rhs.output(),
        }
    }

    pub(crate) fn output_mut(&mut self) -> &mut Embedding {
        match self {
            Mask::Stencil(m) => m.bindings.output_mut(),
            Mask::Composite { rhs, .. } => rhs.output_mut(),
        }
    }

    /// Innermost input embedding (the upstream feed point of a pipeline).
    pub(crate) fn input_mut(&mut self) -> &mut Embedding {
        match self {
            Mask::Stencil(m) => m.bindings.input_mut(),
            Mask::Composite { lhs, .. } => lhs.input_mut(),
        }
    }

    fn into_output(self) -> Embedding {
        match self {
            Mask::Stencil(m) => m.bindings.into_output(),
            Mask::Composite { rhs, .. } => rhs.into_output(),
        }
    }

    fn set_denominator(&mut self, value: i64) {
        match self {
            Mask::Stencil(m) => m.denominator = value,
            Mask::Composite { denominator, .. } => *denominator = value,
        }
    }

    /// Execute the stencil eagerly; the returned mask is an identity over the
    /// same bindings and denominator, so further `apply` calls change nothing.
    pub fn apply(self) -> Mask {
        match self {
            Mask::Stencil(mut m) => {
                m.run();
                m.kernel = Kernel::Applied;
                Mask::Stencil(m)
            }
            Mask::Composite {
                lhs,
                rhs,
                denominator,
            } => {
                let lhs = lhs.apply();
                let mut rhs = *rhs;
                rhs.input_mut()
                    .copy_shifted_from(lhs.output(), Vector3::zeros(), true);
                let rhs = rhs.apply();
                Mask::Composite {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    denominator,
                }
            }
        }
    }

    /// Defer "apply `self`, feed its result into `rhs`, apply `rhs`".
    ///
    /// When the combined denominator exceeds [`OVERFLOW_GUARD`], laziness is
    /// traded for numeric safety. Data flows upstream to downstream, so the
    /// guard always materializes `self` first: with `self` holding the larger
    /// denominator it is applied and normalized now, its output piped into
    /// `rhs`'s input, and `rhs` returned unchanged; with `rhs` larger the
    /// whole chain runs eagerly, each side normalized as soon as it has run,
    /// and the returned mask is fully applied with denominator 1. Stored
    /// intermediates never carry more than one side's denominator.
    pub fn compose(self, rhs: Mask) -> Mask {
        let product = self.denominator() * rhs.denominator();
        if product > OVERFLOW_GUARD {
            debug!(
                "Mask::compose denominator product {product} > {OVERFLOW_GUARD}: eager normalization"
            );
            let rhs_larger = rhs.denominator() > self.denominator();
            let mut lhs = self.apply();
            lhs.normalize_output();
            let mut rhs = rhs;
            rhs.input_mut()
                .copy_shifted_from(lhs.output(), Vector3::zeros(), true);
            if rhs_larger {
                let mut rhs = rhs.apply();
                rhs.normalize_output();
                return rhs;
            }
            return rhs;
        }
        Mask::Composite {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
            denominator: product,
        }
    }

    /// Divide the output by the accumulated denominator and reset it to 1.
    ///
    /// Required before any consumer that assumes quantitatively correct (not
    /// merely proportional) values, e.g. a gradient norm.
    pub fn normalize_output(&mut self) {
        let den = self.denominator();
        if den != 1 {
            self.output_mut().divide(den);
            self.set_denominator(1);
        }
    }

    /// Apply the mask, then map its output through a normalization policy into
    /// a displayable/storable stack. The single seam where proportional values
    /// become an image.
    pub fn into_convolved(self, policy: NormalizationPolicy) -> VoxelStack {
        let applied = self.apply();
        let denominator = applied.denominator();
        normalize::convert(applied.into_output(), denominator, policy)
    }
}
