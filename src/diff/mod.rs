//! Iterated centered symmetric differences per axis.
//!
//! One pass computes `in(p+s) − in(p−s)` along an axis, `order` times; the
//! accumulated denominator is `(2s)^order`. Flags select absolute-value,
//! squared (with the immediate overflow-controlling divide) and
//! accumulate-into-output variants. Positions where the stencil does not fit
//! are written as logical zero in overwrite mode and left untouched in
//! accumulate mode.

pub mod gradient;

use log::debug;

use crate::axis::Axis;
use crate::error::FilterError;
use crate::factory::OperatorFactory;
use crate::mask::{Kernel, Mask, PassIo};

pub use self::gradient::{gradient_norm, gradient_norm_aniso, gradient_norm_calibrated};
pub(crate) use self::gradient::run_gradient_norm;

/// Variants of the finite-difference pass.
///
/// `scale_denominator` is an extra divisor applied only in accumulate mode.
#[derive(Clone, Copy, Debug)]
pub struct DiffFlags {
    /// Reflect negative results around zero.
    pub absolute: bool,
    /// Square the result and divide by the denominator immediately; required
    /// before summing independent axis contributions into a norm.
    pub squared: bool,
    /// Accumulate into the existing output instead of overwriting. Only legal
    /// with `order == 1`.
    pub add_to_output: bool,
    pub scale_denominator: i64,
}

impl Default for DiffFlags {
    fn default() -> Self {
        Self {
            absolute: false,
            squared: false,
            add_to_output: false,
            scale_denominator: 1,
        }
    }
}

/// Build a single-axis finite-difference mask on the factory's bindings.
pub fn finite_difference_axis(
    factory: &mut OperatorFactory,
    axis: Axis,
    order: usize,
    skip: usize,
    flags: DiffFlags,
) -> Result<Mask, FilterError> {
    if flags.add_to_output && order != 1 {
        return Err(FilterError::Unsupported {
            operation: "finite difference accumulate",
            reason: "accumulate mode requires order 1",
        });
    }
    let denominator = denominator(order, skip);
    debug!("finite_difference axis={axis} order={order} skip={skip} den={denominator}");
    Ok(factory.bound_mask(
        Kernel::DiffAxis {
            axis,
            order,
            skip,
            flags,
        },
        denominator,
    ))
}

/// Compose the X, Y and Z difference passes, like the blur does.
pub fn finite_difference(
    factory: &mut OperatorFactory,
    order: usize,
    skip: usize,
) -> Result<Mask, FilterError> {
    let x = finite_difference_axis(factory, Axis::X, order, skip, DiffFlags::default())?;
    let y = finite_difference_axis(factory, Axis::Y, order, skip, DiffFlags::default())?;
    let z = finite_difference_axis(factory, Axis::Z, order, skip, DiffFlags::default())?;
    Ok(x.compose(y).compose(z))
}

/// `(2·skip)^order`, the factor relating raw results to true derivatives.
#[inline]
pub fn denominator(order: usize, skip: usize) -> i64 {
    (2 * skip.max(1) as i64).pow(order as u32)
}

/// Execute the iterated difference against a mask's bindings.
pub(crate) fn run_diff_axis(
    io: &mut PassIo,
    axis: Axis,
    order: usize,
    skip: usize,
    flags: DiffFlags,
) {
    if order == 0 {
        return;
    }
    let skip = skip.max(1);
    let den = denominator(order, skip);
    for iteration in 0..order {
        let finals = (iteration == order - 1).then_some((flags, den));
        diff_iteration(io, axis, skip, iteration == 0, finals);
    }
}

/// One centered-difference sweep per sub-lattice of the skipping step.
///
/// Two one-slice scratch arrays hold the original samples one and two
/// sub-lattice steps behind the read cursor, which keeps the sweep safe for
/// in-place bindings: every write lands at least one step behind the reads.
fn diff_iteration(
    io: &mut PassIo,
    axis: Axis,
    skip: usize,
    from_input: bool,
    finals: Option<(DiffFlags, i64)>,
) {
    let extents = if from_input {
        io.input_extents()
    } else {
        io.output_extents()
    };
    let (n, (pu, pv)) = axis.split_extents(extents);
    if n == 0 || pu == 0 || pv == 0 {
        return;
    }
    let plane = pu * pv;
    let mut prev_prev = vec![0i64; plane];
    let mut prev = vec![0i64; plane];

    for r in 0..skip.min(n) {
        let count = (n - 1 - r) / skip + 1;
        for k in 0..count {
            let p = r + k * skip;
            for u in 0..pu {
                for v in 0..pv {
                    let idx = u * pv + v;
                    let (x, y, z) = axis.assemble(p, u, v);
                    let cur = if from_input {
                        io.read_input(x, y, z)
                    } else {
                        io.read_output(x, y, z)
                    };
                    if k >= 2 {
                        let (cx, cy, cz) = axis.assemble(p - skip, u, v);
                        emit(io, cx, cy, cz, cur - prev_prev[idx], from_input, finals);
                    }
                    prev_prev[idx] = prev[idx];
                    prev[idx] = cur;
                }
            }
        }
        // The first and last positions of each line have no centered stencil.
        boundary(io, axis, r, pu, pv, from_input, finals);
        if count >= 2 {
            boundary(io, axis, r + (count - 1) * skip, pu, pv, from_input, finals);
        }
    }
}

fn boundary(
    io: &mut PassIo,
    axis: Axis,
    p: usize,
    pu: usize,
    pv: usize,
    from_input: bool,
    finals: Option<(DiffFlags, i64)>,
) {
    if matches!(finals, Some((flags, _)) if flags.add_to_output) {
        return;
    }
    for u in 0..pu {
        for v in 0..pv {
            let (x, y, z) = axis.assemble(p, u, v);
            emit(io, x, y, z, 0, from_input, finals);
        }
    }
}

#[inline]
fn emit(
    io: &mut PassIo,
    x: usize,
    y: usize,
    z: usize,
    d: i64,
    from_input: bool,
    finals: Option<(DiffFlags, i64)>,
) {
    let Some((flags, den)) = finals else {
        if from_input {
            io.write_shifted(x, y, z, d);
        } else {
            io.write_output(x, y, z, d);
        }
        return;
    };
    let mut d = d;
    if flags.absolute {
        d = d.abs();
    }
    if flags.squared {
        d = d * d / den;
    }
    if flags.add_to_output {
        if flags.scale_denominator != 1 {
            d /= flags.scale_denominator;
        }
        io.add_shifted(x, y, z, d);
    } else if from_input {
        io.write_shifted(x, y, z, d);
    } else {
        io.write_output(x, y, z, d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{Embedding, SignPolicy};
    use crate::mask::Bindings;
    use crate::voxel::{BitDepth, VoxelStack};
    use nalgebra::Vector3;

    fn run_line(values: &[i64], order: usize, skip: usize, flags: DiffFlags) -> Vec<i64> {
        let w = values.len();
        let mut input = Embedding::new(
            VoxelStack::empty(w, 1, 1, BitDepth::Sixteen),
            SignPolicy::Signed,
        );
        for (x, v) in values.iter().enumerate() {
            input.set_logical(x, 0, 0, *v);
        }
        let mut output = Embedding::empty(w, 1, 1, BitDepth::Sixteen, SignPolicy::Signed);
        output.clear();
        let mut b = Bindings::Split { input, output };
        {
            let mut io = PassIo::new(&mut b, Vector3::zeros());
            run_diff_axis(&mut io, Axis::X, order, skip, flags);
        }
        (0..w).map(|x| b.output().logical(x, 0, 0)).collect()
    }

    #[test]
    fn impulse_gives_antisymmetric_neighbors() {
        let mut values = [0i64; 9];
        values[4] = 255;
        let out = run_line(&values, 1, 1, DiffFlags::default());
        assert_eq!(out[3], 255);
        assert_eq!(out[5], -255);
        for (x, v) in out.iter().enumerate() {
            if x != 3 && x != 5 {
                assert_eq!(*v, 0, "unexpected value at x={x}");
            }
        }
    }

    #[test]
    fn ramp_raw_slope_is_two_s_per_step() {
        let values: Vec<i64> = (0..10).map(|x| 5 * x).collect();
        let out = run_line(&values, 1, 2, DiffFlags::default());
        // interior: in(p+2) - in(p-2) = 20 = slope * (2*skip)
        for (x, v) in out.iter().enumerate() {
            if (2..8).contains(&x) {
                assert_eq!(*v, 20, "x={x}");
            } else {
                assert_eq!(*v, 0, "boundary x={x}");
            }
        }
    }

    #[test]
    fn second_order_iterates_the_stencil() {
        let mut values = [0i64; 9];
        values[4] = 64;
        let out = run_line(&values, 2, 1, DiffFlags::default());
        assert_eq!(out[2], 64);
        assert_eq!(out[4], -128);
        assert_eq!(out[6], 64);
        assert_eq!(denominator(2, 1), 4);
    }

    #[test]
    fn squared_divides_by_denominator_immediately() {
        let mut values = [0i64; 7];
        values[3] = 100;
        let flags = DiffFlags {
            squared: true,
            ..DiffFlags::default()
        };
        let out = run_line(&values, 1, 1, flags);
        // (±100)² / 2 at both neighbors
        assert_eq!(out[2], 5000);
        assert_eq!(out[4], 5000);
    }

    #[test]
    fn accumulate_adds_onto_existing_output() {
        let mut values = [0i64; 7];
        values[3] = 40;
        let flags = DiffFlags {
            add_to_output: true,
            scale_denominator: 2,
            ..DiffFlags::default()
        };
        let w = values.len();
        let mut input = Embedding::new(
            VoxelStack::empty(w, 1, 1, BitDepth::Sixteen),
            SignPolicy::Signed,
        );
        for (x, v) in values.iter().enumerate() {
            input.set_logical(x, 0, 0, *v);
        }
        let mut output = Embedding::empty(w, 1, 1, BitDepth::Sixteen, SignPolicy::Signed);
        output.clear();
        output.set_logical(2, 0, 0, 7);
        let mut b = Bindings::Split { input, output };
        {
            let mut io = PassIo::new(&mut b, Vector3::zeros());
            run_diff_axis(&mut io, Axis::X, 1, 1, flags);
        }
        // 7 + 40/2 at x=2; boundary x=0 left untouched at logical zero
        assert_eq!(b.output().logical(2, 0, 0), 27);
        assert_eq!(b.output().logical(0, 0, 0), 0);
        assert_eq!(b.output().logical(4, 0, 0), -20);
    }

    #[test]
    fn denominator_follows_order_and_skip() {
        assert_eq!(denominator(1, 1), 2);
        assert_eq!(denominator(3, 1), 8);
        assert_eq!(denominator(2, 3), 36);
    }
}
