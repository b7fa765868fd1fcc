//! Separable binomial blur: iterated (1,1)-averaging per axis.
//!
//! `order` iterations of pairwise averaging at `skip` voxel spacing
//! approximate a Gaussian; the three axis passes are chained with `compose`,
//! so the overall denominator is the product of the per-axis masses
//! `2^(order−1)`. Sweep direction alternates between iterations to keep the
//! effective stencil centered. Scratch is one 2D slice per pass regardless of
//! stack depth.

use log::debug;
use nalgebra::Vector3;

use crate::axis::Axis;
use crate::factory::OperatorFactory;
use crate::mask::{Kernel, Mask, PassIo};

/// Isotropic binomial blur of the factory's bound image.
pub fn binomial_blur(factory: &mut OperatorFactory, order: usize, skip: usize) -> Mask {
    binomial_blur_aniso(factory, order, Vector3::new(skip, skip, skip))
}

/// Binomial blur with a per-axis skipping step.
pub fn binomial_blur_aniso(
    factory: &mut OperatorFactory,
    order: usize,
    skips: Vector3<usize>,
) -> Mask {
    let denominator = 1i64 << order.saturating_sub(1) as u32;
    debug!("binomial_blur order={order} skips=({},{},{})", skips.x, skips.y, skips.z);
    let x = factory.bound_mask(
        Kernel::BinomialAxis {
            axis: Axis::X,
            order,
            skip: skips.x,
        },
        denominator,
    );
    let y = factory.bound_mask(
        Kernel::BinomialAxis {
            axis: Axis::Y,
            order,
            skip: skips.y,
        },
        denominator,
    );
    let z = factory.bound_mask(
        Kernel::BinomialAxis {
            axis: Axis::Z,
            order,
            skip: skips.z,
        },
        denominator,
    );
    x.compose(y).compose(z)
}

/// Single-axis blur reading and writing the factory's input buffer itself —
/// the deliberate in-place case, constructed explicitly.
pub fn binomial_blur_axis_in_place(
    factory: &mut OperatorFactory,
    axis: Axis,
    order: usize,
    skip: usize,
) -> Mask {
    let denominator = 1i64 << order.saturating_sub(1) as u32;
    factory.bound_in_place(Kernel::BinomialAxis { axis, order, skip }, denominator)
}

/// Blur with a physical skip distance, converted per axis to a voxel count
/// via the voxel edge lengths and clamped to a minimum of 1.
pub fn binomial_blur_calibrated(
    factory: &mut OperatorFactory,
    order: usize,
    physical_step: f64,
    voxel_size: Vector3<f64>,
) -> Mask {
    let skips = Vector3::new(
        voxel_step(physical_step, voxel_size.x),
        voxel_step(physical_step, voxel_size.y),
        voxel_step(physical_step, voxel_size.z),
    );
    binomial_blur_aniso(factory, order, skips)
}

#[inline]
fn voxel_step(physical: f64, edge: f64) -> usize {
    ((physical / edge).floor() as usize).max(1)
}

/// Execute one axis of the blur against a mask's bindings.
///
/// `order == 1` degenerates to an identity: no averaging at all.
pub(crate) fn run_binomial_axis(io: &mut PassIo, axis: Axis, order: usize, skip: usize) {
    if order <= 1 {
        return;
    }
    let skip = skip.max(1);
    for iteration in 0..order - 1 {
        let forward = iteration % 2 == 0;
        average_iteration(io, axis, skip, forward, iteration == 0);
    }
}

/// One pairwise-averaging sweep: `sample = previous + current` along each
/// line, per sub-lattice of the skipping step.
///
/// The first iteration reads the input and writes margin-shifted; later
/// iterations run on the output in place. The line start replicates its first
/// sample so a uniform field stays uniform (times the pass mass of 2).
fn average_iteration(io: &mut PassIo, axis: Axis, skip: usize, forward: bool, from_input: bool) {
    let extents = if from_input {
        io.input_extents()
    } else {
        io.output_extents()
    };
    let (n, (pu, pv)) = axis.split_extents(extents);
    if n == 0 || pu == 0 || pv == 0 {
        return;
    }

    // Latest original value along each line, one 2D slice of scratch.
    let mut latest = vec![0i64; pu * pv];

    for r in 0..skip.min(n) {
        let count = (n - 1 - r) / skip + 1;
        for k in 0..count {
            let step = if forward { k } else { count - 1 - k };
            let p = r + step * skip;
            for u in 0..pu {
                for v in 0..pv {
                    let (x, y, z) = axis.assemble(p, u, v);
                    let cur = if from_input {
                        io.read_input(x, y, z)
                    } else {
                        io.read_output(x, y, z)
                    };
                    let idx = u * pv + v;
                    let prev = if k == 0 { cur } else { latest[idx] };
                    latest[idx] = cur;
                    if from_input {
                        io.write_shifted(x, y, z, prev + cur);
                    } else {
                        io.write_output(x, y, z, prev + cur);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{Embedding, SignPolicy};
    use crate::mask::Bindings;
    use crate::voxel::{BitDepth, VoxelStack};

    fn line_bindings(values: &[u8]) -> Bindings {
        let w = values.len();
        Bindings::Split {
            input: Embedding::new(
                VoxelStack::from_u8(w, 1, 1, values.to_vec()),
                SignPolicy::Unsigned,
            ),
            output: Embedding::empty(w, 1, 1, BitDepth::Eight, SignPolicy::Unsigned),
        }
    }

    fn run_line(values: &[u8], order: usize, skip: usize) -> Vec<i64> {
        let mut b = line_bindings(values);
        {
            let mut io = PassIo::new(&mut b, Vector3::zeros());
            run_binomial_axis(&mut io, Axis::X, order, skip);
        }
        (0..values.len()).map(|x| b.output().logical(x, 0, 0)).collect()
    }

    #[test]
    fn order_one_is_identity() {
        let out = run_line(&[1, 2, 3, 4], 1, 1);
        assert_eq!(out, vec![0, 0, 0, 0], "no pass may run for order 1");
    }

    #[test]
    fn order_three_centers_the_stencil() {
        // forward then backward pass -> (1, 2, 1) kernel, mass 4
        let mut values = [0u8; 9];
        values[4] = 64;
        let out = run_line(&values, 3, 1);
        assert_eq!(out[3], 64);
        assert_eq!(out[4], 128);
        assert_eq!(out[5], 64);
        assert_eq!(out.iter().sum::<i64>(), 4 * 64);
    }

    #[test]
    fn uniform_line_scales_by_mass() {
        let out = run_line(&[10; 6], 4, 1);
        assert_eq!(out, vec![80; 6], "2^(4-1) times the uniform value");
    }

    #[test]
    fn skip_two_averages_across_sublattices() {
        let mut values = [0u8; 8];
        values[4] = 32;
        let out = run_line(&values, 2, 2);
        // single forward pass: out(p) = in(p-2) + in(p)
        assert_eq!(out[4], 32);
        assert_eq!(out[6], 32);
        assert_eq!(out[2], 0);
    }

    #[test]
    fn in_place_axis_blur_matches_split_result() {
        let mut values = [0u8; 9];
        values[4] = 64;
        let stack = VoxelStack::from_u8(9, 1, 1, values.to_vec());
        let mut f = crate::factory::OperatorFactory::new(stack);
        let m = binomial_blur_axis_in_place(&mut f, Axis::X, 3, 1).apply();
        assert_eq!(m.output().logical(3, 0, 0), 64);
        assert_eq!(m.output().logical(4, 0, 0), 128);
        assert_eq!(m.output().logical(5, 0, 0), 64);
        assert_eq!(m.denominator(), 4);
    }

    #[test]
    fn physical_step_clamps_to_one_voxel() {
        assert_eq!(voxel_step(0.5, 2.0), 1);
        assert_eq!(voxel_step(6.0, 2.0), 3);
        assert_eq!(voxel_step(5.9, 2.0), 2);
    }
}
