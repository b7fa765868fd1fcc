mod common;

use common::synthetic_volume::{centered_impulse, uniform, x_ramp};
use voxel_filter::{
    binomial_blur, finite_difference_axis, gradient_norm, Axis, BitDepth, BorderFill, DiffFlags,
    NormalizationPolicy, OperatorFactory, VoxelAccess, VoxelStack,
};

#[test]
fn blurring_an_empty_volume_stays_empty() {
    let mut factory = OperatorFactory::new(uniform(10, BitDepth::Eight, 0));
    let mask = binomial_blur(&mut factory, 3, 1);
    let result = mask.into_convolved(NormalizationPolicy::Gray8QuantitativeClamp);

    assert_eq!(result.extents(), (10, 10, 10));
    for z in 0..10 {
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(result.get_voxel(x, y, z), 0, "nonzero voxel at ({x},{y},{z})");
            }
        }
    }
}

#[test]
fn impulse_derivative_is_antisymmetric() {
    let mut factory = OperatorFactory::new(centered_impulse(9, BitDepth::Eight, 255));
    factory.embed_input(true, BitDepth::Sixteen);
    factory.embed_output(true, BitDepth::Sixteen);

    let mask = finite_difference_axis(&mut factory, Axis::X, 1, 1, DiffFlags::default())
        .expect("order-1 overwrite diff is always supported")
        .apply();
    assert_eq!(mask.denominator(), 2);

    let out = mask.output();
    for z in 0..9 {
        for y in 0..9 {
            for x in 0..9 {
                let expected = match (x, y, z) {
                    (3, 4, 4) => 255,
                    (5, 4, 4) => -255,
                    _ => 0,
                };
                assert_eq!(
                    out.logical(x, y, z),
                    expected,
                    "unexpected derivative at ({x},{y},{z})"
                );
            }
        }
    }
}

#[test]
fn gradient_norm_of_a_flat_volume_is_zero() {
    let mut factory = OperatorFactory::new(uniform(7, BitDepth::Eight, 90));
    factory.embed_input(true, BitDepth::Sixteen);
    factory.embed_output(false, BitDepth::Sixteen);

    let mask = gradient_norm(&mut factory, 1, 2);
    let result = mask.into_convolved(NormalizationPolicy::Gray16Quantitative);

    for z in 0..7 {
        for y in 0..7 {
            for x in 0..7 {
                assert_eq!(
                    result.get_voxel(x, y, z),
                    0,
                    "flat volume produced a gradient at ({x},{y},{z})"
                );
            }
        }
    }
}

#[test]
fn gradient_norm_recovers_the_ramp_slope() {
    let slope = 4i64;
    let mut factory = OperatorFactory::new(x_ramp(7, BitDepth::Eight, 100, slope));
    factory.embed_input(true, BitDepth::Sixteen);
    factory.embed_output(false, BitDepth::Sixteen);

    let mask = gradient_norm(&mut factory, 1, 2).apply();
    let out = mask.output();

    // The centered stencil does not fit at the x faces; those voxels keep the
    // cleared zero. Everywhere else the magnitude is the exact slope.
    for z in 0..7 {
        for y in 0..7 {
            for x in 1..6 {
                assert_eq!(out.logical(x, y, z), slope, "slope lost at ({x},{y},{z})");
            }
            assert_eq!(out.logical(0, y, z), 0);
            assert_eq!(out.logical(6, y, z), 0);
        }
    }
}

#[test]
fn composition_grouping_does_not_change_the_result() {
    let build = |group_left: bool| {
        let mut factory = OperatorFactory::new(centered_impulse(9, BitDepth::Eight, 200));
        factory.embed_input(true, BitDepth::Sixteen);
        factory.embed_output(true, BitDepth::Sixteen);
        let x = finite_difference_axis(&mut factory, Axis::X, 1, 1, DiffFlags::default())
            .expect("order-1 diff");
        let y = finite_difference_axis(&mut factory, Axis::Y, 1, 1, DiffFlags::default())
            .expect("order-1 diff");
        let z = finite_difference_axis(&mut factory, Axis::Z, 1, 1, DiffFlags::default())
            .expect("order-1 diff");
        let mask = if group_left {
            x.compose(y).compose(z)
        } else {
            x.compose(y.compose(z))
        };
        assert_eq!(mask.denominator(), 8);
        mask.into_convolved(NormalizationPolicy::NoNormalization)
    };

    let left = build(true);
    let right = build(false);
    assert_eq!(left.extents(), right.extents());
    for z in 0..9 {
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(
                    left.get_voxel(x, y, z),
                    right.get_voxel(x, y, z),
                    "groupings disagree at ({x},{y},{z})"
                );
            }
        }
    }
}

#[test]
fn guard_keeps_data_flowing_into_a_heavier_downstream_mask() {
    let impulse = || {
        let mut stack = VoxelStack::empty(31, 3, 3, BitDepth::Eight);
        stack.set_voxel(15, 1, 1, 255);
        stack
    };
    let diff7 = |factory: &mut OperatorFactory| {
        finite_difference_axis(factory, Axis::X, 7, 1, DiffFlags::default())
            .expect("overwrite diff of any order is supported")
    };

    // Denominator product 1 * 128 exceeds the guard with the downstream side
    // heavier; the pipeline must still carry the impulse through.
    let mut chained = OperatorFactory::new(impulse());
    chained.embed_input(true, BitDepth::Sixteen);
    chained.embed_output(true, BitDepth::Sixteen);
    let head = chained.identity_mask();
    let tail = diff7(&mut chained);
    let composed = head
        .compose(tail)
        .into_convolved(NormalizationPolicy::Gray16Quantitative);

    let mut direct_factory = OperatorFactory::new(impulse());
    direct_factory.embed_input(true, BitDepth::Sixteen);
    direct_factory.embed_output(true, BitDepth::Sixteen);
    let direct =
        diff7(&mut direct_factory).into_convolved(NormalizationPolicy::Gray16Quantitative);

    assert_ne!(
        composed.get_voxel(14, 1, 1),
        composed.get_voxel(0, 1, 1),
        "composed pipeline lost the impulse"
    );
    for z in 0..3 {
        for y in 0..3 {
            for x in 0..31 {
                assert_eq!(
                    composed.get_voxel(x, y, z),
                    direct.get_voxel(x, y, z),
                    "composed and direct results disagree at ({x},{y},{z})"
                );
            }
        }
    }
}

#[test]
fn overflow_guard_preserves_quantitative_values() {
    // Order-4 blur accumulates a denominator of 8 per axis; composing the
    // third axis would push the product to 512, so the first two passes get
    // materialized early. A uniform volume must come out unchanged either way.
    let mut factory = OperatorFactory::new(uniform(8, BitDepth::Eight, 30));
    factory.embed_input(false, BitDepth::Sixteen);
    factory.embed_output(false, BitDepth::Sixteen);

    let mask = binomial_blur(&mut factory, 4, 1);
    assert!(mask.denominator() <= 125);
    let result = mask.into_convolved(NormalizationPolicy::Gray8QuantitativeClamp);

    for z in 0..8 {
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(
                    result.get_voxel(x, y, z),
                    30,
                    "uniform value drifted at ({x},{y},{z})"
                );
            }
        }
    }
}

#[test]
fn enlarged_margin_crops_back_to_the_original_extents() {
    let mut factory = OperatorFactory::new(centered_impulse(5, BitDepth::Eight, 64));
    factory.embed_input(false, BitDepth::Sixteen);
    factory.embed_output(false, BitDepth::Sixteen);
    factory.enlarge_input(2, 2, 2, BorderFill::Constant(0));

    let mask = binomial_blur(&mut factory, 3, 1);
    let result = mask.into_convolved(NormalizationPolicy::Gray16Quantitative);

    assert_eq!(result.extents(), (5, 5, 5));
    // Separable 1-2-1 response: the centre keeps (2/4)^3 of the impulse and a
    // face neighbour (1/4)(2/4)^2.
    assert_eq!(result.get_voxel(2, 2, 2), 8);
    assert_eq!(result.get_voxel(3, 2, 2), 4);
    assert_eq!(result.get_voxel(2, 1, 2), 4);
}
