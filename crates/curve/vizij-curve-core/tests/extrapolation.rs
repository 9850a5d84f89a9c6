use approx::assert_abs_diff_eq;
use vizij_curve_core::{
    CompressedCurve, CompressionSettings, EditableCurve, Extrapolation, InfinityExtrap,
    InterpMode, Keyframe,
};

fn tent(extrap: InfinityExtrap) -> EditableCurve {
    let mut curve = EditableCurve::from_keys(vec![
        Keyframe::new(0.0, 0.0).with_interp(InterpMode::Linear),
        Keyframe::new(1.0, 10.0).with_interp(InterpMode::Linear),
        Keyframe::new(2.0, 0.0).with_interp(InterpMode::Linear),
    ]);
    curve.set_extrapolation(extrap);
    curve
}

fn ramp(extrap: InfinityExtrap) -> EditableCurve {
    let mut curve = EditableCurve::from_keys(vec![
        Keyframe::new(0.0, 1.0).with_interp(InterpMode::Linear),
        Keyframe::new(2.0, 5.0).with_interp(InterpMode::Linear),
    ]);
    curve.set_extrapolation(extrap);
    curve
}

#[test]
fn constant_pre_extrapolation_holds_first_value() {
    let curve = tent(InfinityExtrap::both(Extrapolation::Constant));
    for t in [-1.0f32, -10.0, -0.001, -1e6] {
        assert_eq!(curve.eval(t, 99.0), 0.0);
    }
    assert_eq!(curve.eval(3.0, 99.0), 0.0);
}

#[test]
fn linear_pre_extrapolation_follows_first_slope() {
    let curve = tent(InfinityExtrap::new(
        Extrapolation::Linear,
        Extrapolation::Linear,
    ));
    assert_abs_diff_eq!(curve.eval(-1.0, 0.0), -10.0, epsilon = 1e-5);
    // Last segment falls at -10/s.
    assert_abs_diff_eq!(curve.eval(2.5, 0.0), -5.0, epsilon = 1e-5);
}

#[test]
fn linear_extrapolation_of_coincident_boundary_keys_holds() {
    let mut curve = EditableCurve::from_keys(vec![
        Keyframe::new(1.0, 3.0).with_interp(InterpMode::Linear),
        Keyframe::new(1.0, 7.0).with_interp(InterpMode::Linear),
    ]);
    curve.set_extrapolation(InfinityExtrap::both(Extrapolation::Linear));
    assert_eq!(curve.eval(0.0, 0.0), 3.0);
    assert_eq!(curve.eval(2.0, 0.0), 7.0);
}

#[test]
fn single_key_is_flat_everywhere() {
    for mode in [InterpMode::Constant, InterpMode::Linear, InterpMode::Cubic] {
        let mut curve = EditableCurve::from_keys(vec![Keyframe::new(5.0, 42.0).with_interp(mode)]);
        curve.set_extrapolation(InfinityExtrap::both(Extrapolation::Constant));
        for t in [-100.0f32, 0.0, 5.0, 5.5, 1e4] {
            assert_eq!(curve.eval(t, 0.0), 42.0);
        }
    }
}

#[test]
fn cycle_repeats_whole_periods() {
    let curve = ramp(InfinityExtrap::both(Extrapolation::Cycle));
    let first = curve.eval(0.0, 0.0);
    for k in 1..5 {
        let t = 2.0 + 2.0 * k as f32;
        assert_abs_diff_eq!(curve.eval(t, 0.0), first, epsilon = 1e-5);
    }
    assert_abs_diff_eq!(curve.eval(3.0, 0.0), 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(-1.0, 0.0), 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(-3.5, 0.0), 2.0, epsilon = 1e-5);
}

#[test]
fn cycle_with_offset_accumulates_boundary_delta() {
    let curve = ramp(InfinityExtrap::both(Extrapolation::CycleWithOffset));
    // One period later the ramp has climbed by last - first = 4.
    assert_abs_diff_eq!(curve.eval(3.0, 0.0), 7.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(5.0, 0.0), 11.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(-1.0, 0.0), -1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(-3.0, 0.0), -5.0, epsilon = 1e-5);
}

#[test]
fn oscillate_ping_pongs() {
    let curve = ramp(InfinityExtrap::both(Extrapolation::Oscillate));
    assert_abs_diff_eq!(curve.eval(2.5, 0.0), 4.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(4.5, 0.0), 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(-0.5, 0.0), 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(-2.5, 0.0), 4.0, epsilon = 1e-5);
}

#[test]
fn compressed_curves_extrapolate_like_editable_ones() {
    let policies = [
        Extrapolation::Constant,
        Extrapolation::Linear,
        Extrapolation::Cycle,
        Extrapolation::CycleWithOffset,
        Extrapolation::Oscillate,
    ];
    let settings = CompressionSettings::default();
    for pre in policies {
        for post in policies {
            let curve = tent(InfinityExtrap::new(pre, post));
            let compressed = CompressedCurve::compress(&curve, &settings);
            for i in -20..=40 {
                let t = i as f32 * 0.25;
                assert_abs_diff_eq!(
                    compressed.eval(t, 0.0),
                    curve.eval(t, 0.0),
                    epsilon = 1e-4
                );
            }
        }
    }
}
