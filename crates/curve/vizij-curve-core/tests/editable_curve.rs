use approx::assert_abs_diff_eq;
use vizij_curve_core::{
    CurveSettings, EditableCurve, Extrapolation, InterpMode, Keyframe, TangentMode,
    TangentWeightMode,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn tent() -> EditableCurve {
    EditableCurve::from_keys(vec![
        Keyframe::new(0.0, 0.0).with_interp(InterpMode::Linear),
        Keyframe::new(1.0, 10.0).with_interp(InterpMode::Linear),
        Keyframe::new(2.0, 0.0).with_interp(InterpMode::Linear),
    ])
}

fn is_sorted(curve: &EditableCurve) -> bool {
    curve.keys().windows(2).all(|w| w[0].time <= w[1].time)
}

#[test]
fn linear_tent_evaluates_between_keys() {
    let curve = tent();
    assert_abs_diff_eq!(curve.eval(0.5, 0.0), 5.0, epsilon = 1e-5);
    assert_abs_diff_eq!(curve.eval(1.5, 0.0), 5.0, epsilon = 1e-5);
}

#[test]
fn key_times_reproduce_key_values_in_every_mode() {
    for mode in [InterpMode::Constant, InterpMode::Linear, InterpMode::Cubic] {
        let keys = vec![
            Keyframe::new(0.0, 1.0).with_interp(mode),
            Keyframe::new(0.7, -2.0).with_interp(mode),
            Keyframe::new(1.3, 4.5).with_interp(mode),
            Keyframe::new(3.0, 0.25).with_interp(mode),
        ];
        let curve = EditableCurve::from_keys(keys.clone());
        for key in &keys {
            approx(curve.eval(key.time, 0.0), key.value, 1e-5);
        }
    }
}

#[test]
fn constant_mode_holds_until_next_key() {
    let curve = EditableCurve::from_keys(vec![
        Keyframe::new(0.0, 1.0).with_interp(InterpMode::Constant),
        Keyframe::new(1.0, 5.0).with_interp(InterpMode::Constant),
    ]);
    approx(curve.eval(0.999, 0.0), 1.0, 0.0);
    approx(curve.eval(1.0, 0.0), 5.0, 0.0);
}

#[test]
fn cubic_user_tangents_shape_the_segment() {
    let mut curve = EditableCurve::new();
    let a = curve.add_key(0.0, 0.0, false, None);
    let b = curve.add_key(3.0, 3.0, false, None);
    // Auto boundary tangents are flat: an ease curve through the midpoint.
    approx(curve.eval(1.5, 0.0), 1.5, 1e-5);
    assert!(curve.eval(0.5, 0.0) < 0.5);

    curve.set_key_tangents(a, 1.0, 1.0);
    curve.set_key_tangents(b, 1.0, 1.0);
    assert_eq!(curve.key_tangent_mode(a), Some(TangentMode::User));
    approx(curve.eval(0.5, 0.0), 0.5, 1e-5);

    // Further edits no longer overwrite authored tangents.
    curve.add_key(4.0, 0.0, false, None);
    approx(curve.key(b).unwrap().arrive_tangent, 1.0, 0.0);
}

#[test]
fn sort_invariant_survives_mixed_edits() {
    let mut curve = EditableCurve::new();
    let mut handles = Vec::new();
    for (i, t) in [5.0f32, 1.0, 3.0, 3.0, 0.0, 8.0, 2.5].iter().enumerate() {
        handles.push(curve.add_key(*t, i as f32, false, None));
        assert!(is_sorted(&curve));
    }
    curve.delete_key(handles[2]);
    curve.delete_key(handles[0]);
    assert!(is_sorted(&curve));
    curve.set_key_time(handles[5], -1.0);
    assert!(is_sorted(&curve));
    assert_eq!(curve.first_key(), Some(handles[5]));
    assert_eq!(curve.num_keys(), 5);
}

#[test]
fn update_or_add_key_reuses_keys_within_tolerance() {
    let mut curve = tent();
    let existing = curve.key_handle(1).unwrap();
    let h = curve.update_or_add_key(1.00005, 7.0, 1e-4);
    assert_eq!(h, existing);
    assert_eq!(curve.num_keys(), 3);
    assert_eq!(curve.key_value(h), Some(7.0));

    let fresh = curve.update_or_add_key(1.5, 2.0, 1e-4);
    assert_ne!(fresh, existing);
    assert_eq!(curve.key_index(fresh), Some(2));
    assert!(curve.key_exists_at_time(1.5, 1e-4));
    assert_eq!(curve.find_key(1.5, 1e-4), Some(fresh));
    assert_eq!(curve.find_key(1.6, 1e-4), None);
}

#[test]
fn set_keys_assigns_fresh_handles_by_position() {
    let mut curve = tent();
    let before: Vec<_> = curve.key_handles().collect();
    curve.set_keys(vec![Keyframe::new(0.0, 1.0), Keyframe::new(1.0, 2.0)]);
    let after: Vec<_> = curve.key_handles().collect();
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|h| !before.contains(h)));
    assert!(before.iter().all(|h| !curve.is_key_handle_valid(*h)));
}

#[test]
fn value_writes_can_skip_tangent_updates() {
    let mut curve = EditableCurve::new();
    curve.add_key(0.0, 0.0, false, None);
    let mid = curve.add_key(1.0, 0.0, false, None);
    let last = curve.add_key(2.0, 0.0, false, None);

    curve.set_key_value(last, 2.0, false);
    approx(curve.key(mid).unwrap().leave_tangent, 0.0, 0.0);
    curve.set_key_value(last, 2.0, true);
    approx(curve.key(mid).unwrap().leave_tangent, 1.0, 1e-6);
}

#[test]
fn tension_scales_auto_tangents() {
    let mut curve = EditableCurve::with_settings(CurveSettings {
        auto_tangent_tension: 0.5,
        ..CurveSettings::default()
    });
    curve.add_key(0.0, 0.0, false, None);
    let mid = curve.add_key(1.0, 1.0, false, None);
    curve.add_key(2.0, 2.0, false, None);
    approx(curve.key(mid).unwrap().arrive_tangent, 0.5, 1e-6);
    curve.auto_set_tangents(0.0);
    approx(curve.key(mid).unwrap().arrive_tangent, 1.0, 1e-6);
}

#[test]
fn weights_are_stored_but_do_not_change_evaluation() {
    let mut curve = EditableCurve::new();
    let a = curve.add_key(0.0, 0.0, false, None);
    curve.add_key(1.0, 1.0, false, None);
    let before = curve.eval(0.3, 0.0);
    curve.set_key_tangent_weight_mode(a, TangentWeightMode::Both);
    curve.set_key_tangent_weights(a, 0.2, 0.8);
    assert_eq!(curve.key_tangent_weight_mode(a), Some(TangentWeightMode::Both));
    approx(curve.key(a).unwrap().leave_tangent_weight, 0.8, 0.0);
    approx(curve.eval(0.3, 0.0), before, 0.0);
}

#[test]
fn ranges_shift_and_scale() {
    let mut curve = tent();
    assert_eq!(curve.time_range(), Some((0.0, 2.0)));
    assert_eq!(curve.value_range(), Some((0.0, 10.0)));

    curve.shift_curve(1.0);
    assert_eq!(curve.time_range(), Some((1.0, 3.0)));
    approx(curve.eval(1.5, 0.0), 5.0, 1e-5);

    curve.scale_curve(1.0, 2.0);
    assert_eq!(curve.time_range(), Some((1.0, 5.0)));
    approx(curve.eval(2.0, 0.0), 5.0, 1e-5);

    curve.scale_curve(1.0, -1.0);
    assert_eq!(curve.time_range(), Some((1.0, 5.0)));

    curve.reset();
    assert_eq!(curve.time_range(), None);
    assert_eq!(curve.value_range(), None);
}

#[test]
fn default_value_override_wins_for_keyless_curves() {
    let mut curve = EditableCurve::new();
    approx(curve.eval(3.0, 1.5), 1.5, 0.0);
    curve.set_default_value(-2.0);
    approx(curve.eval(3.0, 1.5), -2.0, 0.0);
    curve.clear_default_value();
    approx(curve.eval(3.0, 1.5), 1.5, 0.0);

    curve.add_key(0.0, 4.0, false, None);
    curve.set_default_value(-2.0);
    approx(curve.eval(3.0, 1.5), 4.0, 0.0);
}

#[test]
fn redundant_removal_stays_within_tolerance() {
    let keys = (0..=40)
        .map(|i| {
            let t = i as f32 * 0.05;
            Keyframe::new(t, t * t).with_interp(InterpMode::Linear)
        })
        .collect();
    let original = EditableCurve::from_keys(keys);
    let mut reduced = original.clone();
    let tol = 0.01;
    reduced.remove_redundant_keys(tol, None);

    assert!(reduced.num_keys() < original.num_keys());
    assert_eq!(reduced.keys().first(), original.keys().first());
    assert_eq!(reduced.keys().last(), original.keys().last());
    for key in original.keys() {
        let diff = (reduced.eval(key.time, 0.0) - key.value).abs();
        assert!(diff <= tol + 1e-6, "t={} diff={diff}", key.time);
    }
}

#[test]
fn baking_keeps_shape_at_sample_points() {
    let mut curve = EditableCurve::new();
    curve.add_key(0.0, 0.0, false, None);
    curve.add_key(1.0, 2.0, false, None);
    curve.add_key(2.0, 0.0, false, None);
    let expected: Vec<f32> = (1..8).map(|i| curve.eval(i as f32 * 0.25, 0.0)).collect();

    curve.bake_curve(0.25, None);
    assert_eq!(curve.num_keys(), 9);
    for (i, value) in expected.iter().enumerate() {
        let time = (i + 1) as f32 * 0.25;
        let h = curve.find_key(time, 1e-4).expect("baked key");
        approx(curve.key_value(h).unwrap(), *value, 1e-6);
    }
}

#[test]
fn extrapolation_is_public_state() {
    let mut curve = tent();
    curve.pre_infinity_extrap = Extrapolation::Linear;
    assert_eq!(curve.extrapolation().pre, Extrapolation::Linear);
    assert_eq!(curve.extrapolation().post, Extrapolation::Constant);
}

#[test]
fn unwound_keys_accept_huge_and_infinite_values() {
    let mut curve = EditableCurve::new();
    curve.add_key(0.0, 0.0, true, None);
    let huge = curve.add_key(1.0, 1.0e10, true, None);
    let wound = curve.key_value(huge).unwrap();
    assert!(wound.abs() <= 180.0, "got {wound}");

    let inf = curve.add_key(2.0, f32::INFINITY, true, None);
    assert_eq!(curve.key_value(inf), Some(f32::INFINITY));
    assert_eq!(curve.num_keys(), 3);
}
