use std::sync::Arc;

use approx::assert_abs_diff_eq;
use vizij_curve_core::{
    static_eval, CompressedCurve, CompressionFormat, CompressionSettings, EditableCurve,
    Extrapolation, InfinityExtrap, InterpMode, KeyTimeFormat, Keyframe, NumKeysOrConstant,
    UNSET_DEFAULT_VALUE,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn sine(num_keys: usize, mode: InterpMode) -> EditableCurve {
    EditableCurve::from_keys(
        (0..num_keys)
            .map(|i| {
                let t = i as f32 * 0.1;
                Keyframe::new(t, (t * 3.0).sin()).with_interp(mode)
            })
            .collect(),
    )
}

/// 16 linear keys on whole seconds; their times quantize exactly.
fn square_wave() -> EditableCurve {
    EditableCurve::from_keys(
        (0..16)
            .map(|i| Keyframe::new(i as f32, (i % 2) as f32).with_interp(InterpMode::Linear))
            .collect(),
    )
}

#[test]
fn identical_values_compress_to_constant() {
    let curve = EditableCurve::from_keys(
        (0..5)
            .map(|i| Keyframe::new(i as f32, 7.0).with_interp(InterpMode::Linear))
            .collect(),
    );
    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(compressed.compression_format(), CompressionFormat::Constant);
    assert_eq!(compressed.header(), NumKeysOrConstant::ConstantValue(7.0));
    assert_eq!(compressed.compressed_size(), 0);
    for t in [-5.0f32, 0.0, 2.5, 4.0, 100.0] {
        assert_eq!(compressed.eval(t, 0.0), 7.0);
    }
}

#[test]
fn keyless_curve_compresses_to_empty() {
    let mut curve = EditableCurve::new();
    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(compressed.compression_format(), CompressionFormat::Empty);
    assert_eq!(compressed.eval(1.0, 3.5), 3.5);

    curve.set_default_value(-1.0);
    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(compressed.header(), NumKeysOrConstant::ConstantValue(-1.0));
    assert_eq!(compressed.eval(1.0, 3.5), -1.0);
}

#[test]
fn reserved_default_value_agrees_across_forms() {
    let mut curve = EditableCurve::new();
    curve.set_default_value(-1.0);
    curve.set_default_value(UNSET_DEFAULT_VALUE);
    assert_eq!(curve.default_value(), None);

    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(curve.eval(0.5, 1.0), 1.0);
    assert_eq!(compressed.eval(0.5, 1.0), curve.eval(0.5, 1.0));

    let loaded: EditableCurve =
        serde_json::from_str(&format!(r#"{{ "default_value": {:e} }}"#, f32::MAX)).unwrap();
    assert_eq!(loaded.default_value(), None);
}

#[test]
fn homogeneous_modes_select_their_format() {
    let settings = CompressionSettings::default();
    let linear = sine(10, InterpMode::Linear).compress(&settings);
    assert_eq!(linear.compression_format(), CompressionFormat::Linear);
    let cubic = sine(10, InterpMode::Cubic).compress(&settings);
    assert_eq!(cubic.compression_format(), CompressionFormat::Cubic);
    assert_eq!(cubic.num_keys(), 10);

    let stepped = sine(10, InterpMode::Constant).compress(&settings);
    assert_eq!(stepped.compression_format(), CompressionFormat::Mixed);
}

#[test]
fn round_trip_reproduces_key_values_within_threshold() {
    let settings = CompressionSettings::default();
    for mode in [InterpMode::Linear, InterpMode::Cubic] {
        let curve = sine(50, mode);
        let compressed = curve.compress(&settings);
        for key in curve.keys() {
            approx(
                compressed.eval(key.time, 0.0),
                key.value,
                settings.error_threshold + 1e-6,
            );
        }
    }
}

#[test]
fn mixed_curves_evaluate_like_their_source() {
    let modes = [InterpMode::Cubic, InterpMode::Linear, InterpMode::Constant];
    let mut keys: Vec<Keyframe> = (0..12)
        .map(|i| Keyframe::new(i as f32 * 0.4, ((i * 7) % 5) as f32).with_interp(modes[i % 3]))
        .collect();
    keys[4] = keys[4].with_tangents(2.0, -1.0);
    let mut curve = EditableCurve::from_keys(keys);
    curve.set_extrapolation(InfinityExtrap::new(
        Extrapolation::Oscillate,
        Extrapolation::CycleWithOffset,
    ));

    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(compressed.compression_format(), CompressionFormat::Mixed);
    for i in -50..150 {
        let t = i as f32 * 0.037;
        assert_abs_diff_eq!(compressed.eval(t, 0.0), curve.eval(t, 0.0), epsilon = 1e-3);
    }
}

#[test]
fn exact_grid_times_use_quantized_storage() {
    let curve = square_wave();
    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(compressed.compression_format(), CompressionFormat::Linear);
    assert_eq!(compressed.key_time_format(), KeyTimeFormat::Quantized16);
    // 16 u16 times + {min, delta} + 16 f32 values.
    assert_eq!(compressed.compressed_size(), 32 + 8 + 64);
    for i in 0..60 {
        let t = i as f32 * 0.25;
        approx(compressed.eval(t, 0.0), curve.eval(t, 0.0), 1e-4);
    }
}

#[test]
fn few_keys_keep_float_times() {
    let curve = sine(3, InterpMode::Linear);
    let compressed = curve.compress(&CompressionSettings::default());
    assert_eq!(compressed.key_time_format(), KeyTimeFormat::Float32);
}

#[test]
fn lossy_quantization_falls_back_to_float_times() {
    let curve = EditableCurve::from_keys(
        (0..16)
            .map(|i| {
                let t = i as f32 * 0.37 + 0.013 * (i % 3) as f32;
                Keyframe::new(t, ((i % 2) * 100) as f32).with_interp(InterpMode::Linear)
            })
            .collect(),
    );
    let compressed = curve.compress(&CompressionSettings {
        error_threshold: 1e-6,
        ..CompressionSettings::default()
    });
    assert_eq!(compressed.key_time_format(), KeyTimeFormat::Float32);
    for key in curve.keys() {
        assert_eq!(compressed.eval(key.time, 0.0), key.value);
    }
}

#[test]
fn static_eval_matches_wrapper() {
    let curve = sine(20, InterpMode::Cubic);
    let compressed = curve.compress(&CompressionSettings::default());
    for i in 0..40 {
        let t = i as f32 * 0.05;
        let raw = static_eval(
            compressed.compression_format(),
            compressed.key_time_format(),
            compressed.extrapolation(),
            compressed.header(),
            compressed.buffer(),
            t,
            0.0,
        );
        assert_eq!(raw, compressed.eval(t, 0.0));
    }
}

#[test]
fn compressed_curves_are_shared_across_threads() {
    let curve = sine(30, InterpMode::Cubic);
    let compressed = Arc::new(curve.compress(&CompressionSettings::default()));
    let expected: Vec<f32> = (0..32).map(|i| compressed.eval(i as f32 * 0.1, 0.0)).collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let compressed = Arc::clone(&compressed);
            let expected = &expected;
            scope.spawn(move || {
                for (i, value) in expected.iter().enumerate() {
                    assert_eq!(compressed.eval(i as f32 * 0.1, 0.0), *value);
                }
            });
        }
    });
}

#[test]
fn compress_entry_points_agree() {
    let curve = square_wave();
    let settings = CompressionSettings::default();
    assert_eq!(
        curve.compress(&settings),
        CompressedCurve::compress(&curve, &settings)
    );
}
