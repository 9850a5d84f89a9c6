//! Building a [`CompressedCurve`] from an [`EditableCurve`].
//!
//! Format selection looks at the key values and interpolation modes. Key-time
//! quantization is decided empirically: a quantized candidate is packed, evaluated
//! against the editable curve at every key time and at fixed playback steps, and kept
//! only if it is both smaller and within the error threshold.

use log::debug;

use super::adapters::{write_f32, write_u16};
use super::layout::{KeyLayout, QUANTIZED_TIME_MAX};
use super::{
    static_eval, CompressedCurve, CompressionFormat, KeyTimeFormat, NumKeysOrConstant,
    UNSET_DEFAULT_VALUE,
};
use crate::config::CompressionSettings;
use crate::curve::EditableCurve;
use crate::keyframe::{InterpMode, Keyframe};

impl CompressedCurve {
    /// Pack `curve` into the smallest format whose playback stays within `settings.error_threshold`.
    pub fn compress(curve: &EditableCurve, settings: &CompressionSettings) -> Self {
        let keys = curve.keys();
        let extrap = curve.extrapolation();
        let format = select_format(keys, curve.settings().constant_value_tolerance);

        let compressed = match format {
            CompressionFormat::Empty => Self {
                compression_format: format,
                key_time_format: KeyTimeFormat::Float32,
                extrap,
                header: NumKeysOrConstant::ConstantValue(
                    curve.default_value().unwrap_or(UNSET_DEFAULT_VALUE),
                ),
                compressed_keys: Vec::new(),
            },
            CompressionFormat::Constant => Self {
                compression_format: format,
                key_time_format: KeyTimeFormat::Float32,
                extrap,
                header: NumKeysOrConstant::ConstantValue(keys[0].value),
                compressed_keys: Vec::new(),
            },
            CompressionFormat::Linear | CompressionFormat::Cubic | CompressionFormat::Mixed => {
                let key_time_format = select_key_time_format(curve, format, settings);
                Self {
                    compression_format: format,
                    key_time_format,
                    extrap,
                    header: NumKeysOrConstant::NumKeys(keys.len() as i32),
                    compressed_keys: encode_keys(keys, format, key_time_format),
                }
            }
        };

        debug!(
            "compressed {} keys as {:?}/{:?} into {} bytes",
            keys.len(),
            compressed.compression_format,
            compressed.key_time_format,
            compressed.compressed_size()
        );
        compressed
    }
}

/// Pick the key-stream format for `keys`.
///
/// The final key never starts a segment, so its interpolation mode is ignored.
pub(crate) fn select_format(keys: &[Keyframe], constant_tolerance: f32) -> CompressionFormat {
    let Some(first) = keys.first() else {
        return CompressionFormat::Empty;
    };
    if keys
        .iter()
        .all(|key| (key.value - first.value).abs() <= constant_tolerance)
    {
        return CompressionFormat::Constant;
    }

    let segments = &keys[..keys.len() - 1];
    if segments
        .iter()
        .all(|key| key.interp_mode == InterpMode::Linear)
    {
        CompressionFormat::Linear
    } else if segments
        .iter()
        .all(|key| key.interp_mode == InterpMode::Cubic)
    {
        CompressionFormat::Cubic
    } else {
        CompressionFormat::Mixed
    }
}

/// Choose between quantized and float key times for a packed format.
fn select_key_time_format(
    curve: &EditableCurve,
    format: CompressionFormat,
    settings: &CompressionSettings,
) -> KeyTimeFormat {
    let keys = curve.keys();
    let num_keys = keys.len();
    let quantized_size = KeyLayout::new(format, KeyTimeFormat::Quantized16, num_keys).total_size;
    let float_size = KeyLayout::new(format, KeyTimeFormat::Float32, num_keys).total_size;
    if quantized_size >= float_size {
        return KeyTimeFormat::Float32;
    }

    let candidate = encode_keys(keys, format, KeyTimeFormat::Quantized16);
    let header = NumKeysOrConstant::NumKeys(num_keys as i32);
    let extrap = curve.extrapolation();
    let max_error = playback_times(keys, settings.sample_interval)
        .map(|time| {
            let exact = curve.eval(time, 0.0);
            let packed = static_eval(
                format,
                KeyTimeFormat::Quantized16,
                extrap,
                header,
                &candidate,
                time,
                0.0,
            );
            (exact - packed).abs()
        })
        .fold(0.0f32, f32::max);

    debug!(
        "quantized key times: max error {max_error} (threshold {}), {quantized_size} vs {float_size} bytes",
        settings.error_threshold
    );
    if max_error <= settings.error_threshold {
        KeyTimeFormat::Quantized16
    } else {
        KeyTimeFormat::Float32
    }
}

/// Every key time, then fixed steps from the first to the last key.
fn playback_times(keys: &[Keyframe], sample_interval: f32) -> impl Iterator<Item = f32> + '_ {
    let min_time = keys.first().map_or(0.0, |key| key.time);
    let max_time = keys.last().map_or(0.0, |key| key.time);
    let steps = if sample_interval.is_finite() && sample_interval > 0.0 {
        ((max_time - min_time) / sample_interval).floor() as usize + 1
    } else {
        0
    };
    keys.iter().map(|key| key.time).chain(
        (0..steps)
            .map(move |step| min_time + step as f32 * sample_interval)
            .filter(move |time| *time <= max_time),
    )
}

/// Quantize `time` over `[min_time, min_time + delta_time]` to a 16-bit code.
#[inline]
pub(crate) fn quantize_time(time: f32, min_time: f32, delta_time: f32) -> u16 {
    let normalized = if delta_time > 0.0 {
        (time - min_time) / delta_time
    } else {
        0.0
    };
    (normalized * QUANTIZED_TIME_MAX)
        .round()
        .clamp(0.0, QUANTIZED_TIME_MAX) as u16
}

/// Pack `keys` into the layout of `format` and `time_format`.
pub(crate) fn encode_keys(
    keys: &[Keyframe],
    format: CompressionFormat,
    time_format: KeyTimeFormat,
) -> Vec<u8> {
    let layout = KeyLayout::new(format, time_format, keys.len());
    let mut buffer = vec![0u8; layout.total_size];

    if let Some(modes) = layout.interp_modes_offset {
        for (index, key) in keys.iter().enumerate() {
            buffer[modes + index] = key.interp_mode.as_u8();
        }
    }

    match time_format {
        KeyTimeFormat::Quantized16 => {
            let min_time = keys.first().map_or(0.0, |key| key.time);
            let delta_time = keys.last().map_or(0.0, |key| key.time) - min_time;
            for (index, key) in keys.iter().enumerate() {
                let code = quantize_time(key.time, min_time, delta_time);
                write_u16(&mut buffer, layout.times_offset + index * 2, code);
            }
            if let Some(range) = layout.range_offset {
                write_f32(&mut buffer, range, min_time);
                write_f32(&mut buffer, range + 4, delta_time);
            }
        }
        KeyTimeFormat::Float32 => {
            for (index, key) in keys.iter().enumerate() {
                write_f32(&mut buffer, layout.times_offset + index * 4, key.time);
            }
        }
    }

    let with_tangents = layout.value_stride > 4;
    for (index, key) in keys.iter().enumerate() {
        let offset = layout.values_offset + index * layout.value_stride;
        write_f32(&mut buffer, offset, key.value);
        if with_tangents {
            write_f32(&mut buffer, offset + 4, key.arrive_tangent);
            write_f32(&mut buffer, offset + 8, key.leave_tangent);
        }
    }

    buffer
}
