//! Readers over the packed key stream and the evaluator dispatch table.
//!
//! Every `[CompressionFormat][KeyTimeFormat]` pair gets its own monomorphised
//! evaluator, so the hot loop never branches on the format.

use super::layout::{KeyLayout, QUANTIZED_TIME_MAX};
use super::{CompressionFormat, KeyTimeFormat, NumKeysOrConstant, UNSET_DEFAULT_VALUE};
use crate::interp::functions::{eval_segment, SegmentEnd};
use crate::keyframe::{InfinityExtrap, InterpMode};
use crate::sampling::{eval_keys, KeySource};

#[inline]
pub(crate) fn read_u16(buffer: &[u8], offset: usize) -> u16 {
    u16::from_le(bytemuck::pod_read_unaligned(&buffer[offset..offset + 2]))
}

#[inline]
pub(crate) fn read_f32(buffer: &[u8], offset: usize) -> f32 {
    f32::from_bits(u32::from_le(bytemuck::pod_read_unaligned(
        &buffer[offset..offset + 4],
    )))
}

#[inline]
pub(crate) fn write_u16(buffer: &mut [u8], offset: usize, value: u16) {
    buffer[offset..offset + 2].copy_from_slice(bytemuck::bytes_of(&value.to_le()));
}

#[inline]
pub(crate) fn write_f32(buffer: &mut [u8], offset: usize, value: f32) {
    buffer[offset..offset + 4].copy_from_slice(bytemuck::bytes_of(&value.to_bits().to_le()));
}

/// Decodes key times.
pub(crate) trait KeyTimes: Sized {
    const FORMAT: KeyTimeFormat;
    fn new(buffer: &[u8], layout: &KeyLayout) -> Self;
    fn time(&self, buffer: &[u8], index: usize) -> f32;
}

/// Range-normalised `u16` times.
pub(crate) struct QuantizedTimes {
    offset: usize,
    min_time: f32,
    delta_time: f32,
}

impl KeyTimes for QuantizedTimes {
    const FORMAT: KeyTimeFormat = KeyTimeFormat::Quantized16;

    #[inline]
    fn new(buffer: &[u8], layout: &KeyLayout) -> Self {
        let range = layout.range_offset.unwrap_or(layout.times_offset);
        Self {
            offset: layout.times_offset,
            min_time: read_f32(buffer, range),
            delta_time: read_f32(buffer, range + 4),
        }
    }

    #[inline]
    fn time(&self, buffer: &[u8], index: usize) -> f32 {
        let code = read_u16(buffer, self.offset + index * 2);
        (code as f32 / QUANTIZED_TIME_MAX) * self.delta_time + self.min_time
    }
}

/// Plain `f32` times.
pub(crate) struct FloatTimes {
    offset: usize,
}

impl KeyTimes for FloatTimes {
    const FORMAT: KeyTimeFormat = KeyTimeFormat::Float32;

    #[inline]
    fn new(_buffer: &[u8], layout: &KeyLayout) -> Self {
        Self {
            offset: layout.times_offset,
        }
    }

    #[inline]
    fn time(&self, buffer: &[u8], index: usize) -> f32 {
        read_f32(buffer, self.offset + index * 4)
    }
}

/// Decodes per-key interpolation data.
pub(crate) trait KeyValues: Sized {
    const FORMAT: CompressionFormat;
    fn new(layout: &KeyLayout) -> Self;
    fn interp_mode(&self, buffer: &[u8], index: usize) -> InterpMode;
    fn value(&self, buffer: &[u8], index: usize) -> f32;
    fn arrive_tangent(&self, buffer: &[u8], index: usize) -> f32;
    fn leave_tangent(&self, buffer: &[u8], index: usize) -> f32;
}

/// Values only; every segment is linear.
pub(crate) struct LinearValues {
    offset: usize,
}

impl KeyValues for LinearValues {
    const FORMAT: CompressionFormat = CompressionFormat::Linear;

    #[inline]
    fn new(layout: &KeyLayout) -> Self {
        Self {
            offset: layout.values_offset,
        }
    }

    #[inline]
    fn interp_mode(&self, _buffer: &[u8], _index: usize) -> InterpMode {
        InterpMode::Linear
    }

    #[inline]
    fn value(&self, buffer: &[u8], index: usize) -> f32 {
        read_f32(buffer, self.offset + index * 4)
    }

    #[inline]
    fn arrive_tangent(&self, _buffer: &[u8], _index: usize) -> f32 {
        0.0
    }

    #[inline]
    fn leave_tangent(&self, _buffer: &[u8], _index: usize) -> f32 {
        0.0
    }
}

/// `{value, arrive, leave}` triples; every segment is cubic.
pub(crate) struct CubicValues {
    offset: usize,
    stride: usize,
}

impl KeyValues for CubicValues {
    const FORMAT: CompressionFormat = CompressionFormat::Cubic;

    #[inline]
    fn new(layout: &KeyLayout) -> Self {
        Self {
            offset: layout.values_offset,
            stride: layout.value_stride,
        }
    }

    #[inline]
    fn interp_mode(&self, _buffer: &[u8], _index: usize) -> InterpMode {
        InterpMode::Cubic
    }

    #[inline]
    fn value(&self, buffer: &[u8], index: usize) -> f32 {
        read_f32(buffer, self.offset + index * self.stride)
    }

    #[inline]
    fn arrive_tangent(&self, buffer: &[u8], index: usize) -> f32 {
        read_f32(buffer, self.offset + index * self.stride + 4)
    }

    #[inline]
    fn leave_tangent(&self, buffer: &[u8], index: usize) -> f32 {
        read_f32(buffer, self.offset + index * self.stride + 8)
    }
}

/// `{value, arrive, leave}` triples plus a mode byte per key.
pub(crate) struct MixedValues {
    modes_offset: usize,
    keys: CubicValues,
}

impl KeyValues for MixedValues {
    const FORMAT: CompressionFormat = CompressionFormat::Mixed;

    #[inline]
    fn new(layout: &KeyLayout) -> Self {
        Self {
            modes_offset: layout.interp_modes_offset.unwrap_or(0),
            keys: CubicValues::new(layout),
        }
    }

    #[inline]
    fn interp_mode(&self, buffer: &[u8], index: usize) -> InterpMode {
        InterpMode::from_u8(buffer[self.modes_offset + index]).unwrap_or(InterpMode::Constant)
    }

    #[inline]
    fn value(&self, buffer: &[u8], index: usize) -> f32 {
        self.keys.value(buffer, index)
    }

    #[inline]
    fn arrive_tangent(&self, buffer: &[u8], index: usize) -> f32 {
        self.keys.arrive_tangent(buffer, index)
    }

    #[inline]
    fn leave_tangent(&self, buffer: &[u8], index: usize) -> f32 {
        self.keys.leave_tangent(buffer, index)
    }
}

/// A packed key stream viewed through one time adapter and one value adapter.
struct PackedKeys<'a, T, V> {
    buffer: &'a [u8],
    num_keys: usize,
    times: T,
    values: V,
}

impl<T: KeyTimes, V: KeyValues> KeySource for PackedKeys<'_, T, V> {
    #[inline]
    fn num_keys(&self) -> usize {
        self.num_keys
    }

    #[inline]
    fn key_time(&self, index: usize) -> f32 {
        self.times.time(self.buffer, index)
    }

    #[inline]
    fn key_value(&self, index: usize) -> f32 {
        self.values.value(self.buffer, index)
    }

    #[inline]
    fn eval_segment(&self, index: usize, time: f32) -> f32 {
        let next = index + 1;
        eval_segment(
            self.values.interp_mode(self.buffer, index),
            SegmentEnd::new(
                self.key_time(index),
                self.key_value(index),
                self.values.leave_tangent(self.buffer, index),
            ),
            SegmentEnd::new(
                self.key_time(next),
                self.key_value(next),
                self.values.arrive_tangent(self.buffer, next),
            ),
            time,
        )
    }
}

/// Signature shared by every entry of [`EVALUATORS`].
pub(crate) type EvalFn = fn(InfinityExtrap, NumKeysOrConstant, &[u8], f32, f32) -> f32;

fn eval_empty(
    _extrap: InfinityExtrap,
    header: NumKeysOrConstant,
    _buffer: &[u8],
    _time: f32,
    default_value: f32,
) -> f32 {
    match header {
        NumKeysOrConstant::ConstantValue(value) if value != UNSET_DEFAULT_VALUE => value,
        _ => default_value,
    }
}

fn eval_constant(
    _extrap: InfinityExtrap,
    header: NumKeysOrConstant,
    _buffer: &[u8],
    _time: f32,
    default_value: f32,
) -> f32 {
    match header {
        NumKeysOrConstant::ConstantValue(value) => value,
        NumKeysOrConstant::NumKeys(_) => default_value,
    }
}

fn eval_packed<T: KeyTimes, V: KeyValues>(
    extrap: InfinityExtrap,
    header: NumKeysOrConstant,
    buffer: &[u8],
    time: f32,
    default_value: f32,
) -> f32 {
    let num_keys = header.num_keys();
    if num_keys == 0 {
        return default_value;
    }
    let layout = KeyLayout::new(V::FORMAT, T::FORMAT, num_keys);
    let keys = PackedKeys {
        buffer,
        num_keys,
        times: T::new(buffer, &layout),
        values: V::new(&layout),
    };
    eval_keys(&keys, extrap.pre, extrap.post, time, default_value)
}

/// Evaluators indexed by `[CompressionFormat][KeyTimeFormat]`.
pub(crate) static EVALUATORS: [[EvalFn; 2]; 5] = [
    // Empty
    [eval_empty, eval_empty],
    // Constant
    [eval_constant, eval_constant],
    // Linear
    [
        eval_packed::<QuantizedTimes, LinearValues>,
        eval_packed::<FloatTimes, LinearValues>,
    ],
    // Cubic
    [
        eval_packed::<QuantizedTimes, CubicValues>,
        eval_packed::<FloatTimes, CubicValues>,
    ],
    // Mixed
    [
        eval_packed::<QuantizedTimes, MixedValues>,
        eval_packed::<FloatTimes, MixedValues>,
    ],
];
