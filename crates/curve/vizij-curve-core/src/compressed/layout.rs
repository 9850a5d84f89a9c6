//! Byte layout of the packed key stream.
//!
//! In order, each section aligned to its element size:
//! 1. `u8` interpolation mode per key (Mixed only)
//! 2. key times: `u16` quantized times followed by `{min_time: f32, delta_time: f32}`,
//!    or plain `f32` times
//! 3. per key `value: f32`, followed by `arrive, leave: f32` for Cubic and Mixed
//!
//! All scalars are little-endian.

use super::{CompressionFormat, KeyTimeFormat};

/// Largest quantized time code.
pub(crate) const QUANTIZED_TIME_MAX: f32 = 65535.0;

/// Byte size of the `{min_time, delta_time}` range header.
const RANGE_HEADER_SIZE: usize = 8;

#[inline]
pub(crate) const fn align(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

/// Offsets of every section of a packed key stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KeyLayout {
    /// Present for [`CompressionFormat::Mixed`]; always at offset 0.
    pub interp_modes_offset: Option<usize>,
    pub times_offset: usize,
    /// Present for [`KeyTimeFormat::Quantized16`].
    pub range_offset: Option<usize>,
    pub values_offset: usize,
    /// Bytes between consecutive keys in the value section.
    pub value_stride: usize,
    pub total_size: usize,
}

impl KeyLayout {
    pub fn new(format: CompressionFormat, time_format: KeyTimeFormat, num_keys: usize) -> Self {
        let (interp_modes_offset, modes_size) = match format {
            CompressionFormat::Mixed => (Some(0), num_keys),
            _ => (None, 0),
        };

        let (times_offset, range_offset, times_end) = match time_format {
            KeyTimeFormat::Quantized16 => {
                let times_offset = align(modes_size, 2);
                let range_offset = align(times_offset + num_keys * 2, 4);
                (
                    times_offset,
                    Some(range_offset),
                    range_offset + RANGE_HEADER_SIZE,
                )
            }
            KeyTimeFormat::Float32 => {
                let times_offset = align(modes_size, 4);
                (times_offset, None, times_offset + num_keys * 4)
            }
        };

        let values_per_key = match format {
            CompressionFormat::Cubic | CompressionFormat::Mixed => 3,
            _ => 1,
        };
        let value_stride = values_per_key * 4;
        let values_offset = align(times_end, 4);

        Self {
            interp_modes_offset,
            times_offset,
            range_offset,
            values_offset,
            value_stride,
            total_size: values_offset + num_keys * value_stride,
        }
    }
}
