//! Immutable packed curves for runtime evaluation and interchange.
//!
//! A [`CompressedCurve`] is built once from an [`EditableCurve`](crate::EditableCurve)
//! by [`CompressedCurve::compress`] and only evaluated afterwards. It is `Send + Sync`
//! and safe to share across threads.

mod adapters;
mod compress;
mod layout;

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::CurveError;
use crate::keyframe::{Extrapolation, InfinityExtrap};
use adapters::EVALUATORS;
use layout::KeyLayout;

/// Empty-curve header value meaning "no curve default"; never stored as a default.
pub const UNSET_DEFAULT_VALUE: f32 = f32::MAX;

/// How the key stream is encoded.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionFormat {
    /// No keys; the header holds the curve default or [`UNSET_DEFAULT_VALUE`].
    #[default]
    Empty = 0,
    /// Every key carries the same value; the header holds it.
    Constant = 1,
    /// Every segment is linear; values only.
    Linear = 2,
    /// Every segment is cubic; values and tangents.
    Cubic = 3,
    /// Per-key interpolation mode byte; values and tangents for every key.
    Mixed = 4,
}

/// How key times are encoded.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyTimeFormat {
    /// `u16` codes normalised over `[min_time, min_time + delta_time]`.
    Quantized16 = 0,
    #[default]
    Float32 = 1,
}

impl CompressionFormat {
    pub fn from_u8(value: u8) -> Result<Self, CurveError> {
        match value {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Constant),
            2 => Ok(Self::Linear),
            3 => Ok(Self::Cubic),
            4 => Ok(Self::Mixed),
            _ => Err(CurveError::InvalidEnum {
                field: "CompressionFormat",
                value,
            }),
        }
    }

    /// Formats whose header is a key count and whose keys live in the packed stream.
    #[inline]
    pub fn has_packed_keys(self) -> bool {
        matches!(self, Self::Linear | Self::Cubic | Self::Mixed)
    }
}

impl KeyTimeFormat {
    pub fn from_u8(value: u8) -> Result<Self, CurveError> {
        match value {
            0 => Ok(Self::Quantized16),
            1 => Ok(Self::Float32),
            _ => Err(CurveError::InvalidEnum {
                field: "KeyTimeFormat",
                value,
            }),
        }
    }
}

/// Four header bytes read as a key count or a constant value, depending on the format.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NumKeysOrConstant {
    NumKeys(i32),
    ConstantValue(f32),
}

impl NumKeysOrConstant {
    /// Key count, or zero for constant headers.
    #[inline]
    pub fn num_keys(self) -> usize {
        match self {
            Self::NumKeys(n) => n.max(0) as usize,
            Self::ConstantValue(_) => 0,
        }
    }

    #[inline]
    pub fn to_bits(self) -> u32 {
        match self {
            Self::NumKeys(n) => n as u32,
            Self::ConstantValue(v) => v.to_bits(),
        }
    }

    /// Interpret raw header bits according to `format`.
    #[inline]
    pub fn from_bits(format: CompressionFormat, bits: u32) -> Self {
        if format.has_packed_keys() {
            Self::NumKeys(bits as i32)
        } else {
            Self::ConstantValue(f32::from_bits(bits))
        }
    }
}

/// Packed, read-only curve.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedCurve {
    compression_format: CompressionFormat,
    key_time_format: KeyTimeFormat,
    extrap: InfinityExtrap,
    header: NumKeysOrConstant,
    compressed_keys: Vec<u8>,
}

impl Default for CompressedCurve {
    fn default() -> Self {
        Self {
            compression_format: CompressionFormat::Empty,
            key_time_format: KeyTimeFormat::Float32,
            extrap: InfinityExtrap::default(),
            header: NumKeysOrConstant::ConstantValue(UNSET_DEFAULT_VALUE),
            compressed_keys: Vec::new(),
        }
    }
}

impl CompressedCurve {
    /// Size of the fixed part of the binary record.
    pub const RECORD_HEADER_SIZE: usize = 4 + 4 + 4;

    #[inline]
    pub fn compression_format(&self) -> CompressionFormat {
        self.compression_format
    }

    #[inline]
    pub fn key_time_format(&self) -> KeyTimeFormat {
        self.key_time_format
    }

    #[inline]
    pub fn extrapolation(&self) -> InfinityExtrap {
        self.extrap
    }

    #[inline]
    pub fn pre_infinity_extrap(&self) -> Extrapolation {
        self.extrap.pre
    }

    #[inline]
    pub fn post_infinity_extrap(&self) -> Extrapolation {
        self.extrap.post
    }

    #[inline]
    pub fn header(&self) -> NumKeysOrConstant {
        self.header
    }

    /// Number of keys in the packed stream (zero for Empty and Constant).
    #[inline]
    pub fn num_keys(&self) -> usize {
        self.header.num_keys()
    }

    /// Raw packed key stream.
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.compressed_keys
    }

    /// Bytes used by the packed key stream.
    #[inline]
    pub fn compressed_size(&self) -> usize {
        self.compressed_keys.len()
    }

    /// Evaluate at `time`; `default_value` is returned by keyless curves without a stored default.
    #[inline]
    pub fn eval(&self, time: f32, default_value: f32) -> f32 {
        static_eval(
            self.compression_format,
            self.key_time_format,
            self.extrap,
            self.header,
            &self.compressed_keys,
            time,
            default_value,
        )
    }

    /// Write the binary record: four format bytes, header bits, byte count, packed stream.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CurveError> {
        writer.write_u8(self.compression_format as u8)?;
        writer.write_u8(self.key_time_format as u8)?;
        writer.write_u8(self.extrap.pre.as_u8())?;
        writer.write_u8(self.extrap.post.as_u8())?;
        writer.write_u32::<LittleEndian>(self.header.to_bits())?;
        writer.write_i32::<LittleEndian>(self.compressed_keys.len() as i32)?;
        writer.write_all(&self.compressed_keys)?;
        Ok(())
    }

    /// Read a record written by [`write_to`](Self::write_to), validating tags and stream size.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CurveError> {
        let compression_format = CompressionFormat::from_u8(reader.read_u8()?)?;
        let key_time_format = KeyTimeFormat::from_u8(reader.read_u8()?)?;
        let pre = Extrapolation::from_u8(reader.read_u8()?)?;
        let post = Extrapolation::from_u8(reader.read_u8()?)?;
        let header = NumKeysOrConstant::from_bits(
            compression_format,
            reader.read_u32::<LittleEndian>()?,
        );
        if let NumKeysOrConstant::NumKeys(count) = header {
            if count < 0 {
                return Err(CurveError::NegativeCount {
                    field: "key count",
                    count,
                });
            }
        }

        let byte_count = reader.read_i32::<LittleEndian>()?;
        if byte_count < 0 {
            return Err(CurveError::NegativeCount {
                field: "byte count",
                count: byte_count,
            });
        }
        let byte_count = byte_count as usize;
        let expected = if compression_format.has_packed_keys() {
            KeyLayout::new(compression_format, key_time_format, header.num_keys()).total_size
        } else {
            0
        };
        if byte_count != expected {
            return Err(CurveError::LayoutMismatch {
                expected,
                actual: byte_count,
            });
        }

        let mut compressed_keys = vec![0u8; byte_count];
        reader.read_exact(&mut compressed_keys)?;

        Ok(Self {
            compression_format,
            key_time_format,
            extrap: InfinityExtrap::new(pre, post),
            header,
            compressed_keys,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::RECORD_HEADER_SIZE + self.compressed_keys.len());
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut bytes);
        bytes
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, CurveError> {
        Self::read_from(&mut bytes)
    }
}

/// Evaluate raw compressed fields without a [`CompressedCurve`] wrapper.
///
/// The fields must come from one [`CompressedCurve`] (or its record); mismatched
/// tags and buffers are a caller error and may panic on out-of-range reads.
#[inline]
pub fn static_eval(
    compression_format: CompressionFormat,
    key_time_format: KeyTimeFormat,
    extrap: InfinityExtrap,
    header: NumKeysOrConstant,
    buffer: &[u8],
    time: f32,
    default_value: f32,
) -> f32 {
    let evaluator = EVALUATORS[compression_format as usize][key_time_format as usize];
    evaluator(extrap, header, buffer, time, default_value)
}
