//! Keyframe data model and its binary record.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::CurveError;

/// How the segment starting at a key is interpolated.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InterpMode {
    /// Hold the key value until the next key.
    Constant = 0,
    Linear = 1,
    /// Cubic Bezier driven by the key tangents.
    #[default]
    Cubic = 2,
}

/// How tangents of a cubic key are maintained.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TangentMode {
    /// Recomputed from the neighbouring keys on every edit.
    #[default]
    Auto = 0,
    /// User supplied, arrive and leave kept equal.
    User = 1,
    /// User supplied, arrive and leave independent.
    Break = 2,
}

/// Which tangent weights are authored.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TangentWeightMode {
    #[default]
    None = 0,
    Arrive = 1,
    Leave = 2,
    Both = 3,
}

/// Evaluation policy for times outside the keyed range.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Extrapolation {
    /// Hold the boundary key value.
    #[default]
    Constant = 0,
    /// Continue the slope between the two boundary keys.
    Linear = 1,
    /// Repeat the keyed range.
    Cycle = 2,
    /// Repeat the keyed range, accumulating the boundary value delta per repetition.
    CycleWithOffset = 3,
    /// Repeat the keyed range, mirroring every other repetition.
    Oscillate = 4,
}

macro_rules! u8_enum_conversions {
    ($ty:ident, $name:literal, [$($variant:ident),+ $(,)?]) => {
        impl $ty {
            /// Decode from the on-disk tag.
            pub fn from_u8(value: u8) -> Result<Self, CurveError> {
                $(
                    if value == $ty::$variant as u8 {
                        return Ok($ty::$variant);
                    }
                )+
                Err(CurveError::InvalidEnum { field: $name, value })
            }

            #[inline]
            pub fn as_u8(self) -> u8 {
                self as u8
            }
        }
    };
}

u8_enum_conversions!(InterpMode, "InterpMode", [Constant, Linear, Cubic]);
u8_enum_conversions!(TangentMode, "TangentMode", [Auto, User, Break]);
u8_enum_conversions!(
    TangentWeightMode,
    "TangentWeightMode",
    [None, Arrive, Leave, Both]
);
u8_enum_conversions!(
    Extrapolation,
    "Extrapolation",
    [Constant, Linear, Cycle, CycleWithOffset, Oscillate]
);

impl Extrapolation {
    /// Policies that fold the query time back into the keyed range.
    #[inline]
    pub fn is_cyclic(self) -> bool {
        matches!(
            self,
            Extrapolation::Cycle | Extrapolation::CycleWithOffset | Extrapolation::Oscillate
        )
    }
}

/// Extrapolation before the first key (`pre`) and after the last key (`post`).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct InfinityExtrap {
    pub pre: Extrapolation,
    pub post: Extrapolation,
}

impl InfinityExtrap {
    #[inline]
    pub fn new(pre: Extrapolation, post: Extrapolation) -> Self {
        Self { pre, post }
    }

    /// Same policy on both sides.
    #[inline]
    pub fn both(policy: Extrapolation) -> Self {
        Self::new(policy, policy)
    }
}

/// One control point of a curve.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyframe {
    pub interp_mode: InterpMode,
    pub tangent_mode: TangentMode,
    pub tangent_weight_mode: TangentWeightMode,
    pub time: f32,
    pub value: f32,
    pub arrive_tangent: f32,
    pub arrive_tangent_weight: f32,
    pub leave_tangent: f32,
    pub leave_tangent_weight: f32,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self {
            interp_mode: InterpMode::Cubic,
            tangent_mode: TangentMode::Auto,
            tangent_weight_mode: TangentWeightMode::None,
            time: 0.0,
            value: 0.0,
            arrive_tangent: 0.0,
            arrive_tangent_weight: 0.0,
            leave_tangent: 0.0,
            leave_tangent_weight: 0.0,
        }
    }
}

impl Keyframe {
    /// Size of [`write_record`](Self::write_record) output in bytes.
    pub const RECORD_SIZE: usize = 3 + 6 * 4;

    /// Cubic, auto-tangent key.
    #[inline]
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_interp(mut self, mode: InterpMode) -> Self {
        self.interp_mode = mode;
        self
    }

    /// Set both tangents and mark them as user supplied.
    #[inline]
    pub fn with_tangents(mut self, arrive: f32, leave: f32) -> Self {
        self.arrive_tangent = arrive;
        self.leave_tangent = leave;
        self.tangent_mode = if arrive == leave {
            TangentMode::User
        } else {
            TangentMode::Break
        };
        self
    }

    /// Write the fixed-order, untagged record.
    pub fn write_record<W: Write>(&self, writer: &mut W) -> Result<(), CurveError> {
        writer.write_u8(self.interp_mode.as_u8())?;
        writer.write_u8(self.tangent_mode.as_u8())?;
        writer.write_u8(self.tangent_weight_mode.as_u8())?;
        writer.write_f32::<LittleEndian>(self.time)?;
        writer.write_f32::<LittleEndian>(self.value)?;
        writer.write_f32::<LittleEndian>(self.arrive_tangent)?;
        writer.write_f32::<LittleEndian>(self.arrive_tangent_weight)?;
        writer.write_f32::<LittleEndian>(self.leave_tangent)?;
        writer.write_f32::<LittleEndian>(self.leave_tangent_weight)?;
        Ok(())
    }

    /// Read a record produced by [`write_record`](Self::write_record).
    pub fn read_record<R: Read>(reader: &mut R) -> Result<Self, CurveError> {
        let interp_mode = InterpMode::from_u8(reader.read_u8()?)?;
        let tangent_mode = TangentMode::from_u8(reader.read_u8()?)?;
        let tangent_weight_mode = TangentWeightMode::from_u8(reader.read_u8()?)?;
        Ok(Self {
            interp_mode,
            tangent_mode,
            tangent_weight_mode,
            time: reader.read_f32::<LittleEndian>()?,
            value: reader.read_f32::<LittleEndian>()?,
            arrive_tangent: reader.read_f32::<LittleEndian>()?,
            arrive_tangent_weight: reader.read_f32::<LittleEndian>()?,
            leave_tangent: reader.read_f32::<LittleEndian>()?,
            leave_tangent_weight: reader.read_f32::<LittleEndian>()?,
        })
    }
}
