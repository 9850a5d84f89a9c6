//! Error types for curve records.
//!
//! Curve editing and evaluation never fail; only reading or writing the binary
//! records of keyframes and compressed curves does.

/// Errors raised while encoding or decoding curve records.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum CurveError {
    /// Underlying reader/writer failed (including truncated input)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An enum tag outside the known range
    #[error("Invalid {field} tag: {value}")]
    InvalidEnum { field: &'static str, value: u8 },

    /// Compressed record carries a negative key or byte count
    #[error("Negative {field}: {count}")]
    NegativeCount { field: &'static str, count: i32 },

    /// Packed key stream size disagrees with the layout implied by its header
    #[error("Packed key stream is {actual} bytes, layout expects {expected}")]
    LayoutMismatch { expected: usize, actual: usize },

    /// JSON (de)serialization failure
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl CurveError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidEnum { .. }
            | Self::NegativeCount { .. }
            | Self::LayoutMismatch { .. } => "format",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for CurveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
