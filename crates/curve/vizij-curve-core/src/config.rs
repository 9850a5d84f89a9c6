//! Tunables for curve editing and compression.

use serde::{Deserialize, Serialize};

/// Tolerance used when two key times should be treated as the same key.
pub const DEFAULT_KEY_TIME_TOLERANCE: f32 = 1e-4;

/// Tolerance under which all key values collapse to a constant curve.
pub const DEFAULT_CONSTANT_VALUE_TOLERANCE: f32 = 1e-8;

/// Settings for [`CompressedCurve::compress`](crate::CompressedCurve::compress).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    /// Largest evaluation error accepted from quantized key times.
    pub error_threshold: f32,
    /// Seconds between simulated playback samples when measuring that error.
    pub sample_interval: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            error_threshold: 1e-4,
            sample_interval: 1.0 / 60.0,
        }
    }
}

/// Defaults for editing helpers that take tolerances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSettings {
    pub key_time_tolerance: f32,
    pub constant_value_tolerance: f32,
    /// Tension passed to automatic tangent recomputation after edits.
    pub auto_tangent_tension: f32,
}

impl Default for CurveSettings {
    fn default() -> Self {
        Self {
            key_time_tolerance: DEFAULT_KEY_TIME_TOLERANCE,
            constant_value_tolerance: DEFAULT_CONSTANT_VALUE_TOLERANCE,
            auto_tangent_tension: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: CompressionSettings =
            serde_json::from_str(r#"{ "error_threshold": 0.01 }"#).unwrap();
        assert_eq!(cfg.error_threshold, 0.01);
        assert_eq!(cfg.sample_interval, 1.0 / 60.0);
    }
}
