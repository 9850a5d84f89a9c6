//! Baking API: resample a curve at a fixed rate, either into its own keys or into plain samples.

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::curve::EditableCurve;

/// Upper bound on the keys a single [`EditableCurve::bake_curve`] call may write.
pub const MAX_BAKED_KEYS: usize = 1 << 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BakingConfig {
    /// Target frame rate (Hz) for baked samples.
    pub frame_rate: f32,
    /// Start time (seconds); if None, uses the first key time.
    pub start_time: Option<f32>,
    /// End time (seconds); if None, uses the last key time.
    pub end_time: Option<f32>,
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            start_time: None,
            end_time: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedCurve {
    pub frame_rate: f32,
    pub start_time: f32,
    pub end_time: f32,
    /// Sampled values at each frame, inclusive of the end.
    pub values: Vec<f32>,
}

impl EditableCurve {
    /// Replace the curve shape with keys every `sample_interval` seconds.
    ///
    /// Samples run from the first time of `time_range` (whole key range when `None`) up to,
    /// but excluding, the last one; the range ends themselves are left untouched. All samples
    /// are evaluated before any key is written. Non-positive intervals do nothing, as do
    /// intervals that would produce more than [`MAX_BAKED_KEYS`] samples.
    pub fn bake_curve(&mut self, sample_interval: f32, time_range: Option<(f32, f32)>) {
        if !(sample_interval.is_finite() && sample_interval > 0.0) {
            return;
        }
        let Some((first, last)) = time_range.or_else(|| self.time_range()) else {
            return;
        };

        let steps = ((last - first) / sample_interval).ceil();
        if !(steps.is_finite() && steps > 1.0) {
            return;
        }
        if steps > MAX_BAKED_KEYS as f32 {
            warn!(
                "bake interval {sample_interval}s over [{first}, {last}] exceeds {MAX_BAKED_KEYS} keys; skipped"
            );
            return;
        }
        let steps = steps as usize;

        let mut samples = Vec::with_capacity(steps - 1);
        for step in 1..steps {
            let time = first + step as f32 * sample_interval;
            if time >= last {
                break;
            }
            samples.push((time, self.eval(time, 0.0)));
        }
        trace!(
            "baking {} samples over [{first}, {last}] every {sample_interval}s",
            samples.len()
        );

        let tolerance = self.settings().key_time_tolerance;
        for (time, value) in samples {
            self.update_or_add_key(time, value, tolerance);
        }
    }
}

/// Sample `curve` at `cfg.frame_rate` over the configured window.
pub fn bake_samples(curve: &EditableCurve, cfg: &BakingConfig) -> BakedCurve {
    let sr = if cfg.frame_rate.is_finite() && cfg.frame_rate > 0.0 {
        cfg.frame_rate
    } else {
        60.0
    };
    let (first, last) = curve.time_range().unwrap_or((0.0, 0.0));
    let start = cfg.start_time.filter(|t| t.is_finite()).unwrap_or(first);
    let end = cfg
        .end_time
        .filter(|t| t.is_finite())
        .unwrap_or(last)
        .max(start);
    let span = end - start;
    let frame_count = (span * sr).ceil() as usize + 1; // inclusive of end

    let values = (0..frame_count)
        .map(|f| {
            let t = (start + f as f32 / sr).min(end);
            curve.eval(t, 0.0)
        })
        .collect();

    BakedCurve {
        frame_rate: sr,
        start_time: start,
        end_time: end,
        values,
    }
}

/// Export baked samples as serde_json::Value (stable schema for FFI/serialization).
pub fn export_baked_json(baked: &BakedCurve) -> serde_json::Value {
    serde_json::to_value(baked).unwrap_or(serde_json::Value::Null)
}
