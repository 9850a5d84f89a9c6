//! Interpolation helpers:
//! - lerp_f32 / bezier_interp (de Casteljau)
//! - eval_segment (constant / linear / cubic between two keys)
//! - auto_tangent (Catmull-Rom style slope estimate)
//! - unwind_degrees (rotation continuity)

use crate::keyframe::InterpMode;

const ONE_THIRD: f32 = 1.0 / 3.0;

/// Smallest time span used as a divisor for slope estimates.
const MIN_TANGENT_SPAN: f32 = 1e-4;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic Bezier through nested lerps.
#[inline]
pub fn bezier_interp(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let p01 = lerp_f32(p0, p1, t);
    let p12 = lerp_f32(p1, p2, t);
    let p23 = lerp_f32(p2, p3, t);
    let p012 = lerp_f32(p01, p12, t);
    let p123 = lerp_f32(p12, p23, t);
    lerp_f32(p012, p123, t)
}

/// One end of a segment: its key time, value and the tangent facing the segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentEnd {
    pub time: f32,
    pub value: f32,
    pub tangent: f32,
}

impl SegmentEnd {
    #[inline]
    pub fn new(time: f32, value: f32, tangent: f32) -> Self {
        Self {
            time,
            value,
            tangent,
        }
    }
}

/// Evaluate the segment `[from, to]` at `time`, where `mode` is the interpolation of `from`.
///
/// `from.tangent` is the leave tangent of the first key and `to.tangent` the arrive
/// tangent of the second. Degenerate (zero-length) segments hold `from.value`.
#[inline]
pub fn eval_segment(mode: InterpMode, from: SegmentEnd, to: SegmentEnd, time: f32) -> f32 {
    let span = to.time - from.time;
    if span <= 0.0 || mode == InterpMode::Constant {
        return from.value;
    }
    let alpha = (time - from.time) / span;
    match mode {
        InterpMode::Constant => from.value,
        InterpMode::Linear => lerp_f32(from.value, to.value, alpha),
        InterpMode::Cubic => {
            let p0 = from.value;
            let p3 = to.value;
            let p1 = p0 + from.tangent * span * ONE_THIRD;
            let p2 = p3 - to.tangent * span * ONE_THIRD;
            bezier_interp(p0, p1, p2, p3, alpha)
        }
    }
}

/// Symmetric slope for a key from its two neighbours, scaled down by `tension`.
#[inline]
pub fn auto_tangent(
    prev_time: f32,
    prev_value: f32,
    next_time: f32,
    next_value: f32,
    tension: f32,
) -> f32 {
    let span = (next_time - prev_time).max(MIN_TANGENT_SPAN);
    (1.0 - tension) * (next_value - prev_value) / span
}

/// Shift `value` by whole turns so it lies within 180 degrees of `reference`.
///
/// A difference of exactly half a turn is left on its original side. Non-finite
/// input is returned unchanged.
#[inline]
pub fn unwind_degrees(value: f32, reference: f32) -> f32 {
    if !value.is_finite() || !reference.is_finite() {
        return value;
    }
    // Turns are counted in f64 so large magnitudes still land within half a turn.
    let diff = f64::from(value) - f64::from(reference);
    let mut turns = (diff / 360.0).round();
    let residual = diff - turns * 360.0;
    if residual == -180.0 && diff > 0.0 {
        turns -= 1.0;
    } else if residual == 180.0 && diff < 0.0 {
        turns += 1.0;
    }
    (f64::from(value) - turns * 360.0) as f32
}
