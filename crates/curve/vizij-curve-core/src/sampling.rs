//! Curve evaluation shared by every key storage.
//!
//! Model:
//! - Keys are sorted by time; segment `[i, i+1]` is interpolated per key `i`'s mode.
//! - Query times outside `[first, last]` are first remapped by the extrapolation policy
//!   of that side (cyclic policies fold the time back and may add a value offset).
//! - Remaining out-of-range times hold the boundary value, or follow the boundary slope
//!   for `Extrapolation::Linear`.
//!
//! Storages plug in through [`KeySource`]; the editable curve evaluates its keyframe
//! slice and the compressed curve evaluates its packed buffer with the same code.

use crate::interp::functions::{eval_segment, SegmentEnd};
use crate::keyframe::{Extrapolation, Keyframe};

/// Time deltas below this are treated as coincident keys.
const NEARLY_ZERO_TIME: f32 = 1e-8;

/// Read access to a sorted key sequence.
pub trait KeySource {
    fn num_keys(&self) -> usize;
    fn key_time(&self, index: usize) -> f32;
    fn key_value(&self, index: usize) -> f32;
    /// Evaluate the segment starting at key `index` (so `index + 1` must exist).
    fn eval_segment(&self, index: usize, time: f32) -> f32;
}

impl KeySource for [Keyframe] {
    #[inline]
    fn num_keys(&self) -> usize {
        self.len()
    }

    #[inline]
    fn key_time(&self, index: usize) -> f32 {
        self[index].time
    }

    #[inline]
    fn key_value(&self, index: usize) -> f32 {
        self[index].value
    }

    #[inline]
    fn eval_segment(&self, index: usize, time: f32) -> f32 {
        eval_key_pair(&self[index], &self[index + 1], time)
    }
}

/// Evaluate the segment between two keys at `time`, ignoring every other key.
#[inline]
pub fn eval_key_pair(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    eval_segment(
        k0.interp_mode,
        SegmentEnd::new(k0.time, k0.value, k0.leave_tangent),
        SegmentEnd::new(k1.time, k1.value, k1.arrive_tangent),
        time,
    )
}

/// Fold `time` into the keyed range for cyclic policies.
///
/// Returns the remapped time and the value offset to add to the evaluated result.
/// Non-cyclic policies and curves with fewer than two keys (or a zero-length range)
/// leave the time untouched.
pub fn remap_time<S: KeySource + ?Sized>(
    keys: &S,
    pre: Extrapolation,
    post: Extrapolation,
    time: f32,
) -> (f32, f32) {
    let n = keys.num_keys();
    if n < 2 {
        return (time, 0.0);
    }
    let min_time = keys.key_time(0);
    let max_time = keys.key_time(n - 1);
    let duration = max_time - min_time;
    if duration <= NEARLY_ZERO_TIME {
        return (time, 0.0);
    }

    let (policy, before) = if time < min_time {
        (pre, true)
    } else if time > max_time {
        (post, false)
    } else {
        return (time, 0.0);
    };
    if !policy.is_cyclic() {
        return (time, 0.0);
    }

    let cycles = ((time - min_time) / duration).floor();
    let mut remapped = (time - cycles * duration).clamp(min_time, max_time);
    let wraps = cycles.abs();

    let mut offset = 0.0;
    match policy {
        Extrapolation::CycleWithOffset => {
            let first = keys.key_value(0);
            let last = keys.key_value(n - 1);
            let delta = if before { first - last } else { last - first };
            offset = delta * wraps;
        }
        Extrapolation::Oscillate => {
            if wraps % 2.0 == 1.0 {
                remapped = min_time + (max_time - remapped);
            }
        }
        _ => {}
    }
    (remapped, offset)
}

/// Index `i` of the bracketing pair `[i, i+1]` for a time strictly inside the range.
#[inline]
pub fn bracket_index<S: KeySource + ?Sized>(keys: &S, time: f32) -> usize {
    // Lower bound over keys[1..n-1] for the first key later than `time`.
    let mut first = 1;
    let mut count = keys.num_keys() - 2;
    while count > 0 {
        let step = count / 2;
        let middle = first + step;
        if time >= keys.key_time(middle) {
            first = middle + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }
    first - 1
}

#[inline]
fn extrapolate_linear<S: KeySource + ?Sized>(
    keys: &S,
    anchor: usize,
    other: usize,
    time: f32,
) -> f32 {
    let anchor_time = keys.key_time(anchor);
    let anchor_value = keys.key_value(anchor);
    let dt = keys.key_time(other) - anchor_time;
    if dt.abs() <= NEARLY_ZERO_TIME {
        return anchor_value;
    }
    let slope = (keys.key_value(other) - anchor_value) / dt;
    anchor_value + slope * (time - anchor_time)
}

/// Evaluate `keys` at `time`, returning `default_value` when there are no keys.
pub fn eval_keys<S: KeySource + ?Sized>(
    keys: &S,
    pre: Extrapolation,
    post: Extrapolation,
    time: f32,
    default_value: f32,
) -> f32 {
    let n = keys.num_keys();
    if n == 0 {
        return default_value;
    }

    let (time, offset) = remap_time(keys, pre, post, time);

    let value = if n < 2 || time <= keys.key_time(0) {
        if pre == Extrapolation::Linear && n > 1 {
            extrapolate_linear(keys, 0, 1, time)
        } else {
            keys.key_value(0)
        }
    } else if time < keys.key_time(n - 1) {
        let index = bracket_index(keys, time);
        keys.eval_segment(index, time)
    } else if post == Extrapolation::Linear {
        extrapolate_linear(keys, n - 1, n - 2, time)
    } else {
        keys.key_value(n - 1)
    };

    value + offset
}
