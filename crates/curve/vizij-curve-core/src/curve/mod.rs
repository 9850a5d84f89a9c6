//! Editable keyframe curve.
//!
//! Keys live in a flat vector sorted by time; callers address them through
//! [`KeyHandle`]s resolved by a [`KeyHandleMap`]. Every mutating method keeps the
//! sort order and the handle bijection in step, and re-runs automatic tangents
//! where the edited data feeds them.

mod edit;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::compressed::{CompressedCurve, UNSET_DEFAULT_VALUE};
use crate::config::{CompressionSettings, CurveSettings};
use crate::handles::{KeyHandle, KeyHandleMap};
use crate::interp::{auto_tangent, unwind_degrees};
use crate::keyframe::{
    Extrapolation, InfinityExtrap, InterpMode, Keyframe, TangentMode, TangentWeightMode,
};
use crate::sampling::eval_keys;

/// Mutable curve with stable key handles.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "CurveData", into = "CurveData")]
pub struct EditableCurve {
    pub pre_infinity_extrap: Extrapolation,
    pub post_infinity_extrap: Extrapolation,
    keys: Vec<Keyframe>,
    handles: KeyHandleMap,
    default_value: Option<f32>,
    settings: CurveSettings,
}

/// Serialized form; handles are runtime identities and are rebuilt on load.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CurveData {
    pre_infinity_extrap: Extrapolation,
    post_infinity_extrap: Extrapolation,
    keys: Vec<Keyframe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_value: Option<f32>,
    settings: CurveSettings,
}

impl From<CurveData> for EditableCurve {
    fn from(data: CurveData) -> Self {
        let mut keys = data.keys;
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        let mut curve = Self {
            pre_infinity_extrap: data.pre_infinity_extrap,
            post_infinity_extrap: data.post_infinity_extrap,
            keys: Vec::new(),
            handles: KeyHandleMap::new(),
            default_value: data.default_value.filter(|value| *value != UNSET_DEFAULT_VALUE),
            settings: data.settings,
        };
        curve.set_keys(keys);
        curve
    }
}

impl From<EditableCurve> for CurveData {
    fn from(curve: EditableCurve) -> Self {
        Self {
            pre_infinity_extrap: curve.pre_infinity_extrap,
            post_infinity_extrap: curve.post_infinity_extrap,
            keys: curve.keys,
            default_value: curve.default_value,
            settings: curve.settings,
        }
    }
}

impl EditableCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Curve over `keys`, sorted by time first.
    pub fn from_keys(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        let mut curve = Self::new();
        curve.set_keys(keys);
        curve
    }

    pub fn with_settings(settings: CurveSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in time order.
    #[inline]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    #[inline]
    pub fn settings(&self) -> &CurveSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CurveSettings) {
        self.settings = settings;
    }

    #[inline]
    pub fn extrapolation(&self) -> InfinityExtrap {
        InfinityExtrap::new(self.pre_infinity_extrap, self.post_infinity_extrap)
    }

    pub fn set_extrapolation(&mut self, extrap: InfinityExtrap) {
        self.pre_infinity_extrap = extrap.pre;
        self.post_infinity_extrap = extrap.post;
    }

    /// Curve-level default returned by keyless evaluation, overriding the caller's default.
    #[inline]
    pub fn default_value(&self) -> Option<f32> {
        self.default_value
    }

    /// Store a curve-level default.
    ///
    /// [`UNSET_DEFAULT_VALUE`] marks "no default" in the packed form, so passing it
    /// clears the default instead.
    pub fn set_default_value(&mut self, value: f32) {
        if value == UNSET_DEFAULT_VALUE {
            warn!("default value {value} is reserved for an unset default; clearing it");
            self.default_value = None;
            return;
        }
        self.default_value = Some(value);
    }

    pub fn clear_default_value(&mut self) {
        self.default_value = None;
    }

    /// Evaluate the curve at `time`.
    pub fn eval(&self, time: f32, default_value: f32) -> f32 {
        let default_value = self.default_value.unwrap_or(default_value);
        eval_keys(
            self.keys.as_slice(),
            self.pre_infinity_extrap,
            self.post_infinity_extrap,
            time,
            default_value,
        )
    }

    pub fn compress(&self, settings: &CompressionSettings) -> CompressedCurve {
        CompressedCurve::compress(self, settings)
    }

    // ---- structural edits ----

    /// Insert a cubic auto-tangent key at `time`.
    ///
    /// With `unwind_rotation`, `value` is moved by whole turns to within 180 degrees of the
    /// preceding key. `handle` is used for the new key when it is valid and unused.
    pub fn add_key(
        &mut self,
        time: f32,
        value: f32,
        unwind_rotation: bool,
        handle: Option<KeyHandle>,
    ) -> KeyHandle {
        let mut key = Keyframe::new(time, value);
        if unwind_rotation {
            let index = self.insertion_index(time);
            if index > 0 {
                key.value = unwind_degrees(value, self.keys[index - 1].value);
            }
        }
        let handle = self.insert_key(key, handle);
        self.auto_set_tangents(self.settings.auto_tangent_tension);
        handle
    }

    /// Insert a fully specified key.
    pub fn add_keyframe(&mut self, key: Keyframe) -> KeyHandle {
        let handle = self.insert_key(key, None);
        self.auto_set_tangents(self.settings.auto_tangent_tension);
        handle
    }

    /// Remove the key named by `handle`. Unknown handles are a caller bug.
    pub fn delete_key(&mut self, handle: KeyHandle) {
        debug_assert!(
            self.handles.contains(handle),
            "delete_key: unknown key handle {handle:?}"
        );
        let Some(index) = self.handles.remove(handle) else {
            warn!("delete_key ignored unknown key handle {}", handle.raw());
            return;
        };
        self.keys.remove(index);
        self.auto_set_tangents(self.settings.auto_tangent_tension);
    }

    /// Replace every key. `keys` must already be sorted by time; each key gets a fresh handle.
    pub fn set_keys(&mut self, keys: Vec<Keyframe>) {
        debug_assert!(
            keys.windows(2).all(|pair| pair[0].time <= pair[1].time),
            "set_keys expects keys sorted by time"
        );
        let handles = (0..keys.len()).map(|_| KeyHandle::new()).collect();
        self.keys = keys;
        self.handles = KeyHandleMap::from_handles(handles);
        self.auto_set_tangents(self.settings.auto_tangent_tension);
    }

    /// Overwrite the value of the key within `tolerance` of `time`, or insert a new key.
    pub fn update_or_add_key(&mut self, time: f32, value: f32, tolerance: f32) -> KeyHandle {
        for index in 0..self.keys.len() {
            let key_time = self.keys[index].time;
            if (key_time - time).abs() <= tolerance {
                self.keys[index].value = value;
                self.auto_set_tangents(self.settings.auto_tangent_tension);
                return self.handle_at(index);
            }
            if key_time > time {
                break;
            }
        }
        self.add_key(time, value, false, None)
    }

    /// Remove every key.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.handles.clear();
    }

    /// Move every key by `delta_time`.
    pub fn shift_curve(&mut self, delta_time: f32) {
        for key in &mut self.keys {
            key.time += delta_time;
        }
    }

    /// Scale key times around `origin`. Tangents are rescaled so segment shapes are kept.
    pub fn scale_curve(&mut self, origin: f32, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            warn!("scale_curve ignored non-positive factor {factor}");
            return;
        }
        for key in &mut self.keys {
            key.time = origin + (key.time - origin) * factor;
            key.arrive_tangent /= factor;
            key.leave_tangent /= factor;
        }
        self.auto_set_tangents(self.settings.auto_tangent_tension);
    }

    /// Recompute tangents of cubic `Auto` keys from their neighbours.
    ///
    /// Boundary keys get flat tangents; a side facing a `Constant` neighbour is flat too.
    pub fn auto_set_tangents(&mut self, tension: f32) {
        for index in 0..self.keys.len() {
            let key = self.keys[index];
            if key.interp_mode != InterpMode::Cubic || key.tangent_mode != TangentMode::Auto {
                continue;
            }
            let prev = index.checked_sub(1).map(|i| self.keys[i]);
            let next = self.keys.get(index + 1).copied();
            let tangent = match (prev, next) {
                (Some(p), Some(n)) => auto_tangent(p.time, p.value, n.time, n.value, tension),
                _ => 0.0,
            };
            let key = &mut self.keys[index];
            key.arrive_tangent = if prev.is_some_and(|p| p.interp_mode == InterpMode::Constant) {
                0.0
            } else {
                tangent
            };
            key.leave_tangent = if next.is_some_and(|n| n.interp_mode == InterpMode::Constant) {
                0.0
            } else {
                tangent
            };
        }
    }

    // ---- handle queries ----

    #[inline]
    pub fn key(&self, handle: KeyHandle) -> Option<&Keyframe> {
        self.handles.find_index(handle).map(|index| &self.keys[index])
    }

    #[inline]
    pub fn key_index(&self, handle: KeyHandle) -> Option<usize> {
        self.handles.find_index(handle)
    }

    #[inline]
    pub fn key_handle(&self, index: usize) -> Option<KeyHandle> {
        self.handles.find_key(index)
    }

    /// Handles in time order.
    pub fn key_handles(&self) -> impl Iterator<Item = KeyHandle> + '_ {
        self.handles.handles().iter().copied()
    }

    #[inline]
    pub fn is_key_handle_valid(&self, handle: KeyHandle) -> bool {
        handle.is_valid() && self.handles.contains(handle)
    }

    pub fn first_key(&self) -> Option<KeyHandle> {
        self.handles.find_key(0)
    }

    pub fn last_key(&self) -> Option<KeyHandle> {
        self.keys
            .len()
            .checked_sub(1)
            .and_then(|index| self.handles.find_key(index))
    }

    pub fn next_key(&self, handle: KeyHandle) -> Option<KeyHandle> {
        let index = self.handles.find_index(handle)?;
        self.handles.find_key(index + 1)
    }

    pub fn previous_key(&self, handle: KeyHandle) -> Option<KeyHandle> {
        let index = self.handles.find_index(handle)?;
        self.handles.find_key(index.checked_sub(1)?)
    }

    /// Handle of the first key within `tolerance` of `time`.
    pub fn find_key(&self, time: f32, tolerance: f32) -> Option<KeyHandle> {
        let index = self
            .keys
            .iter()
            .take_while(|key| key.time <= time + tolerance)
            .position(|key| (key.time - time).abs() <= tolerance)?;
        self.handles.find_key(index)
    }

    pub fn key_exists_at_time(&self, time: f32, tolerance: f32) -> bool {
        self.find_key(time, tolerance).is_some()
    }

    /// First and last key times.
    pub fn time_range(&self) -> Option<(f32, f32)> {
        Some((self.keys.first()?.time, self.keys.last()?.time))
    }

    /// Smallest and largest key values.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let first = self.keys.first()?.value;
        Some(self.keys.iter().fold((first, first), |(lo, hi), key| {
            (lo.min(key.value), hi.max(key.value))
        }))
    }

    // ---- per-key accessors ----

    pub fn key_time(&self, handle: KeyHandle) -> Option<f32> {
        self.key(handle).map(|key| key.time)
    }

    pub fn key_value(&self, handle: KeyHandle) -> Option<f32> {
        self.key(handle).map(|key| key.value)
    }

    pub fn key_interp_mode(&self, handle: KeyHandle) -> Option<InterpMode> {
        self.key(handle).map(|key| key.interp_mode)
    }

    pub fn key_tangent_mode(&self, handle: KeyHandle) -> Option<TangentMode> {
        self.key(handle).map(|key| key.tangent_mode)
    }

    pub fn key_tangent_weight_mode(&self, handle: KeyHandle) -> Option<TangentWeightMode> {
        self.key(handle).map(|key| key.tangent_weight_mode)
    }

    /// Move a key in time, re-sorting while keeping its handle.
    pub fn set_key_time(&mut self, handle: KeyHandle, time: f32) {
        let Some(index) = self.handles.remove(handle) else {
            return;
        };
        let mut key = self.keys.remove(index);
        key.time = time;
        self.insert_key(key, Some(handle));
        self.auto_set_tangents(self.settings.auto_tangent_tension);
    }

    pub fn set_key_value(&mut self, handle: KeyHandle, value: f32, auto_set_tangents: bool) {
        if let Some(key) = self.key_mut(handle) {
            key.value = value;
            if auto_set_tangents {
                self.auto_set_tangents(self.settings.auto_tangent_tension);
            }
        }
    }

    pub fn set_key_interp_mode(&mut self, handle: KeyHandle, mode: InterpMode) {
        if let Some(key) = self.key_mut(handle) {
            key.interp_mode = mode;
            self.auto_set_tangents(self.settings.auto_tangent_tension);
        }
    }

    pub fn set_key_tangent_mode(&mut self, handle: KeyHandle, mode: TangentMode) {
        if let Some(key) = self.key_mut(handle) {
            key.tangent_mode = mode;
            self.auto_set_tangents(self.settings.auto_tangent_tension);
        }
    }

    pub fn set_key_tangent_weight_mode(&mut self, handle: KeyHandle, mode: TangentWeightMode) {
        if let Some(key) = self.key_mut(handle) {
            key.tangent_weight_mode = mode;
        }
    }

    /// Author both tangents. `Auto` keys become `User` (or `Break` when the sides differ).
    pub fn set_key_tangents(&mut self, handle: KeyHandle, arrive: f32, leave: f32) {
        if let Some(key) = self.key_mut(handle) {
            key.arrive_tangent = arrive;
            key.leave_tangent = leave;
            key.tangent_mode = match key.tangent_mode {
                TangentMode::Break => TangentMode::Break,
                _ if arrive == leave => TangentMode::User,
                _ => TangentMode::Break,
            };
        }
    }

    pub fn set_key_tangent_weights(&mut self, handle: KeyHandle, arrive: f32, leave: f32) {
        if let Some(key) = self.key_mut(handle) {
            key.arrive_tangent_weight = arrive;
            key.leave_tangent_weight = leave;
        }
    }

    // ---- internals ----

    #[inline]
    fn key_mut(&mut self, handle: KeyHandle) -> Option<&mut Keyframe> {
        let index = self.handles.find_index(handle)?;
        self.keys.get_mut(index)
    }

    /// Index before the first key at or after `time`.
    #[inline]
    fn insertion_index(&self, time: f32) -> usize {
        self.keys
            .iter()
            .position(|key| key.time >= time)
            .unwrap_or(self.keys.len())
    }

    /// Handle at `index`, allocating one if the slot has none.
    fn handle_at(&mut self, index: usize) -> KeyHandle {
        self.handles.ensure_all_indices_have_handles(self.keys.len());
        self.handles.find_key(index).unwrap_or(KeyHandle::INVALID)
    }

    fn insert_key(&mut self, key: Keyframe, handle: Option<KeyHandle>) -> KeyHandle {
        let index = self.insertion_index(key.time);
        let handle = match handle {
            Some(handle) if handle.is_valid() && !self.handles.contains(handle) => handle,
            _ => KeyHandle::new(),
        };
        self.keys.insert(index, key);
        self.handles.add(handle, index);
        handle
    }
}
