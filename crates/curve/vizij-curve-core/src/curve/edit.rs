//! Bulk edits: redundant-key removal and time-range readjustment.

use log::trace;

use super::EditableCurve;
use crate::handles::KeyHandle;
use crate::sampling::eval_key_pair;

impl EditableCurve {
    /// Greedily drop interior keys that the segment between their retained neighbours
    /// predicts within `tolerance`.
    ///
    /// Only keys inside `time_range` (inclusive, whole curve when `None`) are considered.
    /// The first and last key of that range are always kept, and kept keys keep their handles.
    pub fn remove_redundant_keys(&mut self, tolerance: f32, time_range: Option<(f32, f32)>) {
        let (start, end) = match time_range {
            None if self.keys.is_empty() => return,
            None => (0, self.keys.len() - 1),
            Some((lo, hi)) => {
                let start = self.keys.iter().position(|key| key.time >= lo);
                let end = self.keys.iter().rposition(|key| key.time <= hi);
                match (start, end) {
                    (Some(start), Some(end)) => (start, end),
                    _ => return,
                }
            }
        };
        if end < start + 2 {
            return;
        }

        let mut keep = vec![true; self.keys.len()];
        let mut last_kept = start;
        for test in start + 1..end {
            // Every key dropped since `last_kept` must still fit the widened segment.
            let (from, to) = (&self.keys[last_kept], &self.keys[test + 1]);
            let redundant = self.keys[last_kept + 1..=test]
                .iter()
                .all(|key| (eval_key_pair(from, to, key.time) - key.value).abs() <= tolerance);
            if redundant {
                keep[test] = false;
            } else {
                last_kept = test;
            }
        }

        let removed = keep.iter().filter(|kept| !**kept).count();
        if removed == 0 {
            return;
        }
        self.handles.ensure_all_indices_have_handles(self.keys.len());
        let mut keys = Vec::with_capacity(self.keys.len() - removed);
        let mut handles = Vec::with_capacity(self.keys.len() - removed);
        for (index, key) in self.keys.iter().enumerate() {
            if keep[index] {
                keys.push(*key);
                handles.push(self.handles.find_key(index).unwrap_or_else(KeyHandle::new));
            }
        }
        trace!("removed {removed} redundant keys in [{start}, {end}]");
        self.keys = keys;
        self.handles.set_key_handles(handles);
    }

    /// Follow an edit of the containing time range.
    ///
    /// With `insert`, keys at or after `old_start` move later by `old_end - old_start`.
    /// Otherwise keys inside `[old_start, old_end]` collapse into one key at `old_start`
    /// carrying the value at the cut (`old_end` when `old_start` is zero), and later keys
    /// move earlier by the removed duration. Finally the curve is clamped to
    /// `[new_min, new_max]` with boundary keys holding the values found there.
    pub fn readjust_time_range(
        &mut self,
        new_min: f32,
        new_max: f32,
        insert: bool,
        old_start: f32,
        old_end: f32,
    ) {
        let duration = old_end - old_start;
        let tolerance = self.settings.key_time_tolerance;
        trace!(
            "readjust time range to [{new_min}, {new_max}], {} [{old_start}, {old_end}]",
            if insert { "insert" } else { "remove" }
        );

        if insert {
            for key in &mut self.keys {
                if key.time >= old_start {
                    key.time += duration;
                }
            }
        } else {
            let cut_time = if old_start == 0.0 { old_end } else { old_start };
            let cut_value = self.eval(cut_time, 0.0);

            let mut inside = Vec::new();
            for (index, key) in self.keys.iter_mut().enumerate() {
                if key.time >= old_start && key.time <= old_end {
                    inside.push(index);
                } else if key.time > old_end {
                    key.time -= duration;
                }
            }
            if !inside.is_empty() {
                self.handles.ensure_all_indices_have_handles(self.keys.len());
                let doomed: Vec<KeyHandle> = inside
                    .iter()
                    .filter_map(|index| self.handles.find_key(*index))
                    .collect();
                for handle in doomed {
                    self.delete_key(handle);
                }
                self.update_or_add_key(old_start, cut_value, tolerance);
            }
        }

        self.clamp_to_range(new_min, new_max, tolerance);
    }

    fn clamp_to_range(&mut self, new_min: f32, new_max: f32, tolerance: f32) {
        let Some((first, last)) = self.time_range() else {
            return;
        };
        if new_min > new_max {
            return;
        }
        let min_value = self.eval(new_min, 0.0);
        let max_value = self.eval(new_max, 0.0);

        if first < new_min {
            self.update_or_add_key(new_min, min_value, tolerance);
        }
        if last > new_max {
            self.update_or_add_key(new_max, max_value, tolerance);
        }

        let outside: Vec<KeyHandle> = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.time < new_min - tolerance || key.time > new_max + tolerance)
            .filter_map(|(index, _)| self.handles.find_key(index))
            .collect();
        for handle in outside {
            self.delete_key(handle);
        }
    }
}
