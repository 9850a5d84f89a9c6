use hashbrown::HashMap;

use super::KeyHandle;

/// Eager handle <-> index bijection.
///
/// `handles[i]` names the key stored at index `i` and `indices[handles[i]] == i` at all times.
/// [`add`](Self::add) and [`remove`](Self::remove) renumber every stored index past the edit
/// point, so both are O(n) in the number of keys.
#[derive(Clone, Debug, Default)]
pub struct KeyHandleMap {
    indices: HashMap<KeyHandle, usize>,
    handles: Vec<KeyHandle>,
}

impl KeyHandleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map whose handles follow `handles` by position.
    pub fn from_handles(handles: Vec<KeyHandle>) -> Self {
        let mut map = Self::default();
        map.set_key_handles(handles);
        map
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Insert `handle` at `index`, shifting every stored index `>= index` up by one.
    ///
    /// When `index` lies past the end, the gap is filled with freshly allocated handles.
    pub fn add(&mut self, handle: KeyHandle, index: usize) {
        for stored in self.indices.values_mut() {
            if *stored >= index {
                *stored += 1;
            }
        }

        if index > self.handles.len() {
            self.handles.reserve(index + 1 - self.handles.len());
            for pad in self.handles.len()..index {
                let filler = KeyHandle::new();
                self.handles.push(filler);
                self.indices.insert(filler, pad);
            }
            self.handles.push(handle);
        } else {
            self.handles.insert(index, handle);
        }
        self.indices.insert(handle, index);
        self.debug_check();
    }

    /// Remove `handle`, shifting every stored index past it down by one.
    /// Returns the index the handle occupied.
    pub fn remove(&mut self, handle: KeyHandle) -> Option<usize> {
        let index = self.indices.remove(&handle)?;
        for stored in self.indices.values_mut() {
            if *stored > index {
                *stored -= 1;
            }
        }
        self.handles.remove(index);
        self.debug_check();
        Some(index)
    }

    /// Index currently occupied by `handle`.
    #[inline]
    pub fn find_index(&self, handle: KeyHandle) -> Option<usize> {
        self.indices.get(&handle).copied()
    }

    /// Handle stored at `index`.
    #[inline]
    pub fn find_key(&self, index: usize) -> Option<KeyHandle> {
        self.handles.get(index).copied()
    }

    #[inline]
    pub fn contains(&self, handle: KeyHandle) -> bool {
        self.indices.contains_key(&handle)
    }

    /// Handles in storage order.
    #[inline]
    pub fn handles(&self) -> &[KeyHandle] {
        &self.handles
    }

    /// Replace the whole table with `handles`, numbered by position.
    pub fn set_key_handles(&mut self, handles: Vec<KeyHandle>) {
        self.indices.clear();
        self.indices.reserve(handles.len());
        for (index, handle) in handles.iter().enumerate() {
            self.indices.insert(*handle, index);
        }
        self.handles = handles;
        self.debug_check();
    }

    /// Make sure indices `0..num_indices` all carry a handle.
    pub fn ensure_all_indices_have_handles(&mut self, num_indices: usize) {
        for index in self.handles.len()..num_indices {
            let handle = KeyHandle::new();
            self.handles.push(handle);
            self.indices.insert(handle, index);
        }
    }

    /// Drop every entry past `len`.
    pub fn clear(&mut self) {
        self.indices.clear();
        self.handles.clear();
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert_eq!(
            self.indices.len(),
            self.handles.len(),
            "key handle map lost its bijection"
        );
        debug_assert!(self
            .handles
            .iter()
            .enumerate()
            .all(|(i, h)| self.indices.get(h) == Some(&i)));
    }
}
