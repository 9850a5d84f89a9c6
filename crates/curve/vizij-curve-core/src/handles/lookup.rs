use hashbrown::HashMap;

use super::KeyHandle;

/// Lazy handle table: one optional handle per storage slot plus a position cache.
///
/// The cache may go stale when slots move; a cached index is trusted only while
/// `slots[index] == handle`, otherwise the slots are scanned and the cache refreshed.
/// Handles are created on demand the first time a caller asks for one.
#[derive(Clone, Debug, Default)]
pub struct KeyHandleLookupTable {
    slots: Vec<Option<KeyHandle>>,
    cache: HashMap<KeyHandle, usize>,
}

impl KeyHandleLookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots (allocated or not).
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolve `handle` to its current slot, repairing the cache when needed.
    pub fn get_index(&mut self, handle: KeyHandle) -> Option<usize> {
        if let Some(&cached) = self.cache.get(&handle) {
            if self.slots.get(cached).copied().flatten() == Some(handle) {
                return Some(cached);
            }
        }

        match self.slots.iter().position(|slot| *slot == Some(handle)) {
            Some(index) => {
                self.cache.insert(handle, index);
                Some(index)
            }
            None => {
                self.cache.remove(&handle);
                None
            }
        }
    }

    /// Handle for `index`, allocating one if the slot has none yet.
    pub fn find_or_add_handle(&mut self, index: usize) -> KeyHandle {
        if let Some(Some(existing)) = self.slots.get(index) {
            return *existing;
        }
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        let handle = KeyHandle::new();
        self.slots[index] = Some(handle);
        self.cache.insert(handle, index);
        handle
    }

    /// Move the slot at `old_index` to `new_index`, keeping its handle.
    pub fn move_handle(&mut self, old_index: usize, new_index: usize) {
        if old_index >= self.slots.len() {
            return;
        }
        let slot = self.slots.remove(old_index);
        let new_index = new_index.min(self.slots.len());
        self.slots.insert(new_index, slot);
        if let Some(handle) = slot {
            self.cache.insert(handle, new_index);
        }
    }

    /// Insert a new slot at `index` carrying a fresh handle.
    pub fn allocate_handle(&mut self, index: usize) -> KeyHandle {
        let handle = KeyHandle::new();
        if index > self.slots.len() {
            self.slots.resize(index, None);
        }
        self.slots.insert(index, Some(handle));
        self.cache.insert(handle, index);
        handle
    }

    /// Remove the slot at `index`, forgetting its handle if it had one.
    pub fn deallocate_handle(&mut self, index: usize) {
        if index >= self.slots.len() {
            return;
        }
        if let Some(handle) = self.slots.remove(index) {
            self.cache.remove(&handle);
        }
    }

    pub fn reset(&mut self) {
        self.slots.clear();
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_cache_is_repaired_by_scan() {
        let mut table = KeyHandleLookupTable::new();
        let first = table.allocate_handle(0);
        let second = table.allocate_handle(1);
        // Inserting at the front leaves both cached indices stale.
        let front = table.allocate_handle(0);
        assert_eq!(table.get_index(front), Some(0));
        assert_eq!(table.get_index(first), Some(1));
        assert_eq!(table.get_index(second), Some(2));
    }

    #[test]
    fn uncached_handle_is_found_by_scan() {
        let mut table = KeyHandleLookupTable::new();
        table.allocate_handle(0);
        let h = table.allocate_handle(1);
        table.cache.remove(&h);
        assert_eq!(table.get_index(h), Some(1));
        assert_eq!(table.cache.get(&h), Some(&1));
        assert_eq!(table.get_index(KeyHandle::new()), None);
    }

    #[test]
    fn find_or_add_is_idempotent_and_grows() {
        let mut table = KeyHandleLookupTable::new();
        let h = table.find_or_add_handle(3);
        assert_eq!(table.len(), 4);
        assert_eq!(table.find_or_add_handle(3), h);
        assert_eq!(table.get_index(h), Some(3));
    }

    #[test]
    fn deallocated_handles_are_not_found() {
        let mut table = KeyHandleLookupTable::new();
        let a = table.allocate_handle(0);
        let b = table.allocate_handle(1);
        table.deallocate_handle(0);
        assert_eq!(table.get_index(a), None);
        assert_eq!(table.get_index(b), Some(0));
    }

    #[test]
    fn move_keeps_identity() {
        let mut table = KeyHandleLookupTable::new();
        let a = table.allocate_handle(0);
        let b = table.allocate_handle(1);
        let c = table.allocate_handle(2);
        table.move_handle(0, 2);
        assert_eq!(table.get_index(a), Some(2));
        assert_eq!(table.get_index(b), Some(0));
        assert_eq!(table.get_index(c), Some(1));
    }
}
