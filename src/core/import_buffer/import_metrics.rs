use std::cmp::{max, min};

use crate::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportMetrics {
    pub min_entry_id: EntryId,
    pub max_entry_id: EntryId,

    pub entry_ids_added: u64,
    pub keys_flushed: usize,
    /// Keys reported as newly over their index entry limit.
    pub limit_exceeded_count: usize,
}

impl Default for ImportMetrics {
    fn default() -> Self {
        Self {
            min_entry_id: EntryId::MAX,
            max_entry_id: EntryId::MIN,
            entry_ids_added: 0,
            keys_flushed: 0,
            limit_exceeded_count: 0,
        }
    }
}

impl ImportMetrics {
    pub fn compare_and_update_entry_id(&mut self, other: EntryId) {
        self.min_entry_id = min(self.min_entry_id, other);
        self.max_entry_id = max(self.max_entry_id, other);
    }

    pub fn increase_entry_ids_added(&mut self) {
        self.entry_ids_added += 1;
    }

    pub fn increase_keys_flushed(&mut self) {
        self.keys_flushed += 1;
    }

    pub fn increase_limit_exceeded(&mut self) {
        self.limit_exceeded_count += 1;
    }

    pub fn merge(&mut self, other: &ImportMetrics) {
        self.min_entry_id = min(self.min_entry_id, other.min_entry_id);
        self.max_entry_id = max(self.max_entry_id, other.max_entry_id);
        self.entry_ids_added += other.entry_ids_added;
        self.keys_flushed += other.keys_flushed;
        self.limit_exceeded_count += other.limit_exceeded_count;
    }
}
