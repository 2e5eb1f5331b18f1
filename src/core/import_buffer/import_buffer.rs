use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;
use typed_builder::TypedBuilder;

use super::{ImportMetrics, PostingStore};
use crate::common::errors::ImportIdSetLibError;
use crate::core::{ImportIdSet, ImportIdSetConfig, ImportIdSetError, StoredPostingDecoder};
use crate::EntryId;

/// What a flush does with the buffered ids of each key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Merge buffered ids into the stored posting.
    Insert,
    /// Remove buffered ids from the stored posting.
    Delete,
}

/// Entry ids buffered by one import worker, grouped by index key.
#[derive(TypedBuilder)]
pub struct ImportBuffer {
    config: ImportIdSetConfig,

    #[builder(default = BTreeMap::new())]
    id_sets: BTreeMap<Vec<u8>, ImportIdSet>,

    #[builder(default = 0)]
    memory_consumed: usize,

    #[builder(default = ImportMetrics::default())]
    metrics: ImportMetrics,
}

impl ImportBuffer {
    pub fn new(config: ImportIdSetConfig) -> Self {
        ImportBuffer::builder().config(config).build()
    }

    pub fn config(&self) -> &ImportIdSetConfig {
        &self.config
    }

    /// Number of distinct keys buffered.
    pub fn len(&self) -> usize {
        self.id_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_sets.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Option<&ImportIdSet> {
        self.id_sets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.id_sets.keys().map(|key| key.as_slice())
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_consumed
    }

    pub fn metrics(&self) -> &ImportMetrics {
        &self.metrics
    }

    fn compute_memory_usage(&self) -> usize {
        self.id_sets.values().map(|id_set| id_set.memory_usage()).sum()
    }
}

impl ImportBuffer {
    pub fn add(&mut self, key: &[u8], id: EntryId) {
        if !self.id_sets.contains_key(key) {
            let mut id_set = self.config.new_id_set();
            id_set.set_key(key.to_vec());
            self.memory_consumed = self.memory_consumed.saturating_add(id_set.memory_usage());
            self.id_sets.insert(key.to_vec(), id_set);
        }
        let Some(id_set) = self.id_sets.get_mut(key) else {
            return;
        };

        let memory_before = id_set.memory_usage();
        id_set.add_entry_id(id);
        let memory_after = id_set.memory_usage();
        self.memory_consumed = self.memory_consumed.saturating_add(memory_after).saturating_sub(memory_before);

        self.metrics.increase_entry_ids_added();
        self.metrics.compare_and_update_entry_id(id);
    }

    pub fn add_all<I: IntoIterator<Item = EntryId>>(&mut self, key: &[u8], ids: I) {
        for id in ids {
            self.add(key, id);
        }
    }

    /// Folds another worker's buffer into this one, key by key. Both buffers
    /// must share the index entry limit and the counting policy; on a
    /// mismatch nothing is merged.
    pub fn merge_buffer(&mut self, other: ImportBuffer) -> Result<(), ImportIdSetError> {
        if self.config.index_entry_limit != other.config.index_entry_limit
            || self.config.maintain_count != other.config.maintain_count
        {
            warn!("Can't merge import buffers built with different configs: {:?} and {:?}", self.config, other.config);
            return Err(ImportIdSetError::InvalidConfig(format!(
                "limit {:?} and maintain_count {} don't match limit {:?} and maintain_count {}",
                other.config.index_entry_limit,
                other.config.maintain_count,
                self.config.index_entry_limit,
                self.config.maintain_count
            )));
        }
        for (key, id_set) in other.id_sets {
            match self.id_sets.get_mut(&key) {
                Some(existing) => existing.merge(&id_set),
                None => {
                    self.id_sets.insert(key, id_set);
                }
            }
        }
        self.metrics.merge(&other.metrics);
        self.memory_consumed = self.compute_memory_usage();
        Ok(())
    }

    /// Reduces per-worker buffers into one, `None` for no buffers. Each
    /// pairwise merge owns both buffers, so a key is only ever merged by one
    /// thread at a time.
    pub fn merge_partitions(buffers: Vec<ImportBuffer>) -> Result<Option<ImportBuffer>, ImportIdSetError> {
        buffers
            .into_par_iter()
            .map(Ok::<ImportBuffer, ImportIdSetError>)
            .try_reduce_with(|mut left, right| {
                left.merge_buffer(right)?;
                Ok(left)
            })
            .transpose()
    }

    /// ## brief
    /// Write every buffered key to `store`, merging with (or removing from)
    /// the posting already stored under that key. A key leaves the buffer as
    /// soon as its posting is written, so on error only the unwritten keys
    /// remain and a retry never applies a key twice.
    /// ## return
    /// The metrics of this flush alone.
    pub fn flush<S: PostingStore, D: StoredPostingDecoder>(
        &mut self,
        store: &mut S,
        decoder: &D,
        mode: FlushMode,
    ) -> Result<ImportMetrics, ImportIdSetLibError> {
        let mut flushed = ImportMetrics::default();

        while let Some((key, id_set)) = self.id_sets.pop_first() {
            if let Err(e) = self.flush_id_set(store, decoder, mode, &key, &id_set, &mut flushed) {
                self.id_sets.insert(key, id_set);
                self.memory_consumed = self.compute_memory_usage();
                self.metrics.merge(&flushed);
                warn!("Flush ({:?}) stopped after {} keys, {} keys left: {}", mode, flushed.keys_flushed, self.len(), e);
                return Err(e);
            }
            self.memory_consumed = self.memory_consumed.saturating_sub(id_set.memory_usage());
        }

        info!(
            "Flushed {} keys ({:?}), {} newly over the index entry limit.",
            flushed.keys_flushed, mode, flushed.limit_exceeded_count
        );
        self.metrics.merge(&flushed);
        self.memory_consumed = 0;
        Ok(flushed)
    }

    fn flush_id_set<S: PostingStore, D: StoredPostingDecoder>(
        &self,
        store: &mut S,
        decoder: &D,
        mode: FlushMode,
        key: &[u8],
        id_set: &ImportIdSet,
        flushed: &mut ImportMetrics,
    ) -> Result<(), ImportIdSetLibError> {
        let (bytes, limit_exceeded) = match (mode, store.get(key)?) {
            (FlushMode::Insert, None) => (id_set.to_database(), !id_set.is_defined() && !self.config.maintain_count),
            (FlushMode::Insert, Some(stored)) => {
                // merging may mark the incoming set undefined; the buffered
                // set must stay as it was until the write succeeds.
                let mut incoming = id_set.clone();
                let mut receiver = self.config.new_receiver();
                let limit_exceeded = receiver.merge_stored(&stored, &mut incoming, decoder)?;
                (receiver.to_database(), limit_exceeded)
            }
            (FlushMode::Delete, None) => return Ok(()),
            (FlushMode::Delete, Some(stored)) => {
                let mut to_remove = id_set.clone();
                let mut receiver = self.config.new_receiver();
                receiver.remove_stored(&stored, &mut to_remove, decoder)?;
                (receiver.to_database(), false)
            }
        };
        store.put(key.to_vec(), bytes)?;
        if limit_exceeded {
            flushed.increase_limit_exceeded();
        }
        flushed.increase_keys_flushed();
        Ok(())
    }
}
