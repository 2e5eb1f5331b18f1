use std::collections::BTreeMap;

use crate::common::errors::ImportIdSetLibError;

/// Where flushed posting lists live. Implemented by the caller's storage
/// layer; all reads and writes of encoded postings go through it.
/// Implementations report their own failures as `ImportIdSetLibError::StoreError`.
pub trait PostingStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ImportIdSetLibError>;

    fn put(&mut self, key: Vec<u8>, bytes: Vec<u8>) -> Result<(), ImportIdSetLibError>;
}

/// Keeps encoded postings in memory, ordered by key.
#[derive(Debug, Default, Clone)]
pub struct MemoryPostingStore {
    postings: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.postings.iter().map(|(key, bytes)| (key.as_slice(), bytes.as_slice()))
    }
}

impl PostingStore for MemoryPostingStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ImportIdSetLibError> {
        Ok(self.postings.get(key).cloned())
    }

    fn put(&mut self, key: Vec<u8>, bytes: Vec<u8>) -> Result<(), ImportIdSetLibError> {
        self.postings.insert(key, bytes);
        Ok(())
    }
}
