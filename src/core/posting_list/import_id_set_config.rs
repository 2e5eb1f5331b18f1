use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use super::{ImportIdSet, ImportIdSetError};
use crate::common::constants::{DEFAULT_INDEX_ENTRY_LIMIT, IMPORT_ID_SET_CONFIG_FILE, MAX_INITIAL_CAPACITY};
use crate::common::file_operations::{atomic_save_json, read_json, FileOperationError};

/// Maximum number of entry ids a posting list may hold before it degenerates.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum IndexEntryLimit {
    #[serde(rename = "limited")]
    Limited(usize),

    /// Never degenerate.
    #[serde(rename = "unlimited")]
    Unlimited,
}

impl Default for IndexEntryLimit {
    fn default() -> Self {
        IndexEntryLimit::Limited(DEFAULT_INDEX_ENTRY_LIMIT)
    }
}

impl IndexEntryLimit {
    /// `true` when a posting of `count` ids would be over the limit.
    pub fn is_exceeded_by(&self, count: usize) -> bool {
        match self {
            IndexEntryLimit::Limited(limit) => count > *limit,
            IndexEntryLimit::Unlimited => false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Default, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub struct ImportIdSetConfig {
    #[serde(default)]
    #[serde(rename = "initial_capacity")]
    pub initial_capacity_hint: usize,

    #[serde(default)]
    #[serde(rename = "index_entry_limit")]
    pub index_entry_limit: IndexEntryLimit,

    #[serde(default)]
    #[serde(rename = "maintain_count")]
    pub maintain_count: bool,
}

impl ImportIdSetConfig {
    pub fn new(
        initial_capacity_hint: usize,
        index_entry_limit: IndexEntryLimit,
        maintain_count: bool,
    ) -> Result<Self, ImportIdSetError> {
        let config = ImportIdSetConfig { initial_capacity_hint, index_entry_limit, maintain_count };
        config.is_valid()?;
        Ok(config)
    }

    pub fn is_valid(&self) -> Result<bool, ImportIdSetError> {
        if self.initial_capacity_hint > MAX_INITIAL_CAPACITY {
            return Err(ImportIdSetError::InvalidConfig(format!(
                "initial capacity {} exceeds the maximum of {} entry ids.",
                self.initial_capacity_hint, MAX_INITIAL_CAPACITY
            )));
        }
        Ok(true)
    }

    /// A fresh, empty id set for one index key.
    pub fn new_id_set(&self) -> ImportIdSet {
        let mut capacity = self.initial_capacity_hint;
        if let IndexEntryLimit::Limited(limit) = self.index_entry_limit {
            if capacity > limit {
                warn!("Initial capacity {} is larger than the index entry limit {}, clamping it.", capacity, limit);
                capacity = limit;
            }
        }
        ImportIdSet::new(capacity, self.index_entry_limit, self.maintain_count)
    }

    /// An id set without preallocation, used to receive a stored merge.
    pub fn new_receiver(&self) -> ImportIdSet {
        ImportIdSet::with_policy(self.index_entry_limit, self.maintain_count)
    }

    pub fn load(directory: &Path) -> Result<Self, FileOperationError> {
        let file_path = directory.join(IMPORT_ID_SET_CONFIG_FILE);
        read_json(&file_path)
    }

    pub fn save(&self, directory: &Path) -> Result<(), FileOperationError> {
        let file_path = directory.join(IMPORT_ID_SET_CONFIG_FILE);
        if !directory.exists() {
            std::fs::create_dir_all(directory).map_err(FileOperationError::IoError)?;
        }
        atomic_save_json(&file_path, self)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::common::constants::IMPORT_ID_SET_HEADROOM;

    #[test]
    fn test_parse_config() {
        let empty_config: ImportIdSetConfig = serde_json::from_str("{}").expect("");
        assert_eq!(
            empty_config,
            ImportIdSetConfig::new(0, IndexEntryLimit::Limited(DEFAULT_INDEX_ENTRY_LIMIT), false).expect("")
        );

        let config = "{\"initial_capacity\":16,\"index_entry_limit\":\"unlimited\",\"maintain_count\":true}";
        let config: ImportIdSetConfig = serde_json::from_str(config).expect("");
        assert_eq!(config, ImportIdSetConfig::new(16, IndexEntryLimit::Unlimited, true).expect(""));

        let config = "{\"index_entry_limit\":{\"limited\":10}}";
        let config: ImportIdSetConfig = serde_json::from_str(config).expect("");
        assert_eq!(config.index_entry_limit, IndexEntryLimit::Limited(10));
    }

    #[test]
    fn test_invalid_capacity() {
        let res = ImportIdSetConfig::new(MAX_INITIAL_CAPACITY + 1, IndexEntryLimit::Unlimited, false);
        assert!(matches!(res, Err(ImportIdSetError::InvalidConfig(_))));
    }

    #[test]
    fn test_limit_exceeded_by() {
        assert!(!IndexEntryLimit::Limited(3).is_exceeded_by(3));
        assert!(IndexEntryLimit::Limited(3).is_exceeded_by(4));
        assert!(IndexEntryLimit::Limited(0).is_exceeded_by(1));
        assert!(!IndexEntryLimit::Unlimited.is_exceeded_by(usize::MAX));
    }

    #[test]
    fn test_new_id_set_clamps_capacity() {
        let config = ImportIdSetConfig::new(1000, IndexEntryLimit::Limited(10), true).expect("");
        let id_set = config.new_id_set();
        assert!(id_set.is_defined());
        assert_eq!(id_set.capacity(), 10 + IMPORT_ID_SET_HEADROOM);
        assert_eq!(id_set.limit(), IndexEntryLimit::Limited(10));
        assert!(id_set.maintain_count());
        assert_eq!(config.new_receiver().capacity(), 0);
    }

    #[test]
    fn test_load_and_save() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let directory = temp_dir.path().join("nested");

        let config = ImportIdSetConfig::new(64, IndexEntryLimit::Limited(500), true).expect("");
        config.save(&directory).expect("Failed to save config");

        let loaded_config = ImportIdSetConfig::load(&directory).expect("Failed to load config");
        assert_eq!(config, loaded_config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let res = ImportIdSetConfig::load(temp_dir.path());
        assert!(matches!(res, Err(FileOperationError::IoError(_))));
    }
}
