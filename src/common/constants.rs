/// Extra slots reserved on top of the caller's capacity hint, so the first
/// few inserts into a fresh set never reallocate.
pub const IMPORT_ID_SET_HEADROOM: usize = 128;

/// Customary index entry limit of a directory server backend.
pub const DEFAULT_INDEX_ENTRY_LIMIT: usize = 4000;

/// Upper bound for `initial_capacity_hint` (2^28 slots, 2GiB of entry ids).
pub const MAX_INITIAL_CAPACITY: usize = 1 << 28;

pub const IMPORT_ID_SET_CONFIG_FILE: &str = "import_id_set_config.json";

/// Log target used when only this crate's records should be kept.
pub const LOG_TARGET: &str = "import_id_set";
