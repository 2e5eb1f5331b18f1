mod errors;
mod import_id_set;
mod import_id_set_config;
mod undefined_size;

pub use errors::ImportIdSetError;
pub use import_id_set::ImportIdSet;
pub use import_id_set_config::{ImportIdSetConfig, IndexEntryLimit};
pub use undefined_size::UndefinedSize;
