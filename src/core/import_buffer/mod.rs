mod import_buffer;
mod import_metrics;
mod posting_store;

pub use import_buffer::{FlushMode, ImportBuffer};
pub use import_metrics::ImportMetrics;
pub use posting_store::{MemoryPostingStore, PostingStore};
