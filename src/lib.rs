//! Posting lists for bulk index import.
//!
//! Every index key collects the ids of the entries it matches in an
//! [`ImportIdSet`]: a sorted, deduplicated id array bounded by an index entry
//! limit. Past the limit a set turns undefined and only keeps an approximate
//! size. Sets are merged in memory across import workers and against the
//! encoded postings already in storage when a worker's buffer is flushed.

pub mod common;
pub mod core;

pub use crate::common::{init_logger, ImportIdSetLibError, LoggerConfig};
pub use crate::core::{
    BigEndianIdCodec, CodecError, FlushMode, ImportBuffer, ImportIdSet, ImportIdSetConfig, ImportIdSetError,
    ImportMetrics, IndexEntryLimit, MemoryPostingStore, PostingStore, SortedIdArray, StoredPosting,
    StoredPostingDecoder, UndefinedSize,
};

/// Identifier of a directory entry within one backend.
pub type EntryId = u64;
