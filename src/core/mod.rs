pub mod codec;
pub mod import_buffer;
pub mod posting_list;
pub mod sorted_ids;

pub use codec::{BigEndianIdCodec, CodecError, StoredPosting, StoredPostingDecoder};
pub use import_buffer::{FlushMode, ImportBuffer, ImportMetrics, MemoryPostingStore, PostingStore};
pub use posting_list::{ImportIdSet, ImportIdSetConfig, ImportIdSetError, IndexEntryLimit, UndefinedSize};
pub use sorted_ids::SortedIdArray;
