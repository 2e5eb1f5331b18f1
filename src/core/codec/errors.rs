use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Encoded entry id list has {0} bytes, expected a multiple of 8")]
    MisalignedLength(usize),

    #[error("Encoded entry ids are not strictly ascending at position {position}: {previous} >= {current}")]
    UnsortedEntryIds { position: usize, previous: u64, current: u64 },
}
