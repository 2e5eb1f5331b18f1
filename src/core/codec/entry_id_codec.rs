use byteorder::{BigEndian, ByteOrder};
use log::{error, warn};

use super::CodecError;
use crate::core::UndefinedSize;
use crate::EntryId;

/// Bytes per encoded entry id.
pub const ENCODED_ENTRY_ID_SIZE: usize = 8;

/// Set on the first byte of an undefined posting marker.
pub const UNDEFINED_FLAG: u8 = 0x80;

const UNDEFINED_MARKER_BIT: u64 = 0x8000_0000_0000_0000;

/// Payload written for `UndefinedSize::Unknown`.
const UNKNOWN_SIZE_PAYLOAD: u64 = 0x7FFF_FFFF_FFFF_FFFF;

/// Largest counted size that still decodes as `Counted`.
pub const MAX_COUNTED_UNDEFINED_SIZE: u64 = UNKNOWN_SIZE_PAYLOAD - 1;

/// Only the low 32 bits of an entry id reach the disk.
const ENTRY_ID_WIRE_MASK: u64 = 0x0000_0000_FFFF_FFFF;

/// A posting list as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPosting {
    Defined(Vec<EntryId>),
    Undefined(UndefinedSize),
}

impl StoredPosting {
    pub fn is_defined(&self) -> bool {
        matches!(self, StoredPosting::Defined(_))
    }
}

/// Decodes persisted posting lists. Implemented by the storage layer; the
/// import id set only ever sees stored bytes through this trait.
pub trait StoredPostingDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<StoredPosting, CodecError>;

    fn is_undefined(&self, bytes: &[u8]) -> bool {
        is_undefined_marker(bytes)
    }
}

/// The backend's native format: big-endian 8-byte words.
#[derive(Debug, Default, Clone, Copy)]
pub struct BigEndianIdCodec;

impl StoredPostingDecoder for BigEndianIdCodec {
    fn decode(&self, bytes: &[u8]) -> Result<StoredPosting, CodecError> {
        if is_undefined_marker(bytes) {
            return Ok(StoredPosting::Undefined(decode_undefined_size(bytes)));
        }
        decode_entry_ids(bytes).map(StoredPosting::Defined)
    }
}

pub fn is_undefined_marker(bytes: &[u8]) -> bool {
    bytes.first().map_or(false, |b| b & UNDEFINED_FLAG == UNDEFINED_FLAG)
}

/// A marker that is not exactly one word long carries no usable size.
pub fn decode_undefined_size(bytes: &[u8]) -> UndefinedSize {
    if bytes.len() != ENCODED_ENTRY_ID_SIZE {
        return UndefinedSize::Unknown;
    }
    match BigEndian::read_u64(bytes) & !UNDEFINED_MARKER_BIT {
        UNKNOWN_SIZE_PAYLOAD => UndefinedSize::Unknown,
        size => UndefinedSize::Counted(size),
    }
}

pub fn decode_entry_ids(bytes: &[u8]) -> Result<Vec<EntryId>, CodecError> {
    if bytes.len() % ENCODED_ENTRY_ID_SIZE != 0 {
        error!("Can't decode entry id list, length {} is not aligned to {}", bytes.len(), ENCODED_ENTRY_ID_SIZE);
        return Err(CodecError::MisalignedLength(bytes.len()));
    }
    let mut ids: Vec<EntryId> = Vec::with_capacity(bytes.len() / ENCODED_ENTRY_ID_SIZE);
    for (position, chunk) in bytes.chunks_exact(ENCODED_ENTRY_ID_SIZE).enumerate() {
        let current = BigEndian::read_u64(chunk);
        if let Some(&previous) = ids.last() {
            if previous >= current {
                error!("Stored entry ids are not sorted, position: {}, previous: {}, current: {}", position, previous, current);
                return Err(CodecError::UnsortedEntryIds { position, previous, current });
            }
        }
        ids.push(current);
    }
    Ok(ids)
}

/// Appends one 8-byte word per id to `buffer`.
///
/// `ids` are expected ascending. Ids past 32 bits wrap when masked, so in
/// that case the masked ids are sorted and deduplicated again before
/// writing: the encoded list stays strictly ascending and decodable.
pub fn encode_entry_ids(ids: &[EntryId], buffer: &mut Vec<u8>) {
    if ids.iter().all(|&id| id <= ENTRY_ID_WIRE_MASK) {
        write_entry_ids(ids, buffer);
        return;
    }
    let mut masked: Vec<EntryId> = ids.iter().map(|&id| id & ENTRY_ID_WIRE_MASK).collect();
    masked.sort_unstable();
    masked.dedup();
    warn!(
        "{} entry ids exceed 32 bits and were truncated, {} ids remain after masking",
        ids.iter().filter(|&&id| id > ENTRY_ID_WIRE_MASK).count(),
        masked.len()
    );
    write_entry_ids(&masked, buffer);
}

fn write_entry_ids(ids: &[EntryId], buffer: &mut Vec<u8>) {
    let start = buffer.len();
    buffer.resize(start + ids.len() * ENCODED_ENTRY_ID_SIZE, 0);
    for (chunk, &id) in buffer[start..].chunks_exact_mut(ENCODED_ENTRY_ID_SIZE).zip(ids) {
        BigEndian::write_u64(chunk, id);
    }
}

pub fn encode_undefined_size(size: UndefinedSize, buffer: &mut Vec<u8>) {
    let payload = match size {
        UndefinedSize::Counted(n) => n.min(MAX_COUNTED_UNDEFINED_SIZE),
        UndefinedSize::Unknown => UNKNOWN_SIZE_PAYLOAD,
    };
    let mut word = [0u8; ENCODED_ENTRY_ID_SIZE];
    BigEndian::write_u64(&mut word, payload | UNDEFINED_MARKER_BIT);
    buffer.extend_from_slice(&word);
}
