use std::mem::size_of;

use log::debug;

use super::{IndexEntryLimit, UndefinedSize};
use crate::common::constants::IMPORT_ID_SET_HEADROOM;
use crate::core::codec::{encode_entry_ids, encode_undefined_size, CodecError, StoredPosting, StoredPostingDecoder};
use crate::core::SortedIdArray;
use crate::EntryId;

#[derive(Debug, Clone, PartialEq)]
enum IdSetState {
    Defined(SortedIdArray),
    Undefined(UndefinedSize),
}

/// The entry ids of one index key, accumulated during an import.
///
/// A set starts out defined and holds its ids explicitly. As soon as it
/// would hold more than `limit` ids it becomes undefined: the ids are
/// dropped and only an approximate size (when `maintain_count` is set) is
/// kept. An undefined set never becomes defined again.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportIdSet {
    state: IdSetState,
    limit: IndexEntryLimit,
    maintain_count: bool,
    key: Option<Vec<u8>>,
}

impl std::fmt::Display for ImportIdSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            IdSetState::Defined(ids) => write!(f, "ImportIdSet[defined]{:?}", ids.as_slice()),
            IdSetState::Undefined(size) => write!(f, "ImportIdSet[undefined, size={}]", size),
        }
    }
}

impl ImportIdSet {
    /// Preallocates `initial_capacity_hint` slots plus a fixed headroom.
    pub fn new(initial_capacity_hint: usize, limit: IndexEntryLimit, maintain_count: bool) -> Self {
        Self {
            state: IdSetState::Defined(SortedIdArray::with_capacity(
                initial_capacity_hint.saturating_add(IMPORT_ID_SET_HEADROOM),
            )),
            limit,
            maintain_count,
            key: None,
        }
    }

    pub fn with_policy(limit: IndexEntryLimit, maintain_count: bool) -> Self {
        Self { state: IdSetState::Defined(SortedIdArray::new()), limit, maintain_count, key: None }
    }
}

/// Accessors
impl ImportIdSet {
    pub fn is_defined(&self) -> bool {
        matches!(self.state, IdSetState::Defined(_))
    }

    /// Number of ids held explicitly, `0` once undefined.
    pub fn len(&self) -> usize {
        match &self.state {
            IdSetState::Defined(ids) => ids.len(),
            IdSetState::Undefined(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_defined() && self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.state {
            IdSetState::Defined(ids) => ids.capacity(),
            IdSetState::Undefined(_) => 0,
        }
    }

    /// `None` while the set is defined.
    pub fn undefined_size(&self) -> Option<UndefinedSize> {
        match &self.state {
            IdSetState::Defined(_) => None,
            IdSetState::Undefined(size) => Some(*size),
        }
    }

    /// `None` once the set is undefined.
    pub fn entry_ids(&self) -> Option<&[EntryId]> {
        match &self.state {
            IdSetState::Defined(ids) => Some(ids.as_slice()),
            IdSetState::Undefined(_) => None,
        }
    }

    pub fn limit(&self) -> IndexEntryLimit {
        self.limit
    }

    pub fn maintain_count(&self) -> bool {
        self.maintain_count
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: Vec<u8>) {
        self.key = Some(key);
    }

    /// Bytes held by this set (backing buffer and key).
    pub fn memory_usage(&self) -> usize {
        let ids = match &self.state {
            IdSetState::Defined(ids) => ids.memory_usage(),
            IdSetState::Undefined(_) => size_of::<UndefinedSize>(),
        };
        ids + self.key.as_ref().map_or(0, |key| key.len())
    }
}

/// State transitions
impl ImportIdSet {
    /// Size recorded when a defined set of `total` ids overflows.
    fn overflow_size(&self, total: usize) -> UndefinedSize {
        if self.maintain_count {
            UndefinedSize::Counted(total as u64)
        } else {
            UndefinedSize::Unknown
        }
    }

    /// Drops the explicit ids, releasing the backing buffer.
    fn undefine(&mut self, size: UndefinedSize) {
        if let IdSetState::Defined(ids) = &self.state {
            debug!(
                "Id set for key {:?} exceeded entry limit {:?} ({} ids held), size is now {}",
                self.key, self.limit, ids.len(), size
            );
        }
        self.state = IdSetState::Undefined(size);
    }

    /// Marks the set undefined from the outside, keeping its current count
    /// when counting is enabled. No-op for an undefined set.
    pub(crate) fn set_undefined(&mut self) {
        if let IdSetState::Defined(ids) = &self.state {
            let size = self.overflow_size(ids.len());
            self.undefine(size);
        }
    }

    pub fn add_entry_id(&mut self, id: EntryId) {
        if let IdSetState::Undefined(size) = &mut self.state {
            if self.maintain_count {
                *size = size.add(1);
            }
            return;
        }
        let next = self.len() + 1;
        if self.limit.is_exceeded_by(next) {
            let size = self.overflow_size(next);
            self.undefine(size);
            return;
        }
        if let IdSetState::Defined(ids) = &mut self.state {
            ids.insert(id);
        }
    }

    /// Merges another in-memory set built with the same limit and policy.
    pub fn merge(&mut self, other: &ImportIdSet) {
        let maintain_count = self.maintain_count;
        let transition = match (&mut self.state, &other.state) {
            (IdSetState::Undefined(size), IdSetState::Undefined(other_size)) => {
                if maintain_count {
                    *size = size.combine(*other_size);
                }
                None
            }
            (IdSetState::Undefined(size), IdSetState::Defined(other_ids)) => {
                if maintain_count {
                    *size = size.add(other_ids.len() as u64);
                }
                None
            }
            (IdSetState::Defined(ids), IdSetState::Undefined(other_size)) => {
                if maintain_count {
                    Some(other_size.add(ids.len() as u64))
                } else {
                    Some(UndefinedSize::Unknown)
                }
            }
            (IdSetState::Defined(ids), IdSetState::Defined(other_ids)) => {
                let total = ids.len() + other_ids.len();
                if self.limit.is_exceeded_by(total) {
                    Some(if maintain_count { UndefinedSize::Counted(total as u64) } else { UndefinedSize::Unknown })
                } else {
                    ids.union_merge(other_ids);
                    None
                }
            }
        };
        if let Some(size) = transition {
            self.undefine(size);
        }
    }

    /// ## brief
    /// Replace this set by the merge of a stored posting and `incoming`.
    /// `stored` is decoded before anything is touched; a decode failure
    /// leaves both sets unchanged. When the merge overflows, `incoming` is
    /// marked undefined too so the caller won't reuse it as defined.
    /// ## return
    /// bool: `true` if the key newly exceeded its entry limit. Only reported
    /// when counting is disabled.
    pub fn merge_stored<D: StoredPostingDecoder>(
        &mut self,
        stored: &[u8],
        incoming: &mut ImportIdSet,
        decoder: &D,
    ) -> Result<bool, CodecError> {
        let stored = decoder.decode(stored)?;
        let maintain_count = self.maintain_count;
        let size_or_unknown = |size: UndefinedSize| if maintain_count { size } else { UndefinedSize::Unknown };

        let (next_state, mark_incoming, limit_exceeded) = match (stored, &incoming.state) {
            (StoredPosting::Undefined(stored_size), IdSetState::Undefined(incoming_size)) => {
                (IdSetState::Undefined(size_or_unknown(stored_size.combine(*incoming_size))), false, false)
            }
            (StoredPosting::Undefined(stored_size), IdSetState::Defined(incoming_ids)) => {
                let size = size_or_unknown(stored_size.add(incoming_ids.len() as u64));
                (IdSetState::Undefined(size), true, !maintain_count)
            }
            (StoredPosting::Defined(stored_ids), IdSetState::Undefined(incoming_size)) => {
                let size = size_or_unknown(incoming_size.add(stored_ids.len() as u64));
                (IdSetState::Undefined(size), false, !maintain_count)
            }
            (StoredPosting::Defined(stored_ids), IdSetState::Defined(incoming_ids)) => {
                let total = stored_ids.len() + incoming_ids.len();
                if self.limit.is_exceeded_by(total) {
                    (IdSetState::Undefined(self.overflow_size(total)), true, !maintain_count)
                } else {
                    let mut merged = SortedIdArray::from_sorted(stored_ids);
                    merged.union_merge(incoming_ids);
                    (IdSetState::Defined(merged), false, false)
                }
            }
        };

        if mark_incoming {
            incoming.set_undefined();
        }
        match next_state {
            IdSetState::Undefined(size) => self.undefine(size),
            defined => self.state = defined,
        }
        Ok(limit_exceeded)
    }

    /// Replace this set by a stored posting minus the ids of `to_remove`.
    ///
    /// The overflow check runs on the stored length before removal, so a
    /// removal that would have brought the list back under the limit still
    /// leaves it undefined.
    pub fn remove_stored<D: StoredPostingDecoder>(
        &mut self,
        stored: &[u8],
        to_remove: &mut ImportIdSet,
        decoder: &D,
    ) -> Result<(), CodecError> {
        let stored = decoder.decode(stored)?;

        let (next_state, mark_to_remove) = match (stored, &to_remove.state) {
            (StoredPosting::Undefined(_), _) => (IdSetState::Undefined(UndefinedSize::Unknown), true),
            (StoredPosting::Defined(_), IdSetState::Undefined(_)) => {
                (IdSetState::Undefined(UndefinedSize::Unknown), false)
            }
            (StoredPosting::Defined(stored_ids), IdSetState::Defined(remove_ids)) => {
                if self.limit.is_exceeded_by(stored_ids.len().saturating_sub(remove_ids.len())) {
                    (IdSetState::Undefined(UndefinedSize::Unknown), true)
                } else {
                    let mut kept = SortedIdArray::from_sorted(stored_ids);
                    kept.difference_remove(remove_ids);
                    (IdSetState::Defined(kept), false)
                }
            }
        };

        if mark_to_remove {
            to_remove.set_undefined();
        }
        match next_state {
            IdSetState::Undefined(size) => self.undefine(size),
            defined => self.state = defined,
        }
        Ok(())
    }
}

/// Encoding
impl ImportIdSet {
    /// Bytes to write back to storage for this key.
    pub fn to_database(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.len().max(1) * size_of::<EntryId>());
        self.encode_into(&mut buffer);
        buffer
    }

    /// Appends the encoded set to `buffer`.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        match &self.state {
            IdSetState::Defined(ids) => encode_entry_ids(ids.as_slice(), buffer),
            IdSetState::Undefined(size) => encode_undefined_size(*size, buffer),
        }
    }
}
