use std::mem::size_of;

use crate::EntryId;

/// A growable, strictly ascending array of unique entry ids.
///
/// The backing buffer is always fully initialized up to its capacity;
/// `count` tracks how many leading slots hold live ids. Keeping the two
/// apart lets `union_merge` shift the tail in place before merging.
#[derive(Clone, Default)]
pub struct SortedIdArray {
    array: Vec<EntryId>,
    count: usize,
}

impl std::fmt::Debug for SortedIdArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SortedIdArray[{}/{}]{:?}", self.count, self.capacity(), self.as_slice())
    }
}

impl PartialEq for SortedIdArray {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for SortedIdArray {}

impl FromIterator<EntryId> for SortedIdArray {
    fn from_iter<I: IntoIterator<Item = EntryId>>(iter: I) -> Self {
        let mut ids = SortedIdArray::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

impl SortedIdArray {
    pub fn new() -> Self {
        Self { array: Vec::new(), count: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { array: vec![0; capacity], count: 0 }
    }

    /// Wraps ids that are already strictly ascending, e.g. a decoded posting.
    pub(crate) fn from_sorted(ids: Vec<EntryId>) -> Self {
        debug_assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "entry ids must be strictly ascending"
        );
        let count = ids.len();
        Self { array: ids, count }
    }
}

impl SortedIdArray {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.array.len()
    }

    pub fn as_slice(&self) -> &[EntryId] {
        &self.array[..self.count]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntryId> {
        self.as_slice().iter()
    }

    pub fn first(&self) -> Option<EntryId> {
        self.as_slice().first().copied()
    }

    pub fn last(&self) -> Option<EntryId> {
        self.as_slice().last().copied()
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.binary_search(id).is_ok()
    }

    pub fn into_vec(mut self) -> Vec<EntryId> {
        self.array.truncate(self.count);
        self.array
    }

    /// Bytes held by the backing buffer, including unused capacity.
    pub fn memory_usage(&self) -> usize {
        self.array.len() * size_of::<EntryId>()
    }

    /// `Ok(index)` when `id` is present, otherwise `Err(insertion_point)`,
    /// the slot where `id` would go to keep the array sorted.
    pub fn binary_search(&self, id: EntryId) -> Result<usize, usize> {
        self.as_slice().binary_search(&id)
    }

    pub fn insertion_point(&self, id: EntryId) -> usize {
        match self.binary_search(id) {
            Ok(idx) | Err(idx) => idx,
        }
    }

    /// Grows the buffer by doubling until it holds at least `required` slots.
    fn resize(&mut self, required: usize) {
        if self.array.len() >= required {
            return;
        }
        let mut new_capacity = self.array.len().max(1);
        while new_capacity < required {
            new_capacity *= 2;
        }
        self.array.resize(new_capacity, 0);
    }

    /// ## brief
    /// insert one entry id, keeping the array sorted and unique.
    /// ## return
    /// bool: `false` if `id` was already present.
    pub fn insert(&mut self, id: EntryId) -> bool {
        // fast path: appending past the current maximum.
        if self.count == 0 || id > self.array[self.count - 1] {
            self.resize(self.count + 1);
            self.array[self.count] = id;
            self.count += 1;
            return true;
        }

        let pos = match self.binary_search(id) {
            Ok(_) => return false,
            Err(pos) => pos,
        };
        self.resize(self.count + 1);
        self.array.copy_within(pos..self.count, pos + 1);
        self.array[pos] = id;
        self.count += 1;
        true
    }

    /// Sorted union of `self` and `other`, written into `self`.
    pub fn union_merge(&mut self, other: &SortedIdArray) {
        let that = other.as_slice();
        if that.is_empty() {
            return;
        }
        self.resize(self.count + that.len());
        let count = self.count;

        // `other` lands entirely after `self`.
        if count == 0 || that[0] > self.array[count - 1] {
            self.array[count..count + that.len()].copy_from_slice(that);
            self.count += that.len();
            return;
        }

        // `other` lands entirely before `self`.
        if self.array[0] > that[that.len() - 1] {
            self.array.copy_within(0..count, that.len());
            self.array[..that.len()].copy_from_slice(that);
            self.count += that.len();
            return;
        }

        // Shift the tail of `self` right by `that.len()` to make room for the
        // worst case, then merge both runs left to right into the gap.
        let mut dest = self.insertion_point(that[0]);
        let mut a_pos = dest + that.len();
        let a_end = a_pos + (count - dest);
        self.array.copy_within(dest..count, a_pos);

        // No overlap left once the shifted tail starts after `other`.
        if self.array[a_pos] > that[that.len() - 1] {
            self.array[dest..dest + that.len()].copy_from_slice(that);
            self.count += that.len();
            return;
        }

        // `dest + (that.len() - b_pos) <= a_pos` holds throughout, so writes
        // never overtake unread elements of the shifted tail.
        let mut b_pos = 0;
        while a_pos < a_end && b_pos < that.len() {
            let a = self.array[a_pos];
            let b = that[b_pos];
            if a < b {
                self.array[dest] = a;
                a_pos += 1;
            } else if a > b {
                self.array[dest] = b;
                b_pos += 1;
            } else {
                self.array[dest] = a;
                a_pos += 1;
                b_pos += 1;
            }
            dest += 1;
        }

        if a_pos < a_end {
            self.array.copy_within(a_pos..a_end, dest);
            dest += a_end - a_pos;
        }
        if b_pos < that.len() {
            let remain = &that[b_pos..];
            self.array[dest..dest + remain.len()].copy_from_slice(remain);
            dest += remain.len();
        }
        self.count = dest;
    }

    /// Removes every id of `other` from `self`.
    pub fn difference_remove(&mut self, other: &SortedIdArray) {
        let mut kept: Vec<EntryId> = vec![0; self.array.len()];
        let mut kept_count = 0;
        for &id in self.as_slice() {
            if other.binary_search(id).is_err() {
                kept[kept_count] = id;
                kept_count += 1;
            }
        }
        self.array = kept;
        self.count = kept_count;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use rand::Rng;

    use super::SortedIdArray;
    use crate::EntryId;

    fn ids(values: &[EntryId]) -> SortedIdArray {
        values.iter().copied().collect()
    }

    #[test]
    fn test_insert_keeps_sorted_and_unique() {
        let mut array = SortedIdArray::new();
        assert!(array.insert(5));
        assert!(array.insert(1));
        assert!(array.insert(9));
        assert!(array.insert(3));
        assert!(!array.insert(5));
        assert!(!array.insert(1));
        assert_eq!(array.as_slice(), &[1, 3, 5, 9]);
        assert_eq!(array.len(), 4);
    }

    #[test]
    fn test_resize_doubles_from_one() {
        let mut array = SortedIdArray::new();
        assert_eq!(array.capacity(), 0);
        array.insert(10);
        assert_eq!(array.capacity(), 1);
        array.insert(20);
        assert_eq!(array.capacity(), 2);
        array.insert(15);
        assert_eq!(array.capacity(), 4);
        array.insert(1);
        array.insert(30);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.as_slice(), &[1, 10, 15, 20, 30]);
    }

    #[test]
    fn test_duplicate_insert_does_not_grow() {
        let mut array = SortedIdArray::with_capacity(2);
        array.insert(1);
        array.insert(2);
        assert!(!array.insert(1));
        assert_eq!(array.capacity(), 2);
    }

    #[test]
    fn test_binary_search_convention() {
        let array = ids(&[2, 4, 6]);
        assert_eq!(array.binary_search(4), Ok(1));
        assert_eq!(array.binary_search(1), Err(0));
        assert_eq!(array.binary_search(5), Err(2));
        assert_eq!(array.binary_search(7), Err(3));
        assert_eq!(array.insertion_point(6), 2);
        assert_eq!(array.insertion_point(3), 1);
    }

    #[test]
    fn test_union_merge_with_empty() {
        let mut array = ids(&[1, 2]);
        array.union_merge(&SortedIdArray::new());
        assert_eq!(array.as_slice(), &[1, 2]);

        let mut empty = SortedIdArray::new();
        empty.union_merge(&ids(&[3, 4]));
        assert_eq!(empty.as_slice(), &[3, 4]);
    }

    #[test]
    fn test_union_merge_disjoint_ranges() {
        let mut append = ids(&[1, 2, 3]);
        append.union_merge(&ids(&[7, 8]));
        assert_eq!(append.as_slice(), &[1, 2, 3, 7, 8]);

        let mut prepend = ids(&[7, 8]);
        prepend.union_merge(&ids(&[1, 2, 3]));
        assert_eq!(prepend.as_slice(), &[1, 2, 3, 7, 8]);
    }

    #[test]
    fn test_union_merge_interleaved_with_duplicates() {
        let mut array = ids(&[1, 3, 5, 7]);
        array.union_merge(&ids(&[2, 3, 4, 8]));
        assert_eq!(array.as_slice(), &[1, 2, 3, 4, 5, 7, 8]);
        assert_eq!(array.len(), 7);
    }

    #[test]
    fn test_union_merge_gap_without_overlap() {
        // `other` fits entirely between two ids of `self`.
        let mut array = ids(&[1, 10]);
        array.union_merge(&ids(&[4, 5, 6]));
        assert_eq!(array.as_slice(), &[1, 4, 5, 6, 10]);
    }

    #[test]
    fn test_union_merge_identical() {
        let mut array = ids(&[1, 2, 3]);
        array.union_merge(&ids(&[1, 2, 3]));
        assert_eq!(array.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_difference_remove() {
        let mut array = ids(&[1, 2, 3, 4]);
        let capacity = array.capacity();
        array.difference_remove(&ids(&[2, 4]));
        assert_eq!(array.as_slice(), &[1, 3]);
        assert_eq!(array.len(), 2);
        assert_eq!(array.capacity(), capacity);

        array.difference_remove(&ids(&[9]));
        assert_eq!(array.as_slice(), &[1, 3]);
        array.difference_remove(&ids(&[1, 3]));
        assert!(array.is_empty());
    }

    #[test]
    fn test_random_inserts_match_btree_set() {
        let mut rng = rand::thread_rng();
        let mut array = SortedIdArray::new();
        let mut expected = BTreeSet::new();
        for _ in 0..2000 {
            let id: EntryId = rng.gen_range(0..500);
            assert_eq!(array.insert(id), expected.insert(id));
        }
        assert_eq!(array.into_vec(), expected.into_iter().collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_union_merge_is_set_union(
            a in proptest::collection::vec(0u64..1000, 0..64),
            b in proptest::collection::vec(0u64..1000, 0..64),
        ) {
            let mut left = ids(&a);
            left.union_merge(&ids(&b));
            let mut right = ids(&b);
            right.union_merge(&ids(&a));

            let expected: Vec<EntryId> = a.iter().chain(b.iter()).copied()
                .collect::<BTreeSet<_>>().into_iter().collect();
            prop_assert_eq!(left.as_slice(), expected.as_slice());
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_difference_remove_is_set_difference(
            a in proptest::collection::vec(0u64..200, 0..64),
            b in proptest::collection::vec(0u64..200, 0..64),
        ) {
            let mut array = ids(&a);
            array.difference_remove(&ids(&b));
            let removed: BTreeSet<EntryId> = b.iter().copied().collect();
            let expected: Vec<EntryId> = a.iter().copied()
                .collect::<BTreeSet<_>>().into_iter()
                .filter(|id| !removed.contains(id)).collect();
            prop_assert_eq!(array.as_slice(), expected.as_slice());
        }
    }
}
