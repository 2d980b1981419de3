//! Fixed-size hash index keyed by Call-ID
//!
//! The bucket count is chosen once at construction and never changes, and the
//! number of stored elements is capped. Equality is not a property of the
//! stored type: every insert and lookup supplies its own predicate, so the
//! same index serves all matching policies. Chains keep insertion order and
//! the first matching element wins.

use crate::errors::IndexError;

/// Position of an element in the index, handed out by [`HashIndex::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    bucket: usize,
    id: u64,
}

impl SlotRef {
    pub(crate) fn new(bucket: usize, id: u64) -> Self {
        Self { bucket, id }
    }

    /// Bucket holding the element
    pub fn bucket(&self) -> usize {
        self.bucket
    }
}

#[derive(Debug)]
struct Entry<T> {
    id: u64,
    value: T,
}

/// Open hash index with per-call equality
#[derive(Debug)]
pub struct HashIndex<T> {
    buckets: Vec<Vec<Entry<T>>>,
    capacity: usize,
    len: usize,
    next_id: u64,
}

/// Polynomial hash of a Call-ID, base 256, reduced modulo the bucket count
pub fn hash_call_id(call_id: &str, bucket_count: usize) -> usize {
    let modulus = bucket_count.max(1) as u128;
    let hash = call_id
        .as_bytes()
        .iter()
        .fold(0u128, |acc, byte| (acc * 256 + u128::from(*byte)) % modulus);
    hash as usize
}

impl<T> HashIndex<T> {
    /// Create an index for at most `capacity` elements over `bucket_count` buckets
    pub fn new(capacity: usize, bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: (0..bucket_count).map(|_| Vec::new()).collect(),
            capacity,
            len: 0,
            next_id: 1,
        }
    }

    /// Number of linked elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is linked
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of elements
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket a Call-ID hashes to
    pub fn bucket_of(&self, call_id: &str) -> usize {
        hash_call_id(call_id, self.buckets.len())
    }

    /// Link `value` under `call_id`.
    ///
    /// When the caller already owns a slot that is still linked, that slot is
    /// returned and nothing is added. Otherwise the bucket is probed with
    /// `is_equal` first, and an equal element makes the insert fail.
    pub fn insert<F>(
        &mut self,
        call_id: &str,
        value: T,
        owned: Option<SlotRef>,
        mut is_equal: F,
    ) -> Result<SlotRef, IndexError>
    where
        F: FnMut(&T) -> bool,
    {
        if let Some(slot) = owned {
            if self.get(slot).is_some() {
                return Ok(slot);
            }
        }

        let bucket = self.bucket_of(call_id);
        if self.buckets[bucket].iter().any(|entry| is_equal(&entry.value)) {
            return Err(IndexError::AlreadyPresent);
        }
        if self.len >= self.capacity {
            return Err(IndexError::Full);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.buckets[bucket].push(Entry { id, value });
        self.len += 1;
        Ok(SlotRef::new(bucket, id))
    }

    /// First element in the Call-ID's bucket accepted by `matches`
    pub fn find<F>(&self, call_id: &str, mut matches: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        let bucket = self.bucket_of(call_id);
        self.buckets[bucket]
            .iter()
            .find(|entry| matches(&entry.value))
            .map(|entry| &entry.value)
    }

    /// Element linked at `slot`
    pub fn get(&self, slot: SlotRef) -> Option<&T> {
        self.buckets
            .get(slot.bucket)?
            .iter()
            .find(|entry| entry.id == slot.id)
            .map(|entry| &entry.value)
    }

    /// Unlink the element at `slot`, keeping the order of the rest of the chain
    pub fn remove(&mut self, slot: SlotRef) -> Option<T> {
        let chain = self.buckets.get_mut(slot.bucket)?;
        let position = chain.iter().position(|entry| entry.id == slot.id)?;
        let entry = chain.remove(position);
        self.len -= 1;
        Some(entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_in_range() {
        assert_eq!(hash_call_id("", 7), 0);
        assert_eq!(hash_call_id("a", 1000), 97);
        // 'a' * 256 + 'b' = 24930
        assert_eq!(hash_call_id("ab", 1000), 930);
        let long = "x".repeat(200);
        assert!(hash_call_id(&long, 13) < 13);
        assert_eq!(hash_call_id(&long, 13), hash_call_id(&long, 13));
        assert_eq!(hash_call_id("abc", 0), 0);
    }

    #[test]
    fn test_insert_rejects_equal_elements() {
        let mut index = HashIndex::new(4, 8);
        index.insert("call", 1, None, |_| false).unwrap();
        let dup = index.insert("call", 2, None, |existing| *existing == 1);
        assert_eq!(dup, Err(IndexError::AlreadyPresent));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_with_owned_slot_is_idempotent() {
        let mut index = HashIndex::new(4, 8);
        let slot = index.insert("call", 1, None, |_| false).unwrap();
        let again = index.insert("call", 1, Some(slot), |_| true).unwrap();
        assert_eq!(slot, again);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut index = HashIndex::new(2, 4);
        index.insert("a", 1, None, |_| false).unwrap();
        index.insert("b", 2, None, |_| false).unwrap();
        assert_eq!(index.insert("c", 3, None, |_| false), Err(IndexError::Full));
    }

    #[test]
    fn test_find_returns_first_in_chain_order() {
        let mut index = HashIndex::new(8, 1);
        index.insert("x", 10, None, |_| false).unwrap();
        let second = index.insert("y", 20, None, |_| false).unwrap();
        index.insert("z", 30, None, |_| false).unwrap();
        assert_eq!(index.find("x", |v| *v >= 20), Some(&20));

        assert_eq!(index.remove(second), Some(20));
        assert_eq!(index.remove(second), None);
        assert_eq!(index.find("x", |v| *v >= 20), Some(&30));
        assert!(index.get(second).is_none());
        assert_eq!(index.len(), 2);
    }
}
