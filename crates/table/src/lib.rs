//! # Table — chained hash table core
//!
//! A string-keyed hash table with separate chaining, the in-memory half of the
//! Hashline store. The `codec` crate persists it through the same public
//! `insert`/`iter` surface exposed here — persistence has no privileged
//! internal path.
//!
//! ## Layout
//!
//! ```text
//! buckets: [ slot 0 ] -> (k, v) -> (k, v)
//!          [ slot 1 ]
//!          [ slot 2 ] -> (k, v)
//!          [  ...   ]
//! ```
//!
//! Each slot owns the head of a singly linked chain of entries whose keys hash
//! to it. New keys are **prepended** to their chain, so inserting a fresh key
//! never walks the chain past the lookup scan; re-inserting an existing key
//! overwrites its value in place. Traversal order is bucket order then chain
//! order and is not stable across growth.
//!
//! ## Growth
//!
//! After every new-key insert the table compares `count` against a
//! precomputed threshold (`capacity * load_threshold`). When exceeded, the
//! capacity doubles and every entry is relinked — moved, never copied — into
//! the new bucket array. If the new array cannot be allocated the growth is
//! skipped: the table stays fully valid and only lookup performance degrades.
//!
//! The table is single-threaded by design; callers that share one across
//! threads must serialize all access externally (even `get` races with a
//! concurrent growth).

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Bucket count used by [`HashTable::new`].
pub const DEFAULT_CAPACITY: usize = 16;

/// Default ratio of entries to buckets above which the table grows.
pub const DEFAULT_LOAD_THRESHOLD: f64 = 0.75;

/// Default hash seed: the FNV-1a 64-bit offset basis.
pub const DEFAULT_HASH_SEED: u64 = 0xCBF2_9CE4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Errors that can occur while building or copying a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The bucket array could not be allocated. The table (if one existed
    /// before the call) is left untouched.
    #[error("bucket array allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Outcome of [`HashTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was not present; a new entry was added.
    Added,
    /// The key was present; its value was overwritten in place.
    Updated,
}

/// A single key/value pair in a bucket chain. The chain link is exclusively
/// owned: an entry is freed by unlinking it, and moved (not recreated) during
/// growth.
struct Entry {
    key: String,
    value: String,
    next: Option<Box<Entry>>,
}

/// Head slot of a collision chain.
type Bucket = Option<Box<Entry>>;

/// A string-keyed hash table with separate chaining and load-factor-driven
/// growth.
///
/// The hash seed and load threshold are explicit per-table state with
/// documented defaults ([`DEFAULT_HASH_SEED`], [`DEFAULT_LOAD_THRESHOLD`]) —
/// there is no process-wide configuration. The seed is fixed at construction
/// because changing it would invalidate every bucket assignment.
///
/// Keys are unique table-wide. `count` always equals the sum of all chain
/// lengths, and after any insert `count / capacity` stays at or below the
/// load threshold unless a growth allocation failed.
pub struct HashTable {
    buckets: Vec<Bucket>,
    count: usize,
    load_threshold: f64,
    /// Entry count above which the next new-key insert triggers growth.
    /// Precomputed so the threshold is only recalculated when the capacity or
    /// threshold changes.
    grow_at: usize,
    seed: u64,
}

impl HashTable {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] buckets.
    pub fn new() -> Result<Self, TableError> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with `capacity` buckets (minimum 1).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Alloc`] if the bucket array cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_seed(capacity, DEFAULT_HASH_SEED)
    }

    /// Creates an empty table with `capacity` buckets (minimum 1) and an
    /// explicit hash seed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Alloc`] if the bucket array cannot be allocated.
    pub fn with_capacity_and_seed(capacity: usize, seed: u64) -> Result<Self, TableError> {
        let capacity = capacity.max(1);
        let buckets = Self::try_buckets(capacity)?;
        Ok(Self {
            buckets,
            count: 0,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
            grow_at: Self::threshold_count(capacity, DEFAULT_LOAD_THRESHOLD),
            seed,
        })
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current bucket count. Grows automatically; never shrinks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// The load factor above which a new-key insert grows the table.
    #[must_use]
    pub fn load_threshold(&self) -> f64 {
        self.load_threshold
    }

    /// Updates the load threshold. Takes effect on the next new-key insert;
    /// the table is not grown retroactively.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not a positive finite number.
    pub fn set_load_threshold(&mut self, threshold: f64) {
        assert!(
            threshold.is_finite() && threshold > 0.0,
            "load threshold must be a positive finite number"
        );
        self.load_threshold = threshold;
        self.grow_at = Self::threshold_count(self.capacity(), threshold);
    }

    /// The hash seed this table was created with.
    #[must_use]
    pub fn hash_seed(&self) -> u64 {
        self.seed
    }

    /// Inserts or updates a key/value pair.
    ///
    /// A new key is prepended to its bucket chain and may trigger growth; an
    /// existing key has its value overwritten in place, which never changes
    /// `count` and therefore never triggers growth.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> InsertOutcome {
        let key = key.into();
        let value = value.into();
        let idx = self.bucket_index(&key);

        let mut cur = &mut self.buckets[idx];
        while let Some(entry) = cur {
            if entry.key == key {
                entry.value = value;
                return InsertOutcome::Updated;
            }
            cur = &mut entry.next;
        }

        let next = self.buckets[idx].take();
        self.buckets[idx] = Some(Box::new(Entry { key, value, next }));
        self.count += 1;

        if self.count > self.grow_at {
            self.grow();
        }
        InsertOutcome::Added
    }

    /// Looks up a key, returning a read-only view of its value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let mut cur = &self.buckets[self.bucket_index(key)];
        while let Some(entry) = cur {
            if entry.key == key {
                return Some(&entry.value);
            }
            cur = &entry.next;
        }
        None
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes a key, returning its value, or `None` if absent. The entry is
    /// unlinked from its chain; the bucket array never shrinks.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.bucket_index(key);
        let mut cur = &mut self.buckets[idx];
        loop {
            match cur {
                None => return None,
                Some(entry) if entry.key == key => {
                    let next = entry.next.take();
                    let removed = std::mem::replace(cur, next);
                    self.count -= 1;
                    return removed.map(|entry| entry.value);
                }
                Some(entry) => cur = &mut entry.next,
            }
        }
    }

    /// Iterates over every `(key, value)` pair exactly once, in bucket order
    /// then chain order. The order is not stable across growth; rely on it
    /// only for completeness.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            buckets: &self.buckets,
            bucket_idx: 0,
            entry: None,
        }
    }

    /// Applies `visit` to every pair exactly once, allowing the value of the
    /// current entry to be rewritten in place. Keys and the entry set cannot
    /// be changed through the visitor.
    pub fn for_each_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&str, &mut String),
    {
        for slot in &mut self.buckets {
            let mut cur = slot;
            while let Some(entry) = cur {
                visit(&entry.key, &mut entry.value);
                cur = &mut entry.next;
            }
        }
    }

    /// Produces a deep copy with independent storage at the same capacity,
    /// threshold, and seed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Alloc`] if the new bucket array cannot be
    /// allocated; the source is untouched and the partial copy is dropped.
    pub fn try_clone(&self) -> Result<Self, TableError> {
        let mut clone = Self::with_capacity_and_seed(self.capacity(), self.seed)?;
        clone.load_threshold = self.load_threshold;
        clone.grow_at = self.grow_at;
        for (key, value) in self.iter() {
            clone.insert(key, value);
        }
        Ok(clone)
    }

    /// Removes every entry, keeping the bucket array at its current capacity.
    ///
    /// Chains are torn down iteratively, so even a pathologically long chain
    /// cannot overflow the stack through recursive drops.
    pub fn clear(&mut self) {
        for slot in &mut self.buckets {
            let mut cur = slot.take();
            while let Some(mut entry) = cur {
                cur = entry.next.take();
            }
        }
        self.count = 0;
    }

    /// Entry count above which a table of `capacity` buckets should grow.
    fn threshold_count(capacity: usize, threshold: f64) -> usize {
        (capacity as f64 * threshold) as usize
    }

    /// Fallibly allocates a bucket array of `capacity` empty slots.
    fn try_buckets(capacity: usize) -> Result<Vec<Bucket>, TableError> {
        let mut buckets: Vec<Bucket> = Vec::new();
        buckets.try_reserve_exact(capacity)?;
        buckets.resize_with(capacity, || None);
        Ok(buckets)
    }

    /// Maps a key to its bucket under the current capacity.
    fn bucket_index(&self, key: &str) -> usize {
        (fnv1a(self.seed, key.as_bytes()) % self.buckets.len() as u64) as usize
    }

    /// Doubles the capacity and relinks every entry into the new bucket
    /// array. Each entry moves exactly once; none are duplicated or dropped.
    /// On allocation failure the growth is abandoned and the table is left
    /// fully intact — the triggering insert has already landed.
    fn grow(&mut self) {
        let new_capacity = self.capacity() * 2;
        let new_buckets = match Self::try_buckets(new_capacity) {
            Ok(buckets) => buckets,
            Err(_) => return,
        };

        let old_buckets = std::mem::replace(&mut self.buckets, new_buckets);
        for mut slot in old_buckets {
            while let Some(mut entry) = slot.take() {
                slot = entry.next.take();
                let idx = self.bucket_index(&entry.key);
                entry.next = self.buckets[idx].take();
                self.buckets[idx] = Some(entry);
            }
        }
        self.grow_at = Self::threshold_count(new_capacity, self.load_threshold);
    }
}

/// Structural equality: two tables are equal iff they hold the same set of
/// `(key, value)` pairs, regardless of capacity, bucket layout, or chain
/// order. Short-circuits on differing entry counts.
impl PartialEq for HashTable {
    fn eq(&self, other: &Self) -> bool {
        if self.count != other.count {
            return false;
        }
        self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for HashTable {}

impl fmt::Debug for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("count", &self.count)
            .field("capacity", &self.capacity())
            .field("load_threshold", &self.load_threshold)
            .field("hash_seed", &self.seed)
            .finish()
    }
}

impl Drop for HashTable {
    fn drop(&mut self) {
        // Iterative teardown; the default recursive chain drop could blow the
        // stack on a long chain.
        self.clear();
    }
}

impl<'a> IntoIterator for &'a HashTable {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Borrowed iterator over a table's `(key, value)` pairs.
///
/// Walks the bucket array in order, following each chain before moving to the
/// next slot. Created by [`HashTable::iter`].
pub struct Iter<'a> {
    buckets: &'a [Bucket],
    bucket_idx: usize,
    entry: Option<&'a Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entry {
                self.entry = entry.next.as_deref();
                return Some((entry.key.as_str(), entry.value.as_str()));
            }
            if self.bucket_idx >= self.buckets.len() {
                return None;
            }
            self.entry = self.buckets[self.bucket_idx].as_deref();
            self.bucket_idx += 1;
        }
    }
}

/// Seeded FNV-1a over `bytes`. `seed` is the initial state; the default seed
/// is the standard offset basis.
fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = seed;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
