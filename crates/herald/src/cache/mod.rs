// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keyed in-memory cache stores
//!
//! Every stateful component keeps its records in a [`CacheStore`]: subscriber
//! lists, registered topics, consumer topic selections, message sync state and
//! discovered providers.
//!
//! # Design
//!
//! - One store holds one entry kind ([`CacheEntry::KIND`]).
//! - At most one entry per key. Writing an existing key either merges
//!   (subscribers, providers, sync state) or is rejected (topics, selections).
//! - Iteration follows insertion order; merges keep the original position.
//! - A store is not synchronized. Owners wrap each store in its own
//!   `parking_lot::Mutex` and hold it for the whole operation, merge included.
//!
//! Lookups are hash based, ordering comes from a sequence-keyed `BTreeMap`.

mod entries;

pub use entries::{
    DiscoveredProvider, MessageSyncEntry, RegisteredTopic, SubscriberRecord, TopicSelection,
};

use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

/// Entry kinds held by cache stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Subscriber,
    MessageSync,
    RegisteredTopic,
    ConsumerTopic,
    DiscoveredProvider,
}

impl CacheKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CacheKind::Subscriber => "subscriber",
            CacheKind::MessageSync => "message sync",
            CacheKind::RegisteredTopic => "registered topic",
            CacheKind::ConsumerTopic => "consumer topic",
            CacheKind::DiscoveredProvider => "provider",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of folding an incoming entry into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    /// The existing entry changed.
    Merged,
    /// The incoming entry carried nothing new.
    Unchanged,
    /// The kind does not accept duplicates.
    Rejected,
}

/// Outcome of [`CacheStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Merged,
    Unchanged,
}

/// A record that can live in a [`CacheStore`].
pub trait CacheEntry: Send + 'static {
    /// Kind-specific lookup key.
    type Key: Eq + Hash + Clone + fmt::Debug + Send;

    const KIND: CacheKind;

    fn key(&self) -> Self::Key;

    /// Fold `incoming` (same key) into `self`.
    ///
    /// The default rejects duplicates; merging kinds override it.
    fn merge(&mut self, incoming: Self) -> MergeResult
    where
        Self: Sized,
    {
        let _ = incoming;
        MergeResult::Rejected
    }
}

/// Ordered, keyed store of one entry kind.
pub struct CacheStore<E: CacheEntry> {
    index: HashMap<E::Key, u64>,
    entries: BTreeMap<u64, E>,
    next_seq: u64,
}

impl<E: CacheEntry> CacheStore<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> CacheKind {
        E::KIND
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by key.
    pub fn read<Q>(&self, key: &Q) -> Option<&E>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let seq = self.index.get(key)?;
        self.entries.get(seq)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert `entry`, or merge it into the entry already stored under its key.
    ///
    /// # Errors
    ///
    /// `Error::AlreadyPresent` when the key exists and the kind rejects duplicates.
    pub fn write(&mut self, entry: E) -> Result<WriteOutcome> {
        let key = entry.key();
        if let Some(&seq) = self.index.get(&key) {
            let Some(existing) = self.entries.get_mut(&seq) else {
                // Index and entries are updated together; a miss means the
                // index is stale, so repair it and fall through to insert.
                log::error!("[CacheStore] stale index for {} {:?}", E::KIND, key);
                self.index.remove(&key);
                return self.insert(key, entry);
            };
            return match existing.merge(entry) {
                MergeResult::Merged => Ok(WriteOutcome::Merged),
                MergeResult::Unchanged => Ok(WriteOutcome::Unchanged),
                MergeResult::Rejected => Err(Error::AlreadyPresent {
                    kind: E::KIND.name(),
                    key: format!("{:?}", key),
                }),
            };
        }
        self.insert(key, entry)
    }

    fn insert(&mut self, key: E::Key, entry: E) -> Result<WriteOutcome> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(key, seq);
        self.entries.insert(seq, entry);
        Ok(WriteOutcome::Inserted)
    }

    /// Mutate the entry stored under `key` in place.
    ///
    /// The closure must not change the entry's key. Returns `None` if absent.
    pub fn update<Q, R>(&mut self, key: &Q, f: impl FnOnce(&mut E) -> R) -> Option<R>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let seq = self.index.get(key)?;
        let entry = self.entries.get_mut(seq)?;
        let result = f(entry);
        debug_assert!(
            <E::Key as Borrow<Q>>::borrow(&entry.key()) == key,
            "cache update changed the entry key"
        );
        Some(result)
    }

    /// Remove the entry stored under `key`; `None` is the not-found result.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<E>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let seq = self.index.remove(key)?;
        self.entries.remove(&seq)
    }

    /// Remove the first entry (in insertion order) matching `pred`.
    pub fn delete_where(&mut self, mut pred: impl FnMut(&E) -> bool) -> Option<E> {
        let seq = self
            .entries
            .iter()
            .find_map(|(seq, entry)| pred(entry).then_some(*seq))?;
        let entry = self.entries.remove(&seq)?;
        self.index.remove(&entry.key());
        Some(entry)
    }

    /// Keep only entries matching `keep`; returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) -> usize {
        let before = self.entries.len();
        let index = &mut self.index;
        self.entries.retain(|_, entry| {
            if keep(entry) {
                true
            } else {
                index.remove(&entry.key());
                false
            }
        });
        before - self.entries.len()
    }

    /// First entry (in insertion order) matching `pred`.
    pub fn find(&self, mut pred: impl FnMut(&E) -> bool) -> Option<&E> {
        self.entries.values().find(|entry| pred(entry))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }

    /// Release every entry; returns how many were held.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.index.clear();
        count
    }

    /// Release every entry and the store itself.
    pub fn destroy(mut self) -> usize {
        let count = self.clear();
        log::debug!("[CacheStore] destroyed {} store ({} entries)", E::KIND, count);
        count
    }
}

impl<E: CacheEntry> Default for CacheStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CacheEntry + fmt::Debug> fmt::Debug for CacheStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("kind", &E::KIND)
            .field("entries", &self.entries.values().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        name: String,
        hits: u32,
    }

    impl CacheEntry for Counter {
        type Key = String;
        const KIND: CacheKind = CacheKind::MessageSync;

        fn key(&self) -> String {
            self.name.clone()
        }

        fn merge(&mut self, incoming: Self) -> MergeResult {
            if incoming.hits == 0 {
                return MergeResult::Unchanged;
            }
            self.hits += incoming.hits;
            MergeResult::Merged
        }
    }

    #[derive(Debug)]
    struct Unique(&'static str);

    impl CacheEntry for Unique {
        type Key = &'static str;
        const KIND: CacheKind = CacheKind::RegisteredTopic;

        fn key(&self) -> &'static str {
            self.0
        }
    }

    fn counter(name: &str, hits: u32) -> Counter {
        Counter {
            name: name.to_string(),
            hits,
        }
    }

    #[test]
    fn test_write_inserts_then_merges() {
        let mut store = CacheStore::new();
        assert_eq!(store.write(counter("a", 1)).unwrap(), WriteOutcome::Inserted);
        assert_eq!(store.write(counter("a", 2)).unwrap(), WriteOutcome::Merged);
        assert_eq!(store.write(counter("a", 0)).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(store.len(), 1);
        assert_eq!(store.read("a").map(|c| c.hits), Some(3));
    }

    #[test]
    fn test_write_rejects_duplicates_for_unique_kinds() {
        let mut store = CacheStore::new();
        store.write(Unique("weather")).unwrap();
        let err = store.write(Unique("weather")).unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyPresent {
                kind: "registered topic",
                ..
            }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_iteration_keeps_insertion_order_across_merges() {
        let mut store = CacheStore::new();
        store.write(counter("c", 1)).unwrap();
        store.write(counter("a", 1)).unwrap();
        store.write(counter("b", 1)).unwrap();
        store.write(counter("c", 5)).unwrap();

        let names: Vec<_> = store.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store: CacheStore<Counter> = CacheStore::new();
        assert!(store.delete("nothing").is_none());

        store.write(counter("x", 1)).unwrap();
        assert!(store.delete("x").is_some());
        assert!(store.delete("x").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reinsert_after_delete_goes_to_back() {
        let mut store = CacheStore::new();
        store.write(counter("a", 1)).unwrap();
        store.write(counter("b", 1)).unwrap();
        store.delete("a");
        store.write(counter("a", 1)).unwrap();

        let names: Vec<_> = store.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_delete_where_and_retain_keep_index_consistent() {
        let mut store = CacheStore::new();
        for (name, hits) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            store.write(counter(name, hits)).unwrap();
        }

        let removed = store.delete_where(|c| c.hits % 2 == 0).expect("b matches");
        assert_eq!(removed.name, "b");
        assert!(!store.contains("b"));

        assert_eq!(store.retain(|c| c.hits < 3), 2);
        assert!(store.contains("a"));
        assert!(!store.contains("c"));
        assert!(!store.contains("d"));

        // Removed keys can be written again.
        assert_eq!(store.write(counter("d", 1)).unwrap(), WriteOutcome::Inserted);
    }

    #[test]
    fn test_update_in_place() {
        let mut store = CacheStore::new();
        store.write(counter("a", 1)).unwrap();
        assert_eq!(store.update("a", |c| {
            c.hits = 10;
            c.hits
        }), Some(10));
        assert_eq!(store.update("missing", |c| c.hits), None);
        assert_eq!(store.read("a").map(|c| c.hits), Some(10));
    }

    #[test]
    fn test_find_and_destroy() {
        let mut store = CacheStore::new();
        store.write(counter("a", 1)).unwrap();
        store.write(counter("b", 7)).unwrap();
        assert_eq!(store.find(|c| c.hits == 7).map(|c| c.name.as_str()), Some("b"));
        assert!(store.find(|c| c.hits == 99).is_none());
        assert_eq!(store.destroy(), 2);
    }
}
