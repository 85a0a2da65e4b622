//! First-seen-order key to integer assignment.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::hash::Hash;

use crate::types::FeatureId;

/// Bijection between keys and the dense range `0..len()`.
///
/// Ids are assigned in first-seen order and never reassigned. The table
/// only grows. Stages that must share an id space borrow the same
/// instance mutably; everything else constructs its own.
#[derive(Clone, Debug)]
pub struct Indexer<K: Hash + Eq = String> {
    keys: IndexSet<K>,
}

impl<K: Hash + Eq> Default for Indexer<K> {
    fn default() -> Self {
        Self {
            keys: IndexSet::new(),
        }
    }
}

impl<K: Hash + Eq> Indexer<K> {
    /// Create an empty indexer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `key`, assigning `len()` first if it is unseen.
    pub fn index_of(&mut self, key: K) -> FeatureId {
        self.keys.insert_full(key).0
    }

    /// Id for `key` without inserting.
    pub fn get(&self, key: &K) -> Option<FeatureId> {
        self.keys.get_index_of(key)
    }

    /// Key assigned to `id`, if any.
    pub fn key_of(&self, id: FeatureId) -> Option<&K> {
        self.keys.get_index(id)
    }

    /// Number of distinct keys seen so far.
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// True before any key has been indexed.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in id order (position `i` holds the key with id `i`).
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }
}

impl<K: Hash + Eq + Clone> Indexer<K> {
    /// Forward table `key -> id`.
    pub fn lookup_table(&self) -> HashMap<K, FeatureId> {
        self.keys
            .iter()
            .enumerate()
            .map(|(id, key)| (key.clone(), id))
            .collect()
    }

    /// Reverse table `id -> key`, always consistent with `index_of`.
    pub fn reverse_lookup(&self) -> HashMap<FeatureId, K> {
        self.keys.iter().cloned().enumerate().collect()
    }
}

impl<K: Hash + Eq> FromIterator<K> for Indexer<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
