//! Deterministic ordering of map keys

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Keys of a map in ascending (alphabetical for strings) order
pub fn keys<K, V, S>(map: &HashMap<K, V, S>) -> Vec<K>
where
    K: Ord + Clone,
{
    let mut keys: Vec<K> = map.keys().cloned().collect();
    keys.sort();
    keys
}

/// Keys of a map ordered alphabetically by a string projection of their values
///
/// Keys whose values project to the same string are adjacent, in no
/// particular order relative to each other.
pub fn keys_by_value<K, V, S, F>(map: &HashMap<K, V, S>, value_of: F) -> Vec<K>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
    F: Fn(&V) -> String,
{
    let mut entries: Vec<(String, &K)> = map.iter().map(|(k, v)| (value_of(v), k)).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, k)| k.clone()).collect()
}
