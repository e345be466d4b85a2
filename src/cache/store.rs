//! Session-lifetime entity cache.

use std::{fmt, hash::Hash};

use dashmap::DashMap;
use metrics::counter;

const HIT_COUNTER: &str = "postwire_entity_cache_hit_total";
const MISS_COUNTER: &str = "postwire_entity_cache_miss_total";

/// Last-known value per id, overwritten by every successful fetch.
///
/// There is no eviction and no TTL: the cache lives as long as the client,
/// and its growth is bounded by the ids a session actually visits.
pub struct LocalEntityCache<K, V> {
    kind: &'static str,
    entries: DashMap<K, V>,
}

impl<K, V> LocalEntityCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// `kind` labels the hit/miss metrics, e.g. `"post"`.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, id: &K) -> Option<V> {
        let value = self.entries.get(id).map(|entry| entry.value().clone());
        if value.is_some() {
            counter!(HIT_COUNTER, "kind" => self.kind).increment(1);
        } else {
            counter!(MISS_COUNTER, "kind" => self.kind).increment(1);
        }
        value
    }

    pub fn put(&self, id: K, value: V) {
        self.entries.insert(id, value);
    }

    pub fn remove(&self, id: &K) -> Option<V> {
        self.entries.remove(id).map(|(_, value)| value)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> fmt::Debug for LocalEntityCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEntityCache")
            .field("kind", &self.kind)
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;

    #[test]
    fn put_overwrites_previous_value() {
        let cache = LocalEntityCache::new("post");
        cache.put(5_u64, "old");
        cache.put(5, "new");
        assert_eq!(cache.get(&5), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_forgets_the_entry() {
        let cache = LocalEntityCache::new("post");
        cache.put(1_u64, 10);
        assert_eq!(cache.remove(&1), Some(10));
        assert!(!cache.contains(&1));
        assert!(cache.is_empty());
    }

    #[test]
    fn lookups_are_counted() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let cache = LocalEntityCache::new("post");
            cache.put(1_u64, "a");
            let _ = cache.get(&1);
            let _ = cache.get(&1);
            let _ = cache.get(&2);
        });

        let mut hits = 0;
        let mut misses = 0;
        for (key, _, _, value) in snapshotter.snapshot().into_vec() {
            let DebugValue::Counter(count) = value else {
                continue;
            };
            match key.key().name() {
                HIT_COUNTER => hits = count,
                MISS_COUNTER => misses = count,
                _ => {}
            }
        }
        assert_eq!(hits, 2);
        assert_eq!(misses, 1);
    }
}
