//! In-memory key→value cache with per-entry expiry.
//!
//! Shields oracle backends from repeated lookups. Entries are stamped with
//! an expiry deadline on insert and purged lazily on read; there is no
//! background eviction task, so [`clear`](TtlCache::clear) is all the
//! teardown the cache needs.
//!
//! All operations are synchronous and must stay cheap: the cache sits on
//! the hot path of every lookup and is shared across all in-flight
//! requests.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now > deadline,
            None => false,
        }
    }
}

/// Key→value store with a cache-wide time-to-live.
///
/// A `default_ttl` of `None` means entries never expire. A `get` on an
/// expired entry removes it, so the slot behaves exactly like a miss until
/// the next `set`.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    default_ttl: Option<Duration>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Store a value under `key` with the configured TTL.
    pub fn set(&self, key: K, value: V) {
        let expires_at = self.default_ttl.map(|ttl| Instant::now() + ttl);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, Entry { value, expires_at });
        }
    }

    /// Fetch the value under `key`, if present and not expired.
    ///
    /// A read past the expiry deadline removes the entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: upgrade to a write lock and drop the entry. Re-check
        // under the write lock since another set may have raced us.
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| e.is_expired(now)) {
                entries.remove(key);
            }
        }
        None
    }

    /// Remove the entry under `key`, if any.
    pub fn remove(&self, key: &K) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_what_was_set() {
        let cache: TtlCache<String, String> = TtlCache::new(Some(Duration::from_secs(60)));
        cache.set("k".into(), "v".into());
        assert_eq!(cache.get(&"k".into()), Some("v".into()));
    }

    #[test]
    fn missing_key_is_none() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        assert_eq!(cache.get(&"absent".into()), None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Some(Duration::from_millis(20)));
        cache.set("k".into(), 1);
        assert_eq!(cache.get(&"k".into()), Some(1));

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"k".into()), None);
        // The expired read removed the entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn no_ttl_means_no_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        cache.set("k".into(), 1);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"k".into()), Some(1));
    }

    #[test]
    fn set_resets_an_expired_slot() {
        let cache: TtlCache<String, u32> = TtlCache::new(Some(Duration::from_millis(20)));
        cache.set("k".into(), 1);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"k".into()), None);

        cache.set("k".into(), 2);
        assert_eq!(cache.get(&"k".into()), Some(2));
    }

    #[test]
    fn clear_drops_everything() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.clear();
        assert_eq!(cache.get(&"a".into()), None);
        assert_eq!(cache.get(&"b".into()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_targets_a_single_key() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.remove(&"a".into());
        assert_eq!(cache.get(&"a".into()), None);
        assert_eq!(cache.get(&"b".into()), Some(2));
    }
}
