//! TTL-keyed cache for `has_mx_record` verdicts. Process-wide, shared by
//! every probe; expired entries count as misses.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};

const POSITIVE_TTL: Duration = Duration::from_secs(5 * 60);
const NEGATIVE_TTL: Duration = Duration::from_secs(60);

static SHARED: LazyLock<DnsCache> = LazyLock::new(DnsCache::new);

pub(crate) fn shared() -> &'static DnsCache {
    &SHARED
}

#[derive(Debug)]
pub(crate) struct DnsCache {
    entries: Mutex<HashMap<String, DnsCacheEntry>>,
}

#[derive(Debug, Clone, Copy)]
struct DnsCacheEntry {
    has_mail_reachable_record: bool,
    expires_at: Instant,
}

impl DnsCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, domain: &str) -> Option<bool> {
        let mut entries = self.entries.lock().expect("dns cache poisoned");
        match entries.get(domain) {
            Some(entry) if entry.expires_at > Instant::now() => {
                Some(entry.has_mail_reachable_record)
            }
            Some(_) => {
                entries.remove(domain);
                None
            }
            None => None,
        }
    }

    pub(crate) fn insert(&self, domain: &str, has_mail_reachable_record: bool) {
        let ttl = if has_mail_reachable_record {
            POSITIVE_TTL
        } else {
            NEGATIVE_TTL
        };
        self.entries
            .lock()
            .expect("dns cache poisoned")
            .insert(
                domain.to_string(),
                DnsCacheEntry {
                    has_mail_reachable_record,
                    expires_at: Instant::now() + ttl,
                },
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let cache = DnsCache::new();
        assert_eq!(cache.get("example.com"), None);
        cache.insert("example.com", true);
        assert_eq!(cache.get("example.com"), Some(true));
    }

    #[test]
    fn negative_entries_are_stored_too() {
        let cache = DnsCache::new();
        cache.insert("nomx.example", false);
        assert_eq!(cache.get("nomx.example"), Some(false));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = DnsCache::new();
        cache
            .entries
            .lock()
            .unwrap()
            .insert(
                "stale.example".to_string(),
                DnsCacheEntry {
                    has_mail_reachable_record: true,
                    expires_at: Instant::now() - Duration::from_secs(1),
                },
            );
        assert_eq!(cache.get("stale.example"), None);
    }
}
