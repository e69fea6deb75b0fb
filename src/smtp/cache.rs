//! Per-server catch-all verdict cache. Keyed by `(domain, mx host)`
//! because different exchangers for one domain can run different
//! policies. The payload is either the catch-all sentinel or the
//! verbatim rejection text of the dummy probe.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};

const CATCH_ALL_TTL: Duration = Duration::from_secs(60 * 60);

static SHARED: LazyLock<CatchAllCache> = LazyLock::new(CatchAllCache::new);

pub(crate) fn shared() -> &'static CatchAllCache {
    &SHARED
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CachedProbe {
    /// The server accepted the dummy RCPT.
    CatchAll,
    /// The server's verbatim reply text to the dummy RCPT.
    Rejection(String),
}

#[derive(Debug)]
pub(crate) struct CatchAllCache {
    entries: Mutex<HashMap<(String, String), CatchAllEntry>>,
}

#[derive(Debug, Clone)]
struct CatchAllEntry {
    value: CachedProbe,
    expires_at: Instant,
}

impl CatchAllCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, domain: &str, exchange: &str) -> Option<CachedProbe> {
        let key = (domain.to_string(), exchange.to_string());
        let mut entries = self.entries.lock().expect("catch-all cache poisoned");
        match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn insert(&self, domain: &str, exchange: &str, value: CachedProbe) {
        self.entries
            .lock()
            .expect("catch-all cache poisoned")
            .insert(
                (domain.to_string(), exchange.to_string()),
                CatchAllEntry {
                    value,
                    expires_at: Instant::now() + CATCH_ALL_TTL,
                },
            );
    }
}
