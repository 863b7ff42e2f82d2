//! Process-wide read-through cache for idempotent WS calls.
//!
//! Each fingerprint owns a slot holding a `OnceCell`; concurrent misses on
//! the same fingerprint wait on the one in-flight fetch instead of all going
//! upstream. Failed fetches leave the slot empty so the next caller retries.

use crate::services::error::ServiceError;
use dashmap::DashMap;
use metrics::counter;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Default)]
struct Slot {
    cell: OnceCell<(Instant, Value)>,
}

pub struct WsCache {
    entries: DashMap<String, Arc<Slot>>,
    ttl: Duration,
}

impl WsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached value for `key`, running `fetch` at most once per
    /// fill when it is absent or expired.
    pub async fn get_or_try_insert<F, Fut>(&self, key: &str, fetch: F) -> Result<Value, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ServiceError>>,
    {
        let slot = {
            let mut entry = self
                .entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Slot::default()));
            let expired = entry
                .cell
                .get()
                .is_some_and(|(filled_at, _)| filled_at.elapsed() >= self.ttl);
            if expired {
                *entry = Arc::new(Slot::default());
            }
            Arc::clone(entry.value())
        };

        if let Some((_, value)) = slot.cell.get() {
            counter!("ws_cache_lookups_total", "outcome" => "hit").increment(1);
            return Ok(value.clone());
        }

        counter!("ws_cache_lookups_total", "outcome" => "miss").increment(1);
        let (_, value) = slot
            .cell
            .get_or_try_init(|| async { fetch().await.map(|v| (Instant::now(), v)) })
            .await?;

        Ok(value.clone())
    }

    /// Drop expired entries and empty slots nobody is waiting on.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot.cell.get() {
            Some((filled_at, _)) => filled_at.elapsed() < self.ttl,
            None => Arc::strong_count(slot) > 1,
        });
        before.saturating_sub(self.entries.len())
    }

    /// Periodic purge; a zero period is raised to one second.
    pub fn spawn_janitor(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = period.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = self.len(), "WS cache purged");
                }
            }
        })
    }
}

/// Stable cache key for one upstream call.
pub fn fingerprint(
    service_domain: &str,
    action: &str,
    params: &[Value],
    service: &str,
    user_uuid: &str,
) -> String {
    // serde_json maps are sorted, so equal params serialize identically.
    let canonical = json!([service_domain, action, params, service, user_uuid]).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<Value, ServiceError>> + Send>>
    {
        let calls = Arc::clone(calls);
        move || {
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(json!({ "n": n }))
            })
        }
    }

    #[tokio::test]
    async fn second_lookup_within_ttl_is_a_hit() {
        let cache = WsCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_try_insert("k", counting_fetch(&calls)).await.unwrap();
        let second = cache.get_or_try_insert("k", counting_fetch(&calls)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let cache = Arc::new(WsCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let lookups = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            let fetch = counting_fetch(&calls);
            tokio::spawn(async move { cache.get_or_try_insert("k", fetch).await })
        });
        let results = futures::future::join_all(lookups).await;

        for result in results {
            assert_eq!(result.unwrap().unwrap(), json!({ "n": 0 }));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = WsCache::new(Duration::from_secs(60));

        let err = cache
            .get_or_try_insert("k", || async { Err(ServiceError::ws(500, "boom")) })
            .await;
        assert!(err.is_err());

        let ok = cache
            .get_or_try_insert("k", || async { Ok(json!(true)) })
            .await
            .unwrap();
        assert_eq!(ok, json!(true));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = WsCache::new(Duration::from_secs(5));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_try_insert("k", counting_fetch(&calls)).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        let refreshed = cache.get_or_try_insert("k", counting_fetch(&calls)).await.unwrap();

        assert_eq!(refreshed, json!({ "n": 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_expired_entries() {
        let cache = WsCache::new(Duration::from_secs(5));

        cache.get_or_try_insert("a", || async { Ok(json!(1)) }).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        cache.get_or_try_insert("b", || async { Ok(json!(2)) }).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fingerprint_ignores_key_order_but_not_scope() {
        let a = fingerprint("fichiers", "getFlexDossiers", &[json!({"a": 1, "b": 2})], "p1", "u1");
        let b = fingerprint("fichiers", "getFlexDossiers", &[json!({"b": 2, "a": 1})], "p1", "u1");
        let other_project = fingerprint("fichiers", "getFlexDossiers", &[json!({"a": 1, "b": 2})], "p2", "u1");
        let other_user = fingerprint("fichiers", "getFlexDossiers", &[json!({"a": 1, "b": 2})], "p1", "u2");

        assert_eq!(a, b);
        assert_ne!(a, other_project);
        assert_ne!(a, other_user);
        assert_eq!(a.len(), 64);
    }
}
