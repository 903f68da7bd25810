//! Quote Cache (C3): short-TTL store binding a `quote_id` to a pre-computed
//! route and the original request, consumed at most once by `execute-quote`.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::family::RoutePayload;

/// A cached quote (§3 `CachedQuote`). `original_request` is kept as an
/// opaque JSON value since `dexgate-core` does not know the wire schema.
#[derive(Debug, Clone)]
pub struct CachedQuote {
    pub quote_id: Uuid,
    pub route_payload: RoutePayload,
    pub original_request: serde_json::Value,
    created_at: Instant,
    ttl: Duration,
}

impl CachedQuote {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// The cache. Does not serialize per wallet itself — the caller
/// (`execute-quote`, inside the orchestrator) acquires the wallet lock
/// separately before consuming an entry.
#[derive(Default)]
pub struct QuoteCache {
    entries: DashMap<Uuid, CachedQuote>,
}

impl QuoteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly-computed route under a new quote id and returns it.
    pub fn put(
        &self,
        route_payload: RoutePayload,
        original_request: serde_json::Value,
        ttl: Duration,
    ) -> Uuid {
        let quote_id = Uuid::new_v4();
        self.entries.insert(
            quote_id,
            CachedQuote {
                quote_id,
                route_payload,
                original_request,
                created_at: Instant::now(),
                ttl,
            },
        );
        quote_id
    }

    /// Looks up a quote id. Returns `None` if absent or expired (Q2); an
    /// expired entry found during lookup is lazily evicted.
    #[must_use]
    pub fn get(&self, quote_id: Uuid) -> Option<CachedQuote> {
        let expired = self.entries.get(&quote_id).is_some_and(|e| e.is_expired());
        if expired {
            self.entries.remove(&quote_id);
            return None;
        }
        self.entries.get(&quote_id).map(|e| e.clone())
    }

    /// Removes an entry unconditionally. Called only after a `CONFIRMED`
    /// outcome for `execute-quote` (Q1); `PENDING`/`FAILED` must not call
    /// this (Q3).
    pub fn delete(&self, quote_id: Uuid) {
        self.entries.remove(&quote_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> RoutePayload {
        RoutePayload {
            pool_address: "pool".to_owned(),
            token_in: "USDC".to_owned(),
            token_out: "WETH".to_owned(),
            amount_in: 1_000,
            amount_out: 500,
            min_amount_out: 490,
            max_amount_in: 1_010,
            price: rust_decimal::Decimal::ONE,
            price_impact_pct: None,
            side: crate::family::Side::Sell,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = QuoteCache::new();
        let id = cache.put(route(), serde_json::json!({"ok": true}), Duration::from_secs(30));
        let found = cache.get(id).expect("present");
        assert_eq!(found.quote_id, id);
    }

    #[test]
    fn expired_entry_is_absent() {
        let cache = QuoteCache::new();
        let id = cache.put(route(), serde_json::Value::Null, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn delete_removes_entry() {
        let cache = QuoteCache::new();
        let id = cache.put(route(), serde_json::Value::Null, Duration::from_secs(30));
        cache.delete(id);
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn unknown_id_is_absent() {
        let cache = QuoteCache::new();
        assert!(cache.get(Uuid::new_v4()).is_none());
    }
}
