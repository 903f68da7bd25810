//! Nonce Cache (C2): per-`(scope, address)` next-usable-nonce tracking,
//! fused with the chain's live pending nonce (N1-N5).
//!
//! Every call that touches the cache entry for a key MUST happen while the
//! caller holds that key's lock from [`crate::lock::LockRegistry`] — the
//! cache itself performs no internal synchronization beyond the `DashMap`
//! shard lock, which is too short-lived to serialize a read-then-write
//! across an `.await`.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::Tunables;
use crate::family::NonceSource;
use crate::scope::WalletKey;

#[derive(Debug, Clone, Copy)]
struct NonceState {
    next_nonce: u64,
    updated_at: Instant,
}

/// The cache. Shared process-wide; absence of an entry means "unknown,
/// query the chain next time" (§3).
#[derive(Default)]
pub struct NonceCache {
    entries: DashMap<WalletKey, NonceState>,
}

impl NonceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next nonce to use for `key`, merging the chain's pending
    /// view with the local cache per N3/N4, and advancing the cache per N2.
    /// MUST be called under `key`'s lock.
    pub async fn next_nonce(
        &self,
        source: &dyn NonceSource,
        key: &WalletKey,
        tunables: &Tunables,
    ) -> Result<u64, String> {
        let pending = source.get_pending_nonce(key.address()).await?;
        let cached = self.entries.get(key).map(|e| *e);

        let chosen = match cached {
            None => pending,
            Some(state) => {
                let gap = state.next_nonce.saturating_sub(pending);
                let stale = gap >= tunables.max_nonce_gap
                    || state.updated_at.elapsed() >= tunables.max_cache_age;
                if stale {
                    pending
                } else {
                    pending.max(state.next_nonce)
                }
            }
        };

        self.entries.insert(
            key.clone(),
            NonceState {
                next_nonce: chosen + 1,
                updated_at: Instant::now(),
            },
        );
        Ok(chosen)
    }

    /// Drops the cache entry unconditionally. Called on suspected
    /// nonce-related submission errors.
    pub fn invalidate(&self, key: &WalletKey) {
        self.entries.remove(key);
    }

    /// Rolls a handed-out nonce back, but only if nothing newer has been
    /// handed out since (N5). Returns whether the rollback took effect.
    #[must_use]
    pub fn rollback(&self, key: &WalletKey, nonce: u64) -> bool {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.next_nonce == nonce + 1 {
            entry.next_nonce = nonce;
            entry.updated_at = Instant::now();
            true
        } else {
            false
        }
    }

    /// Test/diagnostic hook: directly sets the cached `next_nonce` without
    /// going through a chain query.
    #[cfg(test)]
    fn set_cached(&self, key: &WalletKey, next_nonce: u64, age: Duration) {
        self.entries.insert(
            key.clone(),
            NonceState {
                next_nonce,
                updated_at: Instant::now() - age,
            },
        );
    }
}
