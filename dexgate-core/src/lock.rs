//! Wallet Lock Registry (C1): per-`(scope, address)` mutual exclusion with a
//! strictly FIFO queue, shared by an internal acquire form (used by the
//! orchestrator) and an externalizable leased form with a TTL and an
//! explicit release-by-id (used by the coordination API).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::scope::WalletKey;

/// A held internal lock. Dropping it releases the key to the next waiter.
/// `release()` does the same thing explicitly; calling it is optional and
/// a second call is simply unreachable since it consumes `self` (L3:
/// "every acquire is paired with exactly one release").
pub struct LockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl LockGuard {
    /// Releases the lock now rather than waiting for drop.
    pub fn release(self) {
        drop(self);
    }
}

/// Result of `acquire_leased`: the externally-visible handle for a lease.
#[derive(Debug, Clone, Copy)]
pub struct LeaseGrant {
    pub lock_id: Uuid,
    pub expires_at: Instant,
}

/// A lease that the reaper found expired, carrying whatever nonce was
/// snapshotted at acquisition so the caller can drive `C2::rollback`.
/// `LockRegistry` itself has no knowledge of nonce semantics (§9: module
/// coupling is resolved by the owning `CoordinationState`, not inside C1).
#[derive(Debug, Clone)]
pub struct ExpiredLease {
    pub lock_id: Uuid,
    pub key: WalletKey,
    pub nonce_snapshot: Option<u64>,
}

/// What `release_by_id` hands back about the lease it just removed.
#[derive(Debug, Clone)]
pub struct ReleasedLease {
    pub key: WalletKey,
    pub nonce_snapshot: Option<u64>,
}

/// A snapshot row for the `status()` operation.
#[derive(Debug, Clone)]
pub struct LeaseStatus {
    pub lock_id: Uuid,
    pub scope: String,
    pub address: String,
    pub nonce: Option<u64>,
    pub expires_at: Instant,
    pub is_expired: bool,
}

struct Lease {
    key: WalletKey,
    nonce_snapshot: Option<u64>,
    expires_at: Instant,
    // Held for as long as the lease is alive; dropping it grants the queue
    // to the next waiter.
    guard: OwnedMutexGuard<()>,
}

/// The registry. One instance is shared (behind an `Arc`) by the
/// orchestrator and the coordination API for the whole process lifetime.
#[derive(Default)]
pub struct LockRegistry {
    queues: DashMap<WalletKey, Arc<Mutex<()>>>,
    leases: DashMap<Uuid, Lease>,
}

impl LockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_for(&self, key: &WalletKey) -> Arc<Mutex<()>> {
        self.queues
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Enqueues the caller and suspends until every prior holder for `key`
    /// has released (L1, L2). Leased and non-leased acquisitions share the
    /// same underlying queue, so there is no priority between them.
    pub async fn acquire(&self, key: &WalletKey) -> LockGuard {
        let queue = self.queue_for(key);
        let guard = queue.lock_owned().await;
        LockGuard { _guard: guard }
    }

    /// Same serialization as `acquire`, but the grant is recorded under a
    /// process-unique `lock_id` with an expiry deadline so an external
    /// caller can release it later by id, or let the reaper reclaim it.
    pub async fn acquire_leased(&self, key: WalletKey, ttl: Duration) -> LeaseGrant {
        let queue = self.queue_for(&key);
        let guard = queue.lock_owned().await;
        let lock_id = Uuid::new_v4();
        let expires_at = Instant::now() + ttl;
        self.leases.insert(
            lock_id,
            Lease {
                key,
                nonce_snapshot: None,
                expires_at,
                guard,
            },
        );
        LeaseGrant { lock_id, expires_at }
    }

    /// Records the nonce handed out for an already-granted lease, so a
    /// later expiry or release can roll it back. A no-op if the lease is
    /// gone (already released or reaped).
    pub fn set_nonce_snapshot(&self, lock_id: Uuid, nonce: u64) {
        if let Some(mut lease) = self.leases.get_mut(&lock_id) {
            lease.nonce_snapshot = Some(nonce);
        }
    }

    /// Releases a lease by id, returning the key and nonce snapshot it was
    /// holding so the caller can decide on a rollback. Returns `None`
    /// without error if the id is unknown or already released (L3: double
    /// release is a no-op).
    #[must_use]
    pub fn release_by_id(&self, lock_id: Uuid) -> Option<ReleasedLease> {
        self.leases
            .remove(&lock_id)
            .map(|(_, lease)| ReleasedLease {
                key: lease.key,
                nonce_snapshot: lease.nonce_snapshot,
            })
    }

    /// Returns the nonce snapshot for a live lease, if any, without
    /// releasing it. Used by the coordination API's `release` handler to
    /// decide whether a rollback is needed before releasing.
    #[must_use]
    pub fn nonce_snapshot(&self, lock_id: Uuid) -> Option<u64> {
        self.leases.get(&lock_id).and_then(|l| l.nonce_snapshot)
    }

    /// Releases every lease whose deadline has passed and returns them so
    /// the caller can drive any cross-component rollback. Invoked
    /// periodically by a background reaper task; never blocks.
    pub fn reap_expired(&self) -> Vec<ExpiredLease> {
        let now = Instant::now();
        let expired_ids: Vec<Uuid> = self
            .leases
            .iter()
            .filter(|entry| entry.value().expires_at <= now)
            .map(|entry| *entry.key())
            .collect();

        expired_ids
            .into_iter()
            .filter_map(|lock_id| {
                self.leases.remove(&lock_id).map(|(_, lease)| ExpiredLease {
                    lock_id,
                    key: lease.key,
                    nonce_snapshot: lease.nonce_snapshot,
                })
            })
            .collect()
    }

    /// Snapshot of all currently-live leases.
    #[must_use]
    pub fn status(&self) -> Vec<LeaseStatus> {
        let now = Instant::now();
        self.leases
            .iter()
            .map(|entry| {
                let lease = entry.value();
                LeaseStatus {
                    lock_id: *entry.key(),
                    scope: lease.key.scope().to_owned(),
                    address: lease.key.address().to_owned(),
                    nonce: lease.nonce_snapshot,
                    expires_at: lease.expires_at,
                    is_expired: lease.expires_at <= now,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn key(addr: &str) -> WalletKey {
        WalletKey::new("base", addr)
    }

    #[tokio::test]
    async fn second_acquire_waits_for_first_release() {
        let registry = Arc::new(LockRegistry::new());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let first_guard = registry.acquire(&key("0xabc")).await;
        order.lock().unwrap().push("first-acquired");

        let registry2 = registry.clone();
        let order2 = order.clone();
        let handle = tokio::spawn(async move {
            let _guard = registry2.acquire(&key("0xabc")).await;
            order2.lock().unwrap().push("second-acquired");
        });

        // Give the spawned task a chance to enqueue and block.
        tokio::task::yield_now().await;
        order.lock().unwrap().push("first-released");
        drop(first_guard);

        handle.await.unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["first-acquired", "first-released", "second-acquired"]
        );
    }

    #[tokio::test]
    async fn distinct_scopes_do_not_contend() {
        let registry = LockRegistry::new();
        let a = registry.acquire(&WalletKey::new("base", "0xabc")).await;
        let b = registry
            .acquire(&WalletKey::new("solana", "0xabc"))
            .await;
        drop(a);
        drop(b);
    }

    #[tokio::test]
    async fn release_by_id_is_idempotent() {
        let registry = LockRegistry::new();
        let grant = registry
            .acquire_leased(key("0xabc"), Duration::from_secs(60))
            .await;
        assert!(registry.release_by_id(grant.lock_id).is_some());
        assert!(registry.release_by_id(grant.lock_id).is_none());
    }

    #[tokio::test]
    async fn reap_expired_releases_and_reports_nonce() {
        let registry = LockRegistry::new();
        let grant = registry
            .acquire_leased(key("0xabc"), Duration::from_millis(1))
            .await;
        registry.set_nonce_snapshot(grant.lock_id, 42);

        tokio::time::sleep(Duration::from_millis(10)).await;
        let expired = registry.reap_expired();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].lock_id, grant.lock_id);
        assert_eq!(expired[0].nonce_snapshot, Some(42));
        assert!(registry.status().is_empty());
    }

    #[tokio::test]
    async fn reaped_lease_unblocks_next_acquire_immediately() {
        let registry = LockRegistry::new();
        let _grant = registry
            .acquire_leased(key("0xabc"), Duration::from_millis(1))
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.reap_expired();

        let attempts = AtomicU32::new(0);
        attempts.fetch_add(1, Ordering::SeqCst);
        let next = tokio::time::timeout(
            Duration::from_millis(50),
            registry.acquire_leased(key("0xabc"), Duration::from_secs(60)),
        )
        .await;
        assert!(next.is_ok());
    }
}
