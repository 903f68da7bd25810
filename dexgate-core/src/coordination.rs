//! External Coordination API (C6): exposes C1 (lock) and C2 (nonce) to a
//! cooperating external process through `acquire`/`release`/`invalidate`/
//! `status`, plus [`CoordinationState`], the single owned value that C4 and
//! C6 share (Design Notes §9: "a single `CoordinationState` value owned by
//! C4/C6 and passed explicitly; avoid global variables").

use std::time::Duration;

use uuid::Uuid;

use crate::config::{AutoApprovePolicy, Tunables};
use crate::error::ErrorPatterns;
use crate::family::NonceSource;
use crate::lock::{LeaseStatus, LockRegistry};
use crate::nonce::NonceCache;
use crate::quote::QuoteCache;
use crate::scope::WalletKey;

/// Process-wide coordination state: one instance, constructed once at
/// startup and shared (behind an `Arc`) by every request handler and the
/// background reaper.
#[derive(Default)]
pub struct CoordinationState {
    pub lock: LockRegistry,
    pub nonce: NonceCache,
    pub quote: QuoteCache,
    pub tunables: Tunables,
    pub error_patterns: ErrorPatterns,
    pub auto_approve_policy: AutoApprovePolicy,
}

/// Response to `acquire` (§4.6, §6.1).
#[derive(Debug, Clone, Copy)]
pub struct AcquireResult {
    pub lock_id: Uuid,
    pub nonce: u64,
    pub expires_at: std::time::Instant,
}

/// Response to `release` (§4.6, §6.1). "Not found" is `success: false` with
/// no error raised to the transport layer.
#[derive(Debug, Clone)]
pub struct ReleaseResult {
    pub success: bool,
    pub message: Option<String>,
}

impl CoordinationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One call equals one `C1.acquire_leased` followed by one
    /// `C2.next_nonce` (§4.6).
    pub async fn acquire(
        &self,
        nonce_source: &dyn NonceSource,
        key: WalletKey,
        ttl_ms: Option<u64>,
    ) -> Result<AcquireResult, String> {
        let ttl = self
            .tunables
            .clamp_lease_ttl(ttl_ms.map(Duration::from_millis));
        let grant = self.lock.acquire_leased(key.clone(), ttl).await;
        let nonce = self
            .nonce
            .next_nonce(nonce_source, &key, &self.tunables)
            .await?;
        self.lock.set_nonce_snapshot(grant.lock_id, nonce);
        Ok(AcquireResult {
            lock_id: grant.lock_id,
            nonce,
            expires_at: grant.expires_at,
        })
    }

    /// On `transaction_sent=false`, rolls the snapshotted nonce back before
    /// releasing the lock (§4.6). "Not found" is success=false, not an
    /// error.
    #[must_use]
    pub fn release(&self, lock_id: Uuid, transaction_sent: bool) -> ReleaseResult {
        let Some(released) = self.lock.release_by_id(lock_id) else {
            return ReleaseResult {
                success: false,
                message: Some("not found".to_owned()),
            };
        };

        if !transaction_sent {
            if let Some(nonce) = released.nonce_snapshot {
                self.nonce.rollback(&released.key, nonce);
            }
        }

        ReleaseResult {
            success: true,
            message: None,
        }
    }

    /// Drops the nonce cache entry for a key unconditionally.
    pub fn invalidate(&self, key: &WalletKey) {
        self.nonce.invalidate(key);
    }

    /// Snapshot of all currently-live leases.
    #[must_use]
    pub fn status(&self) -> Vec<LeaseStatus> {
        self.lock.status()
    }

    /// Runs one reaper sweep: releases every expired lease and rolls back
    /// its nonce snapshot. Returns the number of leases reaped. Intended to
    /// be called from a `tokio::spawn`-ed loop on a coarse interval (§4.1,
    /// §5).
    pub fn reap_once(&self) -> usize {
        let expired = self.lock.reap_expired();
        let count = expired.len();
        for lease in expired {
            if let Some(nonce) = lease.nonce_snapshot {
                self.nonce.rollback(&lease.key, nonce);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::BoxFuture;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedPending(AtomicU64);

    impl NonceSource for FixedPending {
        fn get_pending_nonce<'a>(&'a self, _address: &'a str) -> BoxFuture<'a, Result<u64, String>> {
            let value = self.0.load(Ordering::SeqCst);
            Box::pin(async move { Ok(value) })
        }
    }

    fn key() -> WalletKey {
        WalletKey::new("base", "0xabc")
    }

    #[tokio::test]
    async fn happy_path_nonce_handout() {
        let state = CoordinationState::new();
        let source = FixedPending(AtomicU64::new(10));

        let first = state.acquire(&source, key(), None).await.unwrap();
        assert_eq!(first.nonce, 10);
        let release = state.release(first.lock_id, true);
        assert!(release.success);

        let second = state.acquire(&source, key(), None).await.unwrap();
        assert_eq!(second.nonce, 11);
    }

    #[tokio::test]
    async fn rollback_on_unsent() {
        let state = CoordinationState::new();
        let source = FixedPending(AtomicU64::new(20));

        let first = state.acquire(&source, key(), None).await.unwrap();
        assert_eq!(first.nonce, 20);
        state.release(first.lock_id, false);

        let second = state.acquire(&source, key(), None).await.unwrap();
        assert_eq!(second.nonce, 20);
    }

    #[tokio::test]
    async fn release_is_idempotent_http_style() {
        let state = CoordinationState::new();
        let source = FixedPending(AtomicU64::new(1));
        let grant = state.acquire(&source, key(), None).await.unwrap();

        let first = state.release(grant.lock_id, true);
        assert!(first.success);
        let second = state.release(grant.lock_id, true);
        assert!(!second.success);
        assert_eq!(second.message.as_deref(), Some("not found"));
    }

    #[tokio::test]
    async fn expired_lease_reclaim() {
        let state = CoordinationState::new();
        let source = FixedPending(AtomicU64::new(1));
        let _grant = state.acquire(&source, key(), Some(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(state.reap_once() >= 1);
        assert!(state.status().is_empty());
    }
}
