//! Tunable knobs shared by the lock registry, nonce cache, and confirmation
//! engine (§4.2 / §4.5 of the specification). Each field has the spec's
//! stated default so a caller can use [`Tunables::default()`] untouched.

use std::time::Duration;

/// Per-network tunables. One instance is held per chain adapter; values are
/// read from configuration at startup and never mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    /// N2: nonces ahead of the on-chain pending nonce beyond this gap are
    /// treated as stale and discarded rather than handed out.
    pub max_nonce_gap: u64,
    /// Cached nonce state older than this is refreshed from the chain before
    /// being handed out, regardless of gap.
    pub max_cache_age: Duration,
    /// Default TTL for a leased lock acquired via `acquire_leased` when the
    /// caller does not specify one.
    pub default_lease_ttl: Duration,
    /// Upper bound on any lease TTL, caller-specified or default.
    pub max_lease_ttl: Duration,
    /// How long the Confirmation Engine polls before giving up (§4.5).
    pub confirmation_timeout: Duration,
    /// Interval between successive confirmation polls (§4.5).
    pub polling_interval: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            max_nonce_gap: 5,
            max_cache_age: Duration::from_secs(120),
            default_lease_ttl: Duration::from_secs(60),
            max_lease_ttl: Duration::from_secs(300),
            confirmation_timeout: Duration::from_secs(60),
            polling_interval: Duration::from_secs(2),
        }
    }
}

impl Tunables {
    /// Clamps a caller-requested lease TTL to `[1s, max_lease_ttl]`, falling
    /// back to `default_lease_ttl` when `requested` is `None`.
    #[must_use]
    pub fn clamp_lease_ttl(&self, requested: Option<Duration>) -> Duration {
        let ttl = requested.unwrap_or(self.default_lease_ttl);
        ttl.clamp(Duration::from_secs(1), self.max_lease_ttl)
    }
}

/// Policy for whether the gateway may submit an ERC-20 `approve` transaction
/// on the caller's behalf when allowance is insufficient (one of the three
/// open questions of Design Notes §9, resolved here as configuration rather
/// than left ambiguous).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoApprovePolicy {
    /// Never submit an approval automatically; surface `AllowanceRequired`
    /// and let the caller drive an explicit approve flow. Default, because a
    /// hardware signer silently prompted for an unexpected approval is
    /// exactly the surprise the spec's device-state edge cases warn about.
    #[default]
    Never,
    /// Submit an approval automatically whenever the signer is software
    /// (never for a hardware-classified signer).
    SoftwareSignerOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lease_ttl_used_when_unspecified() {
        let tunables = Tunables::default();
        assert_eq!(
            tunables.clamp_lease_ttl(None),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn lease_ttl_clamped_to_max() {
        let tunables = Tunables::default();
        assert_eq!(
            tunables.clamp_lease_ttl(Some(Duration::from_secs(10_000))),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn lease_ttl_clamped_to_min() {
        let tunables = Tunables::default();
        assert_eq!(
            tunables.clamp_lease_ttl(Some(Duration::from_millis(10))),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn default_auto_approve_policy_is_never() {
        assert_eq!(AutoApprovePolicy::default(), AutoApprovePolicy::Never);
    }
}
