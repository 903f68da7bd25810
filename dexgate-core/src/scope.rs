//! The wallet key that shards every piece of per-wallet state.
//!
//! A [`WalletKey`] is `(scope, address)` where `scope` is a network name.
//! Distinct scopes for the same address are fully independent (invariant L4):
//! the same address on two chains never contends for the same lock or nonce
//! slot.

use std::fmt;

/// Sharding key used by the lock registry (C1) and nonce cache (C2).
///
/// Addresses are lowercased on construction so that callers passing
/// differently-cased hex addresses still land on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletKey {
    scope: String,
    address: String,
}

impl WalletKey {
    /// Creates a new wallet key. An empty scope is normalized to `"default"`.
    #[must_use]
    pub fn new(scope: impl Into<String>, address: impl Into<String>) -> Self {
        let scope = scope.into();
        let scope = if scope.is_empty() {
            "default".to_owned()
        } else {
            scope
        };
        Self {
            scope,
            address: address.into().to_lowercase(),
        }
    }

    /// The network scope this key belongs to.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The lowercased wallet address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_address() {
        let key = WalletKey::new("base", "0xABCDEF");
        assert_eq!(key.address(), "0xabcdef");
    }

    #[test]
    fn empty_scope_normalizes_to_default() {
        let key = WalletKey::new("", "0xabc");
        assert_eq!(key.scope(), "default");
    }

    #[test]
    fn distinct_scopes_are_distinct_keys() {
        let a = WalletKey::new("base", "0xabc");
        let b = WalletKey::new("solana", "0xabc");
        assert_ne!(a, b);
    }
}
