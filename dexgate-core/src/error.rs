//! Stable error taxonomy for the gateway (§7 of the specification).
//!
//! [`GatewayError`] is distinct from the HTTP status it maps to — the
//! mapping itself lives in `dexgate-http::error` so this crate stays
//! transport-agnostic.

/// Stable, caller-facing error kind. Each variant is deliberately coarse:
/// finer detail goes in the message, not in new variants, so the taxonomy
/// stays small and the wire contract stable.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed input, unknown token symbol, unknown pool.
    #[error("{0}")]
    Validation(String),

    /// Pool or quote missing/expired.
    #[error("{0}")]
    NotFound(String),

    /// Spending token or fee-token balance shortfall.
    #[error("{0}")]
    InsufficientFunds(String),

    /// Allowance too low and auto-approve is disallowed (hardware signer policy).
    #[error("{0}")]
    AllowanceRequired(String),

    /// Slippage / price-limit / liquidity, detected in simulate or submit.
    #[error("{0}")]
    SlippageOrLiquidity(String),

    /// Transaction expired between submit and chain acceptance (stale blockhash/reference block).
    #[error("{0}")]
    Expired(String),

    /// Submission-time error whose message matched a nonce-stale pattern.
    #[error("{0}")]
    NonceStale(String),

    /// Hardware device rejected the transaction.
    #[error("{0}")]
    DeviceRejected(String),

    /// Hardware device is locked.
    #[error("{0}")]
    DeviceLocked(String),

    /// Hardware device has the wrong app open.
    #[error("{0}")]
    DeviceWrongApp(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// `true` for error kinds the client may reasonably retry (§7 "Propagation").
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Expired(_) | Self::NonceStale(_))
    }
}

/// Pattern lists for the substring-based submit/simulate error classifier
/// (Design Notes §9: "Error-by-string-match" centralized as configuration).
#[derive(Debug, Clone)]
pub struct ErrorPatterns {
    /// Substrings that indicate a stale/expired nonce at submission time.
    pub nonce_stale: Vec<String>,
    /// Substrings that indicate a pool or quote could not be found.
    pub not_found: Vec<String>,
    /// Substrings that indicate slippage or liquidity failures.
    pub slippage_or_liquidity: Vec<String>,
    /// Substrings that indicate an expired transaction (stale blockhash/reference block).
    pub expired: Vec<String>,
    /// Substrings that indicate the hardware device rejected the request.
    pub device_rejected: Vec<String>,
    /// Substrings that indicate the hardware device is locked.
    pub device_locked: Vec<String>,
    /// Substrings that indicate the hardware device has the wrong app open.
    pub device_wrong_app: Vec<String>,
}

impl Default for ErrorPatterns {
    fn default() -> Self {
        Self {
            nonce_stale: vec![
                "NONCE_EXPIRED".to_owned(),
                "nonce too low".to_owned(),
                "nonce has already been used".to_owned(),
            ],
            not_found: vec!["pool not found".to_owned(), "quote not found".to_owned()],
            slippage_or_liquidity: vec![
                "slippage".to_owned(),
                "liquidity".to_owned(),
                "INSUFFICIENT_OUTPUT_AMOUNT".to_owned(),
            ],
            expired: vec![
                "blockhash".to_owned(),
                "block height exceeded".to_owned(),
                "expired".to_owned(),
            ],
            device_rejected: vec!["rejected".to_owned(), "denied by the user".to_owned()],
            device_locked: vec!["locked".to_owned()],
            device_wrong_app: vec!["wrong app".to_owned(), "open the".to_owned()],
        }
    }
}

impl ErrorPatterns {
    fn any_match(haystack: &str, patterns: &[String]) -> bool {
        let haystack = haystack.to_lowercase();
        patterns
            .iter()
            .any(|p| haystack.contains(&p.to_lowercase()))
    }

    /// Classifies a raw submission/simulation error message into the stable
    /// taxonomy. Falls back to `Internal` when nothing matches.
    #[must_use]
    pub fn classify(&self, message: &str) -> GatewayError {
        if Self::any_match(message, &self.device_locked) {
            return GatewayError::DeviceLocked(message.to_owned());
        }
        if Self::any_match(message, &self.device_wrong_app) {
            return GatewayError::DeviceWrongApp(message.to_owned());
        }
        if Self::any_match(message, &self.device_rejected) {
            return GatewayError::DeviceRejected(message.to_owned());
        }
        if Self::any_match(message, &self.nonce_stale) {
            return GatewayError::NonceStale(message.to_owned());
        }
        if Self::any_match(message, &self.not_found) {
            return GatewayError::NotFound(message.to_owned());
        }
        if Self::any_match(message, &self.expired) {
            return GatewayError::Expired(message.to_owned());
        }
        if Self::any_match(message, &self.slippage_or_liquidity) {
            return GatewayError::SlippageOrLiquidity(message.to_owned());
        }
        GatewayError::Internal(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_nonce_stale() {
        let patterns = ErrorPatterns::default();
        let err = patterns.classify("execution reverted: nonce too low");
        assert!(matches!(err, GatewayError::NonceStale(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn classifies_slippage() {
        let patterns = ErrorPatterns::default();
        let err = patterns.classify("Transaction would exceed max slippage");
        assert!(matches!(err, GatewayError::SlippageOrLiquidity(_)));
    }

    #[test]
    fn classifies_expired_blockhash() {
        let patterns = ErrorPatterns::default();
        let err = patterns.classify("Blockhash not found");
        assert!(matches!(err, GatewayError::Expired(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn falls_back_to_internal() {
        let patterns = ErrorPatterns::default();
        let err = patterns.classify("totally unrecognized failure");
        assert!(matches!(err, GatewayError::Internal(_)));
    }
}
