//! Shared request/response shapes used by the orchestrator and confirmation
//! engine, independent of the HTTP wire encoding (`dexgate-http` maps these
//! to/from JSON).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::family::Side;

/// `TransactionOutcome` (§3): the normalized terminal (or pending) result of
/// a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum OutcomeStatus {
    Failed = -1,
    Pending = 0,
    Confirmed = 1,
}

/// Full outcome record produced by the Confirmation Engine (C5) and
/// returned to the caller of `execute-swap`/`execute-quote`.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub status: OutcomeStatus,
    /// Transaction hash (account-nonce family) or signature (signature-hash
    /// family).
    pub chain_handle: String,
    pub fee: Option<u128>,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub base_token_balance_change: i128,
    pub quote_token_balance_change: i128,
}

/// A request to quote or execute a swap (§6.2).
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub network: String,
    pub wallet_address: String,
    pub base_token: String,
    pub quote_token: String,
    /// Raw, smallest-unit amount. Decimal-to-raw conversion using token
    /// decimals is a token-registry concern (an external collaborator per
    /// §1) and happens before the request reaches the orchestrator.
    pub amount: u128,
    pub side: Side,
    pub pool_address: Option<String>,
    pub slippage_pct: Option<Decimal>,
    pub use_native_balance: bool,
    /// Gas policy overrides (§6.4), forwarded to `TxBuilder::build_swap`
    /// unchanged; `None` means "auto" on both.
    pub gas_max_gwei: Option<u64>,
    pub gas_multiplier_pct: Option<u64>,
}

/// A request to execute a previously-quoted swap (§6.2,
/// `POST /connectors/<router>/execute-quote`).
#[derive(Debug, Clone)]
pub struct ExecuteQuoteRequest {
    pub network: String,
    pub wallet_address: String,
    pub quote_id: uuid::Uuid,
}

/// `QuoteResult` (§6.2): the response to `quote-swap`.
#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub pool_address: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub price: Decimal,
    pub slippage_pct: Decimal,
    pub min_amount_out: u128,
    pub max_amount_in: u128,
    pub price_impact_pct: Option<Decimal>,
}
