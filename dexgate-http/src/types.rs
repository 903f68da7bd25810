//! Exact wire shapes for the nonce-coordination and swap endpoints (§6.1,
//! §6.2), matching the teacher's `axum::Json<T>` extractor/response idiom.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---- §6.1 Nonce Coordination Endpoints ----

#[derive(Debug, Deserialize)]
pub struct NonceAcquireRequest {
    pub network: String,
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    #[serde(rename = "ttlMs")]
    pub ttl_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct NonceAcquireResponse {
    #[serde(rename = "lockId")]
    pub lock_id: Uuid,
    pub nonce: u64,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct NonceReleaseRequest {
    pub network: String,
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    #[serde(rename = "lockId")]
    pub lock_id: Uuid,
    #[serde(rename = "transactionSent")]
    pub transaction_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct NonceReleaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NonceInvalidateRequest {
    pub network: String,
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
pub struct NonceInvalidateResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct NonceStatusResponse {
    #[serde(rename = "activeLocks")]
    pub active_locks: usize,
    pub locks: Vec<LockStatusEntry>,
}

#[derive(Debug, Serialize)]
pub struct LockStatusEntry {
    #[serde(rename = "lockId")]
    pub lock_id: Uuid,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub nonce: Option<u64>,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    #[serde(rename = "isExpired")]
    pub is_expired: bool,
}

// ---- §6.2 Swap Endpoints ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WireSide {
    Buy,
    Sell,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteSwapRequest {
    pub network: String,
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    #[serde(rename = "baseToken")]
    pub base_token: String,
    #[serde(rename = "quoteToken")]
    pub quote_token: String,
    pub amount: u128,
    pub side: WireSide,
    #[serde(rename = "poolAddress")]
    pub pool_address: Option<String>,
    #[serde(rename = "slippagePct")]
    pub slippage_pct: Option<Decimal>,
    #[serde(rename = "useNativeBalance", default)]
    pub use_native_balance: bool,
    #[serde(rename = "gasMax", default)]
    pub gas_max_gwei: Option<u64>,
    #[serde(rename = "gasMultiplierPct", default)]
    pub gas_multiplier_pct: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteQuoteRequest {
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    pub network: String,
    #[serde(rename = "quoteId")]
    pub quote_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SwapExecuteResponse {
    pub signature: String,
    pub status: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SwapExecuteData>,
}

#[derive(Debug, Serialize)]
pub struct SwapExecuteData {
    #[serde(rename = "tokenIn")]
    pub token_in: String,
    #[serde(rename = "tokenOut")]
    pub token_out: String,
    #[serde(rename = "amountIn")]
    pub amount_in: u128,
    #[serde(rename = "amountOut")]
    pub amount_out: u128,
    pub fee: Option<u128>,
    #[serde(rename = "baseTokenBalanceChange")]
    pub base_token_balance_change: i128,
    #[serde(rename = "quoteTokenBalanceChange")]
    pub quote_token_balance_change: i128,
}
