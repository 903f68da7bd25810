//! Chain family capability traits (Design Notes §9: "dynamic dispatch
//! between pool families ... a small trait-like capability set per family;
//! the orchestrator composes these generically").
//!
//! Rather than one monolithic `ChainFamily` trait, the orchestrator is
//! generic over a handful of narrow capabilities, mirroring the teacher's
//! `ChainProviderOps`/`Facilitator` split: a chain crate implements only the
//! capabilities that make sense for its transaction model. `dexgate-evm`
//! (account-nonce family) implements all of them; `dexgate-svm`
//! (signature-hash family) implements every capability except
//! [`NonceSource`] and [`AllowanceSource`], which have no Solana analogue.

use std::future::Future;
use std::pin::Pin;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Boxed future alias matching the teacher's dyn-compatible async trait
/// pattern (`r402::facilitator::BoxFuture`) — used instead of `async-trait`
/// so these traits stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which side of the pair the caller is trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// An opaque unsigned transaction, carried as already-encoded bytes. The
/// encoding is chain-family specific; the orchestrator never inspects it.
#[derive(Debug, Clone)]
pub struct UnsignedTx(pub Vec<u8>);

/// An opaque signed transaction, ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTx(pub Vec<u8>);

/// An opaque handle returned by `Submitter::submit`, used by `Poller`.
/// Renders as the transaction hash (account-nonce family) or signature
/// (signature-hash family) for the wire response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHandle(pub String);

/// Terminal or non-terminal status observed by `Poller::poll`.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Pending,
    Confirmed {
        fee: Option<u128>,
        base_token_delta: i128,
        quote_token_delta: i128,
    },
    Failed {
        reason: String,
    },
}

/// A pre-computed swap route, produced by `RouteBuilder::compute_route` and
/// consumed by `TxBuilder::build_swap`. Amounts are raw integer (smallest
/// unit) values; slippage has already been applied (§4.4.3: "applied to the
/// raw integer amount, not the float-formatted amount").
#[derive(Debug, Clone)]
pub struct RoutePayload {
    pub pool_address: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub min_amount_out: u128,
    pub max_amount_in: u128,
    pub price: Decimal,
    pub price_impact_pct: Option<Decimal>,
    /// Which side this route was built for, carried so later steps know
    /// whether the "required" spend is `amount_in` (SELL/ExactIn) or
    /// `max_amount_in` (BUY/ExactOut) without re-deriving it (§4.4.3).
    pub side: Side,
}

/// Account-nonce family only: exposes the chain's view of the next usable
/// nonce for an address. `dexgate-core::nonce` calls this, never the
/// orchestrator directly.
pub trait NonceSource: Send + Sync {
    fn get_pending_nonce<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<u64, String>>;
}

/// Account-nonce family only: ERC-20-style allowance probing and approval
/// construction.
pub trait AllowanceSource: Send + Sync {
    fn allowance<'a>(
        &'a self,
        owner: &'a str,
        token: &'a str,
        spender: &'a str,
    ) -> BoxFuture<'a, Result<u128, String>>;

    fn build_approve<'a>(
        &'a self,
        owner: &'a str,
        token: &'a str,
        spender: &'a str,
        amount: u128,
        nonce: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>>;

    /// The bridge contract address for a two-hop allowance design
    /// (owner→bridge-contract→router), if this chain uses one. `None`
    /// means the single owner→spender hop already probed is the only hop
    /// (§4.4.2 step 2: "for two-hop allowance designs ... probe both
    /// hops; only approve the one that is short").
    fn bridge_spender(&self) -> Option<&str> {
        None
    }
}

/// Both families: reads a token (or native asset) balance for an owner.
pub trait BalanceSource: Send + Sync {
    fn balance<'a>(&'a self, owner: &'a str, token: &'a str) -> BoxFuture<'a, Result<u128, String>>;
}

/// Both families: computes a route for a pool, dispatching internally
/// between pool programs (AMM vs CLMM) per §4.4.3/§4.8.
pub trait RouteBuilder: Send + Sync {
    fn compute_route<'a>(
        &'a self,
        pool: &'a str,
        token_in: &'a str,
        token_out: &'a str,
        amount: u128,
        side: Side,
        slippage_pct: Decimal,
    ) -> BoxFuture<'a, Result<RoutePayload, String>>;
}

/// Both families: turns a route into an unsigned transaction.
pub trait TxBuilder: Send + Sync {
    /// `gas_max_gwei`/`gas_multiplier_pct` are the caller's gas policy
    /// overrides (§6.4); a family with no EIP-1559-style fee market (e.g.
    /// the signature-hash family) ignores them.
    fn build_swap<'a>(
        &'a self,
        route: &'a RoutePayload,
        wallet: &'a str,
        nonce: Option<u64>,
        gas_max_gwei: Option<u64>,
        gas_multiplier_pct: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>>;
}

/// Both families: signs an unsigned transaction. Software signers return
/// almost immediately; hardware signers may suspend for tens of seconds and
/// fail with device-specific strings (§7).
pub trait Signer: Send + Sync {
    fn sign<'a>(&'a self, tx: &'a UnsignedTx, address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>>;

    /// Whether this signer is backed by a hardware device (drives the
    /// auto-approve policy of §4.4, step 4).
    fn is_hardware(&self) -> bool {
        false
    }
}

/// Both families: pre-submit simulation and raw submission.
pub trait Submitter: Send + Sync {
    fn simulate<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<(), String>>;
    fn submit<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<TxHandle, String>>;
}

/// Both families: polls a submitted transaction until it resolves.
pub trait Poller: Send + Sync {
    fn poll<'a>(&'a self, handle: &'a TxHandle) -> BoxFuture<'a, Result<PollOutcome, String>>;
}

/// The full capability set for one chain family, composed rather than
/// monolithic (Design Notes §9). `nonce_source`/`allowance_source` return
/// `None` for the signature-hash family (Solana has no account nonce and no
/// ERC-20-style allowance) and `Some(self)` for the account-nonce family;
/// the orchestrator gates steps 4 and part of step 6 of §4.4.1 on these.
pub trait ChainAdapter: BalanceSource + RouteBuilder + TxBuilder + Signer + Submitter + Poller {
    fn nonce_source(&self) -> Option<&dyn NonceSource> {
        None
    }

    fn allowance_source(&self) -> Option<&dyn AllowanceSource> {
        None
    }
}
