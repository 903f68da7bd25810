//! Signature-hash chain family adapter (Solana/SVM).
//!
//! [`SvmAdapter`] composes an RPC-backed [`SvmProvider`] with a
//! [`KeypairSigner`] into the [`ChainAdapter`] object the orchestrator
//! drives. Unlike `dexgate-evm::EvmAdapter`, this adapter leaves
//! `nonce_source`/`allowance_source` at their trait defaults (`None`):
//! Solana has no account nonce and no ERC-20-style allowance.

pub mod provider;
pub mod registry;
pub mod route;
pub mod signer;
pub mod token;

use dexgate_core::family::{
    BalanceSource, BoxFuture, ChainAdapter, PollOutcome, Poller, RouteBuilder, RoutePayload, Side,
    Signer as SignerTrait, SignedTx, Submitter, TxBuilder, TxHandle, UnsignedTx,
};
use rust_decimal::Decimal;

pub use provider::SvmProvider;
pub use signer::KeypairSigner;

pub struct SvmAdapter {
    pub provider: SvmProvider,
    pub signer: KeypairSigner,
}

impl SvmAdapter {
    #[must_use]
    pub fn new(provider: SvmProvider, signer: KeypairSigner) -> Self {
        Self { provider, signer }
    }
}

impl BalanceSource for SvmAdapter {
    fn balance<'a>(&'a self, owner: &'a str, token: &'a str) -> BoxFuture<'a, Result<u128, String>> {
        self.provider.balance(owner, token)
    }
}

impl RouteBuilder for SvmAdapter {
    fn compute_route<'a>(
        &'a self,
        pool: &'a str,
        token_in: &'a str,
        token_out: &'a str,
        amount: u128,
        side: Side,
        slippage_pct: Decimal,
    ) -> BoxFuture<'a, Result<RoutePayload, String>> {
        self.provider
            .compute_route(pool, token_in, token_out, amount, side, slippage_pct)
    }
}

impl TxBuilder for SvmAdapter {
    fn build_swap<'a>(
        &'a self,
        route: &'a RoutePayload,
        wallet: &'a str,
        nonce: Option<u64>,
        gas_max_gwei: Option<u64>,
        gas_multiplier_pct: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
        self.provider
            .build_swap(route, wallet, nonce, gas_max_gwei, gas_multiplier_pct)
    }
}

impl SignerTrait for SvmAdapter {
    fn sign<'a>(&'a self, tx: &'a UnsignedTx, address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>> {
        self.signer.sign(tx, address)
    }

    fn is_hardware(&self) -> bool {
        self.signer.is_hardware()
    }
}

impl Submitter for SvmAdapter {
    fn simulate<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<(), String>> {
        self.provider.simulate(tx)
    }

    fn submit<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<TxHandle, String>> {
        self.provider.submit(tx)
    }
}

impl Poller for SvmAdapter {
    fn poll<'a>(&'a self, handle: &'a TxHandle) -> BoxFuture<'a, Result<PollOutcome, String>> {
        self.provider.poll(handle)
    }
}

impl ChainAdapter for SvmAdapter {}
