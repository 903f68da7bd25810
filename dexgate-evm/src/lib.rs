//! Account-nonce chain family adapter (EIP-155 / EVM).
//!
//! [`EvmAdapter`] composes an RPC-backed [`EvmProvider`] with a pluggable
//! [`Signer`] (software or hardware) into the single [`ChainAdapter`] object
//! the orchestrator drives.

pub mod erc20;
pub mod gas;
pub mod provider;
pub mod route;
pub mod signer;

use dexgate_core::family::{
    AllowanceSource, BalanceSource, BoxFuture, ChainAdapter, NonceSource, PollOutcome, Poller,
    RouteBuilder, RoutePayload, Side, Signer as SignerTrait, SignedTx, Submitter, TxBuilder,
    TxHandle, UnsignedTx,
};
use rust_decimal::Decimal;

pub use provider::EvmProvider;

/// The full account-nonce family adapter: an RPC provider plus a signer.
pub struct EvmAdapter {
    pub provider: EvmProvider,
    pub signer: Box<dyn SignerTrait>,
}

impl EvmAdapter {
    #[must_use]
    pub fn new(provider: EvmProvider, signer: Box<dyn SignerTrait>) -> Self {
        Self { provider, signer }
    }
}

impl NonceSource for EvmAdapter {
    fn get_pending_nonce<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<u64, String>> {
        self.provider.get_pending_nonce(address)
    }
}

impl AllowanceSource for EvmAdapter {
    fn allowance<'a>(
        &'a self,
        owner: &'a str,
        token: &'a str,
        spender: &'a str,
    ) -> BoxFuture<'a, Result<u128, String>> {
        self.provider.allowance(owner, token, spender)
    }

    fn build_approve<'a>(
        &'a self,
        owner: &'a str,
        token: &'a str,
        spender: &'a str,
        amount: u128,
        nonce: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
        self.provider.build_approve(owner, token, spender, amount, nonce)
    }

    fn bridge_spender(&self) -> Option<&str> {
        self.provider.bridge_spender()
    }
}

impl BalanceSource for EvmAdapter {
    fn balance<'a>(&'a self, owner: &'a str, token: &'a str) -> BoxFuture<'a, Result<u128, String>> {
        self.provider.balance(owner, token)
    }
}

impl RouteBuilder for EvmAdapter {
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

impl TxBuilder for EvmAdapter {
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

impl SignerTrait for EvmAdapter {
    fn sign<'a>(&'a self, tx: &'a UnsignedTx, address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>> {
        self.signer.sign(tx, address)
    }

    fn is_hardware(&self) -> bool {
        self.signer.is_hardware()
    }
}

impl Submitter for EvmAdapter {
    fn simulate<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<(), String>> {
        self.provider.simulate(tx)
    }

    fn submit<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<TxHandle, String>> {
        self.provider.submit(tx)
    }
}

impl Poller for EvmAdapter {
    fn poll<'a>(&'a self, handle: &'a TxHandle) -> BoxFuture<'a, Result<PollOutcome, String>> {
        self.provider.poll(handle)
    }
}

impl ChainAdapter for EvmAdapter {
    fn nonce_source(&self) -> Option<&dyn NonceSource> {
        Some(self)
    }

    fn allowance_source(&self) -> Option<&dyn AllowanceSource> {
        Some(self)
    }
}
