//! EVM RPC adapter: implements [`NonceSource`], [`BalanceSource`],
//! [`AllowanceSource`], [`Submitter`] and [`Poller`] over an `alloy`
//! provider, grounded in the teacher's `EvmSettlementProvider`/
//! `PendingNonceManager` pattern (`r402-evm/src/provider.rs`) but thinner:
//! nonce *caching* lives in `dexgate_core::nonce`, so this adapter only
//! forwards to the chain's own view of the pending nonce.

use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider};
use alloy_rpc_types_eth::{BlockId, BlockNumberOrTag, TransactionRequest};

use dexgate_core::family::{
    AllowanceSource, BalanceSource, BoxFuture, NonceSource, PollOutcome, Poller, SignedTx,
    Submitter, TxHandle, UnsignedTx,
};

use crate::erc20;

/// Wraps a type-erased `alloy` provider for one network.
pub struct EvmProvider {
    pub(crate) provider: DynProvider,
}

impl EvmProvider {
    #[must_use]
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    pub(crate) fn parse_address(address: &str) -> Result<Address, String> {
        address
            .parse()
            .map_err(|_| format!("invalid EVM address: {address}"))
    }
}

impl NonceSource for EvmProvider {
    fn get_pending_nonce<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<u64, String>> {
        Box::pin(async move {
            let addr = Self::parse_address(address)?;
            self.provider
                .get_transaction_count(addr)
                .block_id(BlockId::Number(BlockNumberOrTag::Pending))
                .await
                .map_err(|e| e.to_string())
        })
    }
}

impl BalanceSource for EvmProvider {
    fn balance<'a>(&'a self, owner: &'a str, token: &'a str) -> BoxFuture<'a, Result<u128, String>> {
        Box::pin(async move {
            let owner_addr = Self::parse_address(owner)?;

            if erc20::is_native(token) {
                let balance = self
                    .provider
                    .get_balance(owner_addr)
                    .await
                    .map_err(|e| e.to_string())?;
                return u256_to_u128(balance);
            }

            let token_addr = Self::parse_address(token)?;
            let calldata = erc20::encode_balance_of(owner_addr);
            let result = self
                .provider
                .call(TransactionRequest::default().to(token_addr).input(calldata.into()))
                .await
                .map_err(|e| e.to_string())?;
            u256_to_u128(erc20::decode_u256(&result)?)
        })
    }
}

impl AllowanceSource for EvmProvider {
    fn allowance<'a>(
        &'a self,
        owner: &'a str,
        token: &'a str,
        spender: &'a str,
    ) -> BoxFuture<'a, Result<u128, String>> {
        Box::pin(async move {
            let owner_addr = Self::parse_address(owner)?;
            let token_addr = Self::parse_address(token)?;
            let spender_addr = Self::parse_address(spender)?;

            let calldata = erc20::encode_allowance(owner_addr, spender_addr);
            let result = self
                .provider
                .call(TransactionRequest::default().to(token_addr).input(calldata.into()))
                .await
                .map_err(|e| e.to_string())?;
            u256_to_u128(erc20::decode_u256(&result)?)
        })
    }

    fn build_approve<'a>(
        &'a self,
        _owner: &'a str,
        token: &'a str,
        spender: &'a str,
        amount: u128,
        nonce: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
        Box::pin(async move {
            let token_addr = Self::parse_address(token)?;
            let spender_addr = Self::parse_address(spender)?;
            let calldata = erc20::encode_approve(spender_addr, amount);

            let mut tx = TransactionRequest::default().to(token_addr).input(calldata.into());
            if let Some(n) = nonce {
                tx = tx.nonce(n);
            }
            Ok(UnsignedTx(encode_request(&tx)))
        })
    }

    fn bridge_spender(&self) -> Option<&str> {
        Some(erc20::PERMIT2_ADDRESS)
    }
}

impl Submitter for EvmProvider {
    fn simulate<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.provider
                .call(decode_request(&tx.0)?)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
    }

    fn submit<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<TxHandle, String>> {
        Box::pin(async move {
            let raw = Bytes::copy_from_slice(&tx.0);
            let pending = self
                .provider
                .send_raw_transaction(&raw)
                .await
                .map_err(|e| e.to_string())?;
            Ok(TxHandle(format!("{:#x}", pending.tx_hash())))
        })
    }
}

impl Poller for EvmProvider {
    fn poll<'a>(
        &'a self,
        handle: &'a TxHandle,
    ) -> BoxFuture<'a, Result<PollOutcome, String>> {
        Box::pin(async move {
            let hash = handle
                .0
                .parse()
                .map_err(|_| format!("invalid tx hash: {}", handle.0))?;

            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status() {
                        Ok(PollOutcome::Confirmed {
                            fee: Some(
                                u128::from(receipt.gas_used)
                                    .saturating_mul(u128::from(receipt.effective_gas_price)),
                            ),
                            base_token_delta: 0,
                            quote_token_delta: 0,
                        })
                    } else {
                        Ok(PollOutcome::Failed {
                            reason: "transaction reverted on-chain".to_owned(),
                        })
                    }
                }
                Ok(None) => Ok(PollOutcome::Pending),
                Err(e) => Err(e.to_string()),
            }
        })
    }
}

pub(crate) fn u256_to_u128(value: U256) -> Result<u128, String> {
    u128::try_from(value).map_err(|_| "amount overflows u128".to_owned())
}

/// Encodes a `TransactionRequest` as opaque bytes for [`UnsignedTx`]. The
/// gas/route builder fills in the remaining fields before this is signed;
/// here we only need a stable round-trippable encoding.
fn encode_request(request: &TransactionRequest) -> Vec<u8> {
    serde_json::to_vec(request).unwrap_or_default()
}

fn decode_request(bytes: &[u8]) -> Result<TransactionRequest, String> {
    serde_json::from_slice(bytes).map_err(|e| e.to_string())
}
