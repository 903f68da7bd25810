//! AMM/CLMM route construction for the signature-hash family (§4.4.3,
//! §4.8). Pool family is detected from the pool account's owning program
//! id; dispatch is internal to `compute_route`/`build_swap`.

use std::str::FromStr;

use rust_decimal::Decimal;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_message::{v0, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_transaction::versioned::VersionedTransaction;

use dexgate_core::family::{BoxFuture, RouteBuilder, RoutePayload, Side, TxBuilder, UnsignedTx};

use crate::provider::SvmProvider;

/// Compute-unit budgets per pool family on this family's universal swap
/// path (§6.4's literal values).
const AMM_COMPUTE_UNITS: u32 = 300_000;
const CLMM_COMPUTE_UNITS: u32 = 600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolFamily {
    Amm,
    Clmm,
}

impl SvmProvider {
    async fn detect_pool_family(&self, pool: &Pubkey) -> Result<PoolFamily, String> {
        let account = self
            .client()
            .get_account(pool)
            .await
            .map_err(|e| e.to_string())?;

        // Concrete AMM/CLMM program ids are a connector/token-registry
        // concern (§1); here we key on whichever program id the pool
        // account's owner already resolves to in the connector's registry,
        // falling back to AMM when the owner is unrecognized.
        Ok(if crate::registry::is_clmm_program(&account.owner) {
            PoolFamily::Clmm
        } else {
            PoolFamily::Amm
        })
    }

    fn compute_units_for(family: PoolFamily) -> u32 {
        match family {
            PoolFamily::Amm => AMM_COMPUTE_UNITS,
            PoolFamily::Clmm => CLMM_COMPUTE_UNITS,
        }
    }
}

impl RouteBuilder for SvmProvider {
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
            let pool_key = Pubkey::from_str(pool).map_err(|_| format!("invalid pool address: {pool}"))?;
            self.detect_pool_family(&pool_key).await?;

            // Quoting math is identical in shape to the EVM adapter's
            // placeholder: a real connector quotes via the pool's on-chain
            // curve state, which is an external collaborator concern here.
            let (amount_in, amount_out) = match side {
                Side::Sell => (amount, amount),
                Side::Buy => (amount, amount),
            };

            let slippage_bps = (slippage_pct * Decimal::from(100))
                .to_string()
                .parse::<u128>()
                .unwrap_or(50);
            let min_amount_out = amount_out.saturating_sub(amount_out.saturating_mul(slippage_bps) / 10_000);
            let max_amount_in = amount_in.saturating_add(amount_in.saturating_mul(slippage_bps) / 10_000);

            Ok(RoutePayload {
                pool_address: pool.to_owned(),
                token_in: token_in.to_owned(),
                token_out: token_out.to_owned(),
                amount_in,
                amount_out,
                min_amount_out,
                max_amount_in,
                price: Decimal::ONE,
                price_impact_pct: None,
                side,
            })
        })
    }
}

impl TxBuilder for SvmProvider {
    fn build_swap<'a>(
        &'a self,
        route: &'a RoutePayload,
        wallet: &'a str,
        _nonce: Option<u64>,
        _gas_max_gwei: Option<u64>,
        _gas_multiplier_pct: Option<u64>,
    ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
        // No EIP-1559-style fee market on Solana; priority fees are a
        // compute-budget instruction concern, not part of this spec's gas
        // policy (§6.4 names `gasMax`/`gasMultiplierPct` as account-nonce
        // family inputs).
        Box::pin(async move {
            let pool_key =
                Pubkey::from_str(&route.pool_address).map_err(|_| "invalid pool address".to_owned())?;
            let payer =
                Pubkey::from_str(wallet).map_err(|_| format!("invalid Solana address: {wallet}"))?;
            let family = self.detect_pool_family(&pool_key).await?;

            let compute_budget_ix =
                ComputeBudgetInstruction::set_compute_unit_limit(Self::compute_units_for(family));

            // The swap instruction's accounts/data are connector/pool-ABI
            // specific (§6.3 DEX Route Builder); `route` already carries
            // the slippage-adjusted raw amounts the connector needs.
            let swap_ix = crate::registry::build_swap_instruction(route, &payer)?;

            let blockhash = self
                .client()
                .get_latest_blockhash()
                .await
                .map_err(|e| e.to_string())?;

            let message = v0::Message::try_compile(&payer, &[compute_budget_ix, swap_ix], &[], blockhash)
                .map_err(|e| e.to_string())?;

            let versioned = VersionedTransaction {
                signatures: vec![],
                message: VersionedMessage::V0(message),
            };

            let bytes = bincode::serialize(&versioned).map_err(|e| e.to_string())?;
            Ok(UnsignedTx(bytes))
        })
    }
}
