//! Gas policy (§6.4): inputs are `{gasMax?, gasMultiplierPct?}` applied on
//! top of the chain's base fee estimate; omission or zero means "auto".

/// Compute-unit-equivalent budget for a universal-router-style submission
/// on the account-nonce family, per §6.4's literal value.
pub const UNIVERSAL_ROUTER_GAS_LIMIT: u64 = 500_000;

/// Caller-supplied gas policy for one transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasPolicy {
    /// Hard ceiling on gas price in gwei. `None`/`Some(0)` means "auto".
    pub gas_max_gwei: Option<u64>,
    /// Percentage multiplier applied to the base fee estimate, e.g. `120`
    /// for +20%. `None`/`Some(0)` means "auto" (multiplier of 100).
    pub gas_multiplier_pct: Option<u64>,
}

/// A resolved EIP-1559 fee pair, in wei.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl GasPolicy {
    /// Applies this policy on top of the chain's base fee + priority fee
    /// estimate (both in wei), clamping to `gas_max_gwei` if set.
    #[must_use]
    pub fn resolve(&self, base_fee_wei: u128, priority_fee_wei: u128) -> ResolvedFees {
        let multiplier = self.gas_multiplier_pct.filter(|&p| p != 0).unwrap_or(100);
        let scaled_base = base_fee_wei.saturating_mul(u128::from(multiplier)) / 100;
        let mut max_fee = scaled_base.saturating_add(priority_fee_wei);

        if let Some(ceiling_gwei) = self.gas_max_gwei.filter(|&g| g != 0) {
            let ceiling_wei = u128::from(ceiling_gwei).saturating_mul(1_000_000_000);
            max_fee = max_fee.min(ceiling_wei);
        }

        ResolvedFees {
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: priority_fee_wei.min(max_fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_policy_passes_through_base_estimate() {
        let policy = GasPolicy::default();
        let fees = policy.resolve(10_000_000_000, 1_000_000_000);
        assert_eq!(fees.max_fee_per_gas, 11_000_000_000);
    }

    #[test]
    fn multiplier_scales_base_fee() {
        let policy = GasPolicy {
            gas_max_gwei: None,
            gas_multiplier_pct: Some(150),
        };
        let fees = policy.resolve(10_000_000_000, 0);
        assert_eq!(fees.max_fee_per_gas, 15_000_000_000);
    }

    #[test]
    fn gas_max_clamps_the_result() {
        let policy = GasPolicy {
            gas_max_gwei: Some(5),
            gas_multiplier_pct: None,
        };
        let fees = policy.resolve(10_000_000_000, 1_000_000_000);
        assert_eq!(fees.max_fee_per_gas, 5_000_000_000);
    }
}
