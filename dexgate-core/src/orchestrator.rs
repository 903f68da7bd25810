//! Transaction Orchestrator (C4): the swap/approve state machine of
//! §4.4, shared by `execute-swap` (fresh quote) and `execute-quote`
//! (pre-cached quote from C3).

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::AutoApprovePolicy;
use crate::confirmation::{confirm, ConfirmationRequest};
use crate::coordination::CoordinationState;
use crate::error::GatewayError;
use crate::family::{AllowanceSource, ChainAdapter, RoutePayload, Side};
use crate::scope::WalletKey;
use crate::types::{OutcomeStatus, SwapRequest, TransactionOutcome};

/// Buffer multiplier applied to the required amount when auto-approving, to
/// reduce how often a future swap needs another approval (§4.4.2 step 1).
const APPROVE_BUFFER_MULTIPLIER: u128 = 10;
/// Timeout for awaiting an approval's own confirmation before proceeding to
/// the swap (§4.4.2 step 4).
const APPROVE_CONFIRMATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SLIPPAGE_PCT: &str = "0.5";

/// Runs `execute-swap`: validates, acquires the wallet lock, computes a
/// fresh route, then proceeds through the shared post-route pipeline.
pub async fn execute_swap(
    state: &CoordinationState,
    adapter: &dyn ChainAdapter,
    request: SwapRequest,
) -> Result<TransactionOutcome, GatewayError> {
    if request.amount == 0 {
        return Err(GatewayError::Validation(
            "amount must be greater than zero".to_owned(),
        ));
    }

    let key = WalletKey::new(request.network.clone(), request.wallet_address.clone());
    let _lock_guard = state.lock.acquire(&key).await;

    // Step 1: resolve pool address. No token-pair lookup collaborator is
    // wired into this crate (§1: pool resolution beyond the explicit case is
    // an external token-registry concern), so an omitted `poolAddress` is a
    // caller validation error, not a silent fallback into route computation.
    let pool = request
        .pool_address
        .clone()
        .ok_or_else(|| GatewayError::Validation("poolAddress is required".to_owned()))?;
    let slippage = request
        .slippage_pct
        .unwrap_or_else(|| DEFAULT_SLIPPAGE_PCT.parse().expect("valid default"));

    let route = adapter
        .compute_route(
            &pool,
            &request.base_token,
            &request.quote_token,
            request.amount,
            request.side,
            slippage,
        )
        .await
        .map_err(|e| state.error_patterns.classify(&e))?;

    run_post_route(
        state,
        adapter,
        &key,
        &request.wallet_address,
        route,
        None,
        request.gas_max_gwei,
        request.gas_multiplier_pct,
    )
    .await
}

/// Runs `execute-quote`: looks up a C3 entry by id (without consuming it —
/// Q1/Q3), then proceeds through the shared post-route pipeline.
pub async fn execute_quote(
    state: &CoordinationState,
    adapter: &dyn ChainAdapter,
    network: &str,
    wallet_address: &str,
    quote_id: Uuid,
) -> Result<TransactionOutcome, GatewayError> {
    let key = WalletKey::new(network, wallet_address);
    let _lock_guard = state.lock.acquire(&key).await;

    let cached = state
        .quote
        .get(quote_id)
        .ok_or_else(|| GatewayError::Validation("Quote not found or expired".to_owned()))?;

    run_post_route(
        state,
        adapter,
        &key,
        wallet_address,
        cached.route_payload,
        Some(quote_id),
        None,
        None,
    )
    .await
}

/// Steps 4-11 of §4.4.1, shared by both entry points. `quote_id` is `Some`
/// only for `execute-quote`, so step 11 knows whether a C3 entry needs
/// deleting on `CONFIRMED`.
async fn run_post_route(
    state: &CoordinationState,
    adapter: &dyn ChainAdapter,
    key: &WalletKey,
    wallet_address: &str,
    route: RoutePayload,
    quote_id: Option<Uuid>,
    gas_max_gwei: Option<u64>,
    gas_multiplier_pct: Option<u64>,
) -> Result<TransactionOutcome, GatewayError> {
    // §4.4.3: BUY/ExactOut swaps must clear `max_amount_in`, the
    // slippage-bounded worst case, not the point-estimate `amount_in` — the
    // allowance/balance checks below both use this as the "required" amount.
    let required = match route.side {
        Side::Buy => route.max_amount_in,
        Side::Sell => route.amount_in,
    };

    // Step 4: allowance check, account-nonce family only. For a two-hop
    // allowance design (owner→bridge-contract→router), probe both hops and
    // only approve whichever is short (§4.4.2 step 2).
    if let Some(allowance_source) = adapter.allowance_source() {
        let mut hops = Vec::new();
        if let Some(bridge) = allowance_source.bridge_spender() {
            hops.push(bridge.to_owned());
        }
        hops.push(route.pool_address.clone());

        let mut short_hops = Vec::new();
        for spender in &hops {
            let current = allowance_source
                .allowance(wallet_address, &route.token_in, spender)
                .await
                .map_err(|e| state.error_patterns.classify(&e))?;
            if current < required {
                short_hops.push(spender.clone());
            }
        }

        if !short_hops.is_empty() {
            if adapter.is_hardware() && state.auto_approve_policy == AutoApprovePolicy::Never {
                return Err(GatewayError::AllowanceRequired(format!(
                    "Allowance for {} to {} is insufficient; approve before retrying",
                    route.token_in,
                    short_hops.join(", ")
                )));
            }

            for spender in &short_hops {
                run_approve(
                    state,
                    adapter,
                    key,
                    wallet_address,
                    &route,
                    allowance_source,
                    spender,
                    required,
                )
                .await?;
            }
        }
    }

    // Step 5: balance check.
    let balance = adapter
        .balance(wallet_address, &route.token_in)
        .await
        .map_err(|e| state.error_patterns.classify(&e))?;
    if balance < required {
        return Err(GatewayError::InsufficientFunds(format!(
            "Balance of {} is insufficient for this swap",
            route.token_in
        )));
    }

    // Step 6: build, assigning a nonce for the account-nonce family and the
    // caller's gas policy (§6.4).
    let nonce_snapshot = match adapter.nonce_source() {
        Some(nonce_source) => Some(
            state
                .nonce
                .next_nonce(nonce_source, key, &state.tunables)
                .await
                .map_err(|e| state.error_patterns.classify(&e))?,
        ),
        None => None,
    };

    let unsigned = adapter
        .build_swap(&route, wallet_address, nonce_snapshot, gas_max_gwei, gas_multiplier_pct)
        .await
        .map_err(|e| state.error_patterns.classify(&e))?;

    // Step 7: sign.
    let signed = match adapter.sign(&unsigned, wallet_address).await {
        Ok(signed) => signed,
        Err(e) => {
            // Nothing was submitted; no commit/rollback ambiguity — the
            // nonce (if any) simply was never spent.
            if let Some(nonce) = nonce_snapshot {
                state.nonce.rollback(key, nonce);
            }
            return Err(state.error_patterns.classify(&e));
        }
    };

    // Step 8: pre-submit simulate.
    if let Err(e) = adapter.simulate(&signed).await {
        if let Some(nonce) = nonce_snapshot {
            state.nonce.rollback(key, nonce);
        }
        return Err(state.error_patterns.classify(&e));
    }

    // Step 9: submit.
    let handle = match adapter.submit(&signed).await {
        Ok(handle) => handle,
        Err(e) => {
            let classified = state.error_patterns.classify(&e);
            if matches!(classified, GatewayError::NonceStale(_)) {
                state.nonce.invalidate(key);
            } else if let Some(nonce) = nonce_snapshot {
                // Submission never reached the network (rollback, not commit).
                state.nonce.rollback(key, nonce);
            }
            return Err(classified);
        }
    };

    // Step 10: confirm.
    let confirmation_request = ConfirmationRequest {
        chain_handle: handle,
        token_in: route.token_in.clone(),
        token_out: route.token_out.clone(),
        amount_in: route.amount_in,
        amount_out: route.amount_out,
    };
    let outcome = confirm(adapter, &confirmation_request, &state.tunables).await;

    // Step 11: the lock releases on drop of `_lock_guard` in the caller's
    // scope; here we only handle the C3 side-effect (Q1: delete only on
    // CONFIRMED; Q3: PENDING/FAILED leave the entry for the client).
    if outcome.status == OutcomeStatus::Confirmed {
        if let Some(id) = quote_id {
            state.quote.delete(id);
        }
    }

    Ok(outcome)
}

/// Approve sub-state-machine (§4.4.2), run inside the already-held lock, once
/// per short hop found by the caller.
async fn run_approve(
    state: &CoordinationState,
    adapter: &dyn ChainAdapter,
    key: &WalletKey,
    wallet_address: &str,
    route: &RoutePayload,
    allowance_source: &dyn AllowanceSource,
    spender: &str,
    required: u128,
) -> Result<(), GatewayError> {
    let buffered = required.saturating_mul(APPROVE_BUFFER_MULTIPLIER).max(required);

    let nonce_source = adapter
        .nonce_source()
        .expect("allowance_source implies nonce_source for the account-nonce family");
    let nonce = state
        .nonce
        .next_nonce(nonce_source, key, &state.tunables)
        .await
        .map_err(|e| state.error_patterns.classify(&e))?;

    let approve_tx = allowance_source
        .build_approve(wallet_address, &route.token_in, spender, buffered, Some(nonce))
        .await
        .map_err(|e| state.error_patterns.classify(&e))?;

    let signed = match adapter.sign(&approve_tx, wallet_address).await {
        Ok(signed) => signed,
        Err(e) => {
            state.nonce.rollback(key, nonce);
            return Err(state.error_patterns.classify(&e));
        }
    };

    let handle = match adapter.submit(&signed).await {
        Ok(handle) => handle,
        Err(e) => {
            let classified = state.error_patterns.classify(&e);
            if matches!(classified, GatewayError::NonceStale(_)) {
                state.nonce.invalidate(key);
            } else {
                state.nonce.rollback(key, nonce);
            }
            return Err(classified);
        }
    };

    let confirmation_request = ConfirmationRequest {
        chain_handle: handle,
        token_in: route.token_in.clone(),
        token_out: route.token_in.clone(),
        amount_in: buffered,
        amount_out: 0,
    };

    let mut approve_tunables = state.tunables;
    approve_tunables.confirmation_timeout =
        std::time::Duration::from_secs(APPROVE_CONFIRMATION_TIMEOUT_SECS);

    let outcome = confirm(adapter, &confirmation_request, &approve_tunables).await;
    match outcome.status {
        OutcomeStatus::Confirmed => Ok(()),
        OutcomeStatus::Pending => Err(GatewayError::Internal(
            "approval confirmation timed out".to_owned(),
        )),
        OutcomeStatus::Failed => Err(GatewayError::Internal(
            "approval transaction failed on-chain".to_owned(),
        )),
    }
}

#[allow(dead_code)]
fn default_slippage() -> Decimal {
    DEFAULT_SLIPPAGE_PCT.parse().expect("valid default")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{
        BalanceSource, BoxFuture, NonceSource, PollOutcome, Poller, RouteBuilder, Signer, SignedTx,
        Submitter, TxBuilder, TxHandle, UnsignedTx,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FaultStage {
        None,
        Balance,
        Build,
        Sign,
        Simulate,
        Submit,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PollMode {
        ConfirmAfter(u32),
        Pending,
    }

    /// A scriptable `ChainAdapter` double covering every capability the
    /// orchestrator drives, in the style of `ScriptedPoller`/`FixedPending`
    /// elsewhere in this crate but wide enough to exercise the full
    /// swap/approve pipeline.
    struct TestAdapter {
        balance: u128,
        router_allowance: Mutex<u128>,
        bridge_allowance: Mutex<u128>,
        bridge_spender: Option<String>,
        pending_nonce: u64,
        fault: FaultStage,
        hardware: bool,
        poll_mode: PollMode,
        poll_calls: AtomicU32,
        submitted_nonces: Mutex<Vec<u64>>,
        account_nonce_family: bool,
    }

    impl TestAdapter {
        fn account_nonce_family(balance: u128, allowance: u128) -> Self {
            Self {
                balance,
                router_allowance: Mutex::new(allowance),
                bridge_allowance: Mutex::new(allowance),
                bridge_spender: None,
                pending_nonce: 0,
                fault: FaultStage::None,
                hardware: false,
                poll_mode: PollMode::ConfirmAfter(1),
                poll_calls: AtomicU32::new(0),
                submitted_nonces: Mutex::new(Vec::new()),
                account_nonce_family: true,
            }
        }

        fn with_bridge(mut self, spender: &str, bridge_allowance: u128) -> Self {
            self.bridge_spender = Some(spender.to_owned());
            self.bridge_allowance = Mutex::new(bridge_allowance);
            self
        }

        fn with_fault(mut self, fault: FaultStage) -> Self {
            self.fault = fault;
            self
        }

        fn with_poll_mode(mut self, mode: PollMode) -> Self {
            self.poll_mode = mode;
            self
        }

        fn submitted_nonces(&self) -> Vec<u64> {
            self.submitted_nonces.lock().unwrap().clone()
        }
    }

    impl BalanceSource for TestAdapter {
        fn balance<'a>(&'a self, _owner: &'a str, _token: &'a str) -> BoxFuture<'a, Result<u128, String>> {
            let fault = self.fault == FaultStage::Balance;
            let balance = self.balance;
            Box::pin(async move {
                if fault {
                    return Err("simulated balance RPC failure".to_owned());
                }
                Ok(balance)
            })
        }
    }

    impl RouteBuilder for TestAdapter {
        fn compute_route<'a>(
            &'a self,
            pool: &'a str,
            token_in: &'a str,
            token_out: &'a str,
            amount: u128,
            side: Side,
            _slippage_pct: Decimal,
        ) -> BoxFuture<'a, Result<RoutePayload, String>> {
            Box::pin(async move {
                Ok(RoutePayload {
                    pool_address: pool.to_owned(),
                    token_in: token_in.to_owned(),
                    token_out: token_out.to_owned(),
                    amount_in: amount,
                    amount_out: amount,
                    min_amount_out: amount,
                    max_amount_in: amount,
                    price: Decimal::ONE,
                    price_impact_pct: None,
                    side,
                })
            })
        }
    }

    impl TxBuilder for TestAdapter {
        fn build_swap<'a>(
            &'a self,
            _route: &'a RoutePayload,
            _wallet: &'a str,
            nonce: Option<u64>,
            _gas_max_gwei: Option<u64>,
            _gas_multiplier_pct: Option<u64>,
        ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
            let fault = self.fault == FaultStage::Build;
            Box::pin(async move {
                if fault {
                    return Err("simulated build failure".to_owned());
                }
                if let Some(n) = nonce {
                    self.submitted_nonces.lock().unwrap().push(n);
                }
                Ok(UnsignedTx(vec![]))
            })
        }
    }

    impl Signer for TestAdapter {
        fn sign<'a>(&'a self, tx: &'a UnsignedTx, _address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>> {
            let fault = self.fault == FaultStage::Sign;
            Box::pin(async move {
                if fault {
                    return Err("simulated signer rejection".to_owned());
                }
                Ok(SignedTx(tx.0.clone()))
            })
        }

        fn is_hardware(&self) -> bool {
            self.hardware
        }
    }

    impl Submitter for TestAdapter {
        fn simulate<'a>(&'a self, _tx: &'a SignedTx) -> BoxFuture<'a, Result<(), String>> {
            let fault = self.fault == FaultStage::Simulate;
            Box::pin(async move {
                if fault {
                    return Err("simulated simulate failure".to_owned());
                }
                Ok(())
            })
        }

        fn submit<'a>(&'a self, _tx: &'a SignedTx) -> BoxFuture<'a, Result<TxHandle, String>> {
            let fault = self.fault == FaultStage::Submit;
            Box::pin(async move {
                if fault {
                    return Err("simulated submit failure".to_owned());
                }
                Ok(TxHandle("0xhash".to_owned()))
            })
        }
    }

    impl Poller for TestAdapter {
        fn poll<'a>(&'a self, _handle: &'a TxHandle) -> BoxFuture<'a, Result<PollOutcome, String>> {
            match self.poll_mode {
                PollMode::Pending => Box::pin(async move { Ok(PollOutcome::Pending) }),
                PollMode::ConfirmAfter(threshold) => {
                    let call = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Box::pin(async move {
                        if call >= threshold {
                            Ok(PollOutcome::Confirmed {
                                fee: Some(10),
                                base_token_delta: 0,
                                quote_token_delta: 0,
                            })
                        } else {
                            Ok(PollOutcome::Pending)
                        }
                    })
                }
            }
        }
    }

    impl NonceSource for TestAdapter {
        fn get_pending_nonce<'a>(&'a self, _address: &'a str) -> BoxFuture<'a, Result<u64, String>> {
            let value = self.pending_nonce;
            Box::pin(async move { Ok(value) })
        }
    }

    impl AllowanceSource for TestAdapter {
        fn allowance<'a>(
            &'a self,
            _owner: &'a str,
            _token: &'a str,
            spender: &'a str,
        ) -> BoxFuture<'a, Result<u128, String>> {
            let is_bridge = self.bridge_spender.as_deref() == Some(spender);
            let value = if is_bridge {
                *self.bridge_allowance.lock().unwrap()
            } else {
                *self.router_allowance.lock().unwrap()
            };
            Box::pin(async move { Ok(value) })
        }

        fn build_approve<'a>(
            &'a self,
            _owner: &'a str,
            _token: &'a str,
            spender: &'a str,
            amount: u128,
            nonce: Option<u64>,
        ) -> BoxFuture<'a, Result<UnsignedTx, String>> {
            let is_bridge = self.bridge_spender.as_deref() == Some(spender);
            Box::pin(async move {
                if let Some(n) = nonce {
                    self.submitted_nonces.lock().unwrap().push(n);
                }
                if is_bridge {
                    *self.bridge_allowance.lock().unwrap() = amount;
                } else {
                    *self.router_allowance.lock().unwrap() = amount;
                }
                Ok(UnsignedTx(vec![]))
            })
        }

        fn bridge_spender(&self) -> Option<&str> {
            self.bridge_spender.as_deref()
        }
    }

    impl ChainAdapter for TestAdapter {
        fn nonce_source(&self) -> Option<&dyn NonceSource> {
            self.account_nonce_family.then_some(self)
        }

        fn allowance_source(&self) -> Option<&dyn AllowanceSource> {
            self.account_nonce_family.then_some(self)
        }
    }

    fn route(side: Side, amount_in: u128, max_amount_in: u128) -> RoutePayload {
        RoutePayload {
            pool_address: "0xpool".to_owned(),
            token_in: "USDC".to_owned(),
            token_out: "WETH".to_owned(),
            amount_in,
            amount_out: amount_in,
            min_amount_out: amount_in,
            max_amount_in,
            price: Decimal::ONE,
            price_impact_pct: None,
            side,
        }
    }

    fn swap_request() -> SwapRequest {
        SwapRequest {
            network: "evm".to_owned(),
            wallet_address: "0xabc".to_owned(),
            base_token: "USDC".to_owned(),
            quote_token: "WETH".to_owned(),
            amount: 100,
            side: Side::Sell,
            pool_address: Some("0xpool".to_owned()),
            slippage_pct: None,
            use_native_balance: false,
            gas_max_gwei: None,
            gas_multiplier_pct: None,
        }
    }

    #[tokio::test]
    async fn missing_pool_address_is_validation_error() {
        let state = CoordinationState::new();
        let adapter = TestAdapter::account_nonce_family(1_000, 1_000);
        let mut request = swap_request();
        request.pool_address = None;

        let err = execute_swap(&state, &adapter, request).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn buy_side_allowance_check_uses_max_amount_in() {
        // Allowance covers `amount_in` (100) but not `max_amount_in` (150);
        // if the check used `amount_in` this would wrongly skip approval.
        let state = CoordinationState::new();
        let adapter = TestAdapter::account_nonce_family(1_000, 120);
        let key = WalletKey::new("evm", "0xabc");

        let outcome = run_post_route(
            &state,
            &adapter,
            &key,
            "0xabc",
            route(Side::Buy, 100, 150),
            None,
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Confirmed);
        assert_eq!(adapter.submitted_nonces().len(), 2, "approve then swap");
    }

    #[tokio::test]
    async fn buy_side_balance_check_uses_max_amount_in() {
        // Balance covers `amount_in` (100) but not `max_amount_in` (150).
        let state = CoordinationState::new();
        let adapter = TestAdapter::account_nonce_family(120, 1_000);
        let key = WalletKey::new("evm", "0xabc");

        let err = run_post_route(
            &state,
            &adapter,
            &key,
            "0xabc",
            route(Side::Buy, 100, 150),
            None,
            None,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GatewayError::InsufficientFunds(_)));
    }

    #[tokio::test]
    async fn two_hop_allowance_only_approves_the_short_hop() {
        let state = CoordinationState::new();
        let adapter =
            TestAdapter::account_nonce_family(1_000, 1_000).with_bridge("0xpermit2", 0);
        let key = WalletKey::new("evm", "0xabc");

        run_post_route(
            &state,
            &adapter,
            &key,
            "0xabc",
            route(Side::Sell, 100, 100),
            None,
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(*adapter.bridge_allowance.lock().unwrap(), 1_000);
        assert_eq!(*adapter.router_allowance.lock().unwrap(), 1_000);
        assert_eq!(adapter.submitted_nonces().len(), 2, "bridge approve then swap");
    }

    #[tokio::test]
    async fn two_hop_allowance_approves_both_hops_when_both_short() {
        let state = CoordinationState::new();
        let adapter = TestAdapter::account_nonce_family(1_000, 0).with_bridge("0xpermit2", 0);
        let key = WalletKey::new("evm", "0xabc");

        run_post_route(
            &state,
            &adapter,
            &key,
            "0xabc",
            route(Side::Sell, 100, 100),
            None,
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(*adapter.bridge_allowance.lock().unwrap(), 1_000);
        assert_eq!(*adapter.router_allowance.lock().unwrap(), 1_000);
        assert_eq!(
            adapter.submitted_nonces().len(),
            3,
            "bridge approve, router approve, then swap"
        );
    }

    #[tokio::test]
    async fn approve_then_swap_uses_consecutive_nonces() {
        let state = CoordinationState::new();
        let adapter = TestAdapter::account_nonce_family(1_000, 0);
        let key = WalletKey::new("evm", "0xabc");

        run_post_route(
            &state,
            &adapter,
            &key,
            "0xabc",
            route(Side::Sell, 100, 100),
            None,
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(adapter.submitted_nonces(), vec![0, 1]);
    }

    #[tokio::test]
    async fn quote_deleted_only_on_confirmed() {
        let state = CoordinationState::new();
        let adapter = TestAdapter::account_nonce_family(1_000, 1_000);
        let quote_id = state.quote.put(
            route(Side::Sell, 100, 100),
            serde_json::Value::Null,
            Duration::from_secs(30),
        );

        let outcome = execute_quote(&state, &adapter, "evm", "0xabc", quote_id)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Confirmed);
        assert!(state.quote.get(quote_id).is_none());
    }

    #[tokio::test]
    async fn quote_retained_while_confirmation_is_pending() {
        let mut state = CoordinationState::new();
        state.tunables.confirmation_timeout = Duration::from_millis(20);
        state.tunables.polling_interval = Duration::from_millis(5);

        let adapter =
            TestAdapter::account_nonce_family(1_000, 1_000).with_poll_mode(PollMode::Pending);
        let quote_id = state.quote.put(
            route(Side::Sell, 100, 100),
            serde_json::Value::Null,
            Duration::from_secs(30),
        );

        let outcome = execute_quote(&state, &adapter, "evm", "0xabc", quote_id)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Pending);
        assert!(state.quote.get(quote_id).is_some());
    }

    #[tokio::test]
    async fn lock_released_on_fault_at_any_stage() {
        for fault in [
            FaultStage::Balance,
            FaultStage::Build,
            FaultStage::Sign,
            FaultStage::Simulate,
            FaultStage::Submit,
        ] {
            let state = CoordinationState::new();
            let adapter = TestAdapter::account_nonce_family(1_000, 1_000).with_fault(fault);
            let request = swap_request();
            let key = WalletKey::new(request.network.clone(), request.wallet_address.clone());

            let result = execute_swap(&state, &adapter, request).await;
            assert!(result.is_err(), "{fault:?} should fail the swap");

            let reacquired =
                tokio::time::timeout(Duration::from_millis(200), state.lock.acquire(&key)).await;
            assert!(reacquired.is_ok(), "lock not released after fault at {fault:?}");
        }
    }
}
