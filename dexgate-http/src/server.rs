//! Axum router for the gateway (§6.1, §6.2), wiring [`CoordinationState`]
//! and a per-network [`ChainAdapter`] registry to HTTP handlers, following
//! the teacher's thin-handler / router-builder-function pattern
//! (`r402-facilitator/src/handlers.rs`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use dexgate_core::coordination::CoordinationState;
use dexgate_core::family::{ChainAdapter, Side};
use dexgate_core::scope::WalletKey;
use dexgate_core::types::{OutcomeStatus, SwapRequest, TransactionOutcome};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::types::{
    ExecuteQuoteRequest, ExecuteSwapRequest, LockStatusEntry, NonceAcquireRequest,
    NonceAcquireResponse, NonceInvalidateRequest, NonceInvalidateResponse, NonceReleaseRequest,
    NonceReleaseResponse, NonceStatusResponse, SwapExecuteData, SwapExecuteResponse, WireSide,
};

/// A named chain family adapter, registered once per configured network.
pub type NetworkRegistry = HashMap<String, Arc<dyn ChainAdapter>>;

/// Shared application state for every handler.
pub struct AppState {
    pub coordination: CoordinationState,
    pub networks: NetworkRegistry,
}

impl AppState {
    fn adapter(&self, network: &str) -> Result<&Arc<dyn ChainAdapter>, ApiError> {
        self.networks.get(network).ok_or_else(|| {
            ApiError(dexgate_core::error::GatewayError::Validation(format!(
                "unknown network: {network}"
            )))
        })
    }
}

/// Builds the full router. `family` is the path segment the teacher's
/// `<family>` placeholder resolves to (`evm`, `svm`, ...).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chains/{family}/nonce/acquire", post(nonce_acquire))
        .route("/chains/{family}/nonce/release", post(nonce_release))
        .route("/chains/{family}/nonce/invalidate", post(nonce_invalidate))
        .route("/chains/{family}/nonce/status", get(nonce_status))
        .route(
            "/connectors/{dex}/{pool_kind}/quote-swap",
            get(quote_swap_unsupported),
        )
        .route("/connectors/{dex}/{pool_kind}/execute-swap", post(execute_swap))
        .route("/connectors/{router}/execute-quote", post(execute_quote))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn instant_to_epoch_ms(deadline: Instant) -> i64 {
    let now_instant = Instant::now();
    let now_wall = SystemTime::now();
    let wall_deadline = if deadline >= now_instant {
        now_wall + (deadline - now_instant)
    } else {
        now_wall - (now_instant - deadline)
    };
    wall_deadline
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

async fn nonce_acquire(
    State(state): State<Arc<AppState>>,
    Path(_family): Path<String>,
    Json(body): Json<NonceAcquireRequest>,
) -> Result<Json<NonceAcquireResponse>, ApiError> {
    let adapter = state.adapter(&body.network)?.clone();
    let key = WalletKey::new(body.network, body.wallet_address);
    let nonce_source = adapter
        .nonce_source()
        .ok_or_else(|| ApiError(dexgate_core::error::GatewayError::Validation(
            "this network's chain family has no nonce coordinator".to_owned(),
        )))?;

    let result = state
        .coordination
        .acquire(nonce_source, key, body.ttl_ms)
        .await
        .map_err(|e| ApiError(state.coordination.error_patterns.classify(&e)))?;

    Ok(Json(NonceAcquireResponse {
        lock_id: result.lock_id,
        nonce: result.nonce,
        expires_at: instant_to_epoch_ms(result.expires_at),
    }))
}

async fn nonce_release(
    State(state): State<Arc<AppState>>,
    Path(_family): Path<String>,
    Json(body): Json<NonceReleaseRequest>,
) -> Json<NonceReleaseResponse> {
    let result = state
        .coordination
        .release(body.lock_id, body.transaction_sent);
    Json(NonceReleaseResponse {
        success: result.success,
        message: result.message,
    })
}

async fn nonce_invalidate(
    State(state): State<Arc<AppState>>,
    Path(_family): Path<String>,
    Json(body): Json<NonceInvalidateRequest>,
) -> Json<NonceInvalidateResponse> {
    let key = WalletKey::new(body.network, body.wallet_address);
    state.coordination.invalidate(&key);
    Json(NonceInvalidateResponse { success: true })
}

async fn nonce_status(
    State(state): State<Arc<AppState>>,
    Path(_family): Path<String>,
) -> Json<NonceStatusResponse> {
    let locks: Vec<LockStatusEntry> = state
        .coordination
        .status()
        .into_iter()
        .map(|lease| LockStatusEntry {
            lock_id: lease.lock_id,
            address: lease.address,
            scope: Some(lease.scope),
            nonce: lease.nonce,
            expires_at: instant_to_epoch_ms(lease.expires_at),
            is_expired: lease.is_expired,
        })
        .collect();

    Json(NonceStatusResponse {
        active_locks: locks.len(),
        locks,
    })
}

async fn quote_swap_unsupported() -> ApiError {
    ApiError(dexgate_core::error::GatewayError::NotFound(
        "quote-swap requires a connector-specific route builder; wire one up in dexgate-server"
            .to_owned(),
    ))
}

async fn execute_swap(
    State(state): State<Arc<AppState>>,
    Path((_dex, _pool_kind)): Path<(String, String)>,
    Json(body): Json<ExecuteSwapRequest>,
) -> Result<Json<SwapExecuteResponse>, ApiError> {
    let adapter = state.adapter(&body.network)?.clone();

    let request = SwapRequest {
        network: body.network,
        wallet_address: body.wallet_address,
        base_token: body.base_token,
        quote_token: body.quote_token,
        amount: body.amount,
        side: match body.side {
            WireSide::Buy => Side::Buy,
            WireSide::Sell => Side::Sell,
        },
        pool_address: body.pool_address,
        slippage_pct: body.slippage_pct,
        use_native_balance: body.use_native_balance,
        gas_max_gwei: body.gas_max_gwei,
        gas_multiplier_pct: body.gas_multiplier_pct,
    };

    let outcome = dexgate_core::orchestrator::execute_swap(&state.coordination, adapter.as_ref(), request)
        .await?;

    Ok(Json(outcome_to_response(outcome)))
}

async fn execute_quote(
    State(state): State<Arc<AppState>>,
    Path(_router): Path<String>,
    Json(body): Json<ExecuteQuoteRequest>,
) -> Result<Json<SwapExecuteResponse>, ApiError> {
    let adapter = state.adapter(&body.network)?.clone();

    let outcome = dexgate_core::orchestrator::execute_quote(
        &state.coordination,
        adapter.as_ref(),
        &body.network,
        &body.wallet_address,
        body.quote_id,
    )
    .await?;

    Ok(Json(outcome_to_response(outcome)))
}

fn outcome_to_response(outcome: TransactionOutcome) -> SwapExecuteResponse {
    let status = match outcome.status {
        OutcomeStatus::Failed => -1,
        OutcomeStatus::Pending => 0,
        OutcomeStatus::Confirmed => 1,
    };

    SwapExecuteResponse {
        signature: outcome.chain_handle,
        status,
        data: Some(SwapExecuteData {
            token_in: outcome.token_in,
            token_out: outcome.token_out,
            amount_in: outcome.amount_in,
            amount_out: outcome.amount_out,
            fee: outcome.fee,
            base_token_balance_change: outcome.base_token_balance_change,
            quote_token_balance_change: outcome.quote_token_balance_change,
        }),
    }
}
