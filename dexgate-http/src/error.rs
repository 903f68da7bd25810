//! Maps [`GatewayError`] onto HTTP status codes and a sanitized JSON body
//! (§7), following the teacher's `FacilitatorError::into_response` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dexgate_core::error::GatewayError;
use serde::Serialize;

/// Wraps a [`GatewayError`] so it can be returned directly from an Axum
/// handler. `dexgate-core` stays free of any `axum` dependency; this
/// newtype is the only place the two meet.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            GatewayError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, "insufficient_funds"),
            GatewayError::AllowanceRequired(_) => (StatusCode::BAD_REQUEST, "allowance_required"),
            GatewayError::SlippageOrLiquidity(_) => (StatusCode::BAD_REQUEST, "slippage_or_liquidity"),
            GatewayError::Expired(_) => (StatusCode::SERVICE_UNAVAILABLE, "expired"),
            GatewayError::NonceStale(_) => (StatusCode::INTERNAL_SERVER_ERROR, "nonce_stale"),
            GatewayError::DeviceRejected(_) => (StatusCode::BAD_REQUEST, "device_rejected"),
            GatewayError::DeviceLocked(_) => (StatusCode::BAD_REQUEST, "device_locked"),
            GatewayError::DeviceWrongApp(_) => (StatusCode::BAD_REQUEST, "device_wrong_app"),
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                message: self.0.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
