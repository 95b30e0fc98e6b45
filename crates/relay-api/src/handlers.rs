//! # Request Handlers
//!
//! Axum request handlers for the relay API.
//! Every handler validates its body before touching the gateway.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use relay_core::{PaymentDto, PaymentError, PaymentRequest, TransferRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

/// Plain-text marker served at `/`
pub const HEALTH_MARKER: &str = "Pi Payment Server is running!";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Approve payment request. Fields stay untyped so validation owns the error.
#[derive(Debug, Default, Deserialize)]
pub struct ApprovePaymentRequest {
    #[serde(default, rename = "paymentId")]
    pub payment_id: Option<Value>,
}

/// Complete payment request
#[derive(Debug, Default, Deserialize)]
pub struct CompletePaymentRequest {
    #[serde(default, rename = "paymentId")]
    pub payment_id: Option<Value>,
    #[serde(default)]
    pub txid: Option<Value>,
}

/// Send (A2U) request
#[derive(Debug, Default, Deserialize)]
pub struct SendPiRequest {
    #[serde(default)]
    pub uid: Option<Value>,
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub memo: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePaymentResponse {
    pub success: bool,
    pub status: &'static str,
    pub payment_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePaymentResponse {
    pub success: bool,
    pub status: &'static str,
    pub data: PaymentDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPiResponse {
    pub success: bool,
    /// The completed payment record
    pub data: PaymentDto,
    pub txid: String,
    pub stale_cancelled: usize,
    pub stale_cancel_failures: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: u16,
    /// Underlying cause, for remote failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Remote error payload, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
            reason: None,
            details: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Validation errors report their own message; remote failures report
/// `failure` plus the cause and the remote payload.
fn payment_error_to_response(failure: &str, err: PaymentError) -> ApiError {
    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let response = if err.is_validation() {
        ErrorResponse::new(err.to_string(), code)
    } else {
        let mut response = ErrorResponse::new(failure, code).with_reason(err.to_string());
        if let Some(details) = err.details() {
            response = response.with_details(details.clone());
        }
        response
    };

    (status, Json(response))
}

fn rejection_to_response(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(
            format!("Invalid JSON body: {}", rejection.body_text()),
            400,
        )),
    )
}

/// Read a request body, accepting only a JSON object.
///
/// Derived `Deserialize` would also fill the request structs from an array
/// by position, so the shape is checked on the raw value first.
fn object_body<T: DeserializeOwned>(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<T, ApiError> {
    let Json(value) = payload.map_err(rejection_to_response)?;
    if !value.is_object() {
        warn!("Rejected non-object request body");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Request body must be a JSON object", 400)),
        ));
    }

    serde_json::from_value(value).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid request body: {}", e), 400)),
        )
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Root health marker
pub async fn root() -> &'static str {
    HEALTH_MARKER
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pi-relay",
        "provider": state.gateway.provider_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Approve a user-to-app payment
#[instrument(skip(state, payload))]
pub async fn approve_payment(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApprovePaymentResponse>, ApiError> {
    let body: ApprovePaymentRequest = object_body(payload)?;
    let request = PaymentRequest::for_approval(body.payment_id.as_ref())
        .map_err(|e| payment_error_to_response("Failed to approve payment", e))?;

    info!("Approving U2A payment: {}", request.payment_id);

    let status = state
        .lifecycle
        .approve(&request.payment_id)
        .await
        .map_err(|e| {
            error!("Approve error for {}: {}", request.payment_id, e);
            payment_error_to_response("Failed to approve payment", e)
        })?;

    Ok(Json(ApprovePaymentResponse {
        success: true,
        status: status.as_str(),
        payment_id: request.payment_id,
    }))
}

/// Complete a user-to-app payment
#[instrument(skip(state, payload))]
pub async fn complete_payment(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CompletePaymentResponse>, ApiError> {
    let body: CompletePaymentRequest = object_body(payload)?;
    let request = PaymentRequest::for_completion(body.payment_id.as_ref(), body.txid.as_ref())
        .map_err(|e| payment_error_to_response("Failed to complete payment", e))?;
    let txid = request.txid.as_deref().unwrap_or_default();

    info!("Completing U2A payment: {}", request.payment_id);

    let outcome = state
        .lifecycle
        .complete(&request.payment_id, txid)
        .await
        .map_err(|e| {
            error!("Complete error for {}: {}", request.payment_id, e);
            payment_error_to_response("Failed to complete payment", e)
        })?;

    Ok(Json(CompletePaymentResponse {
        success: true,
        status: outcome.status.as_str(),
        data: outcome.payment,
    }))
}

/// Pay a user from the app wallet (A2U)
#[instrument(skip(state, payload))]
pub async fn send_pi(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SendPiResponse>, ApiError> {
    let body: SendPiRequest = object_body(payload)?;
    let request = TransferRequest::from_fields(
        body.uid.as_ref(),
        body.username.as_ref(),
        body.amount.as_ref(),
        body.memo.as_ref(),
    )
    .map_err(|e| payment_error_to_response("Failed to send Pi", e))?;

    let receipt = state.transfers.send(&request).await.map_err(|e| {
        error!("A2U error for {}: {}", request.recipient, e);
        payment_error_to_response("Failed to send Pi", e)
    })?;

    if receipt.stale_cancel_failures > 0 {
        warn!(
            "{} stale payments could not be cancelled",
            receipt.stale_cancel_failures
        );
    }

    Ok(Json(SendPiResponse {
        success: true,
        data: receipt.payment,
        txid: receipt.txid,
        stale_cancelled: receipt.stale_cancelled,
        stale_cancel_failures: receipt.stale_cancel_failures,
    }))
}
