//! Paystack webhook receiver.
//!
//! The signature is checked against the raw body before anything is parsed.
//! Once the body is verified and readable the delivery is always
//! acknowledged: processing failures are logged and Paystack is told
//! `{"status":"success"}` so it does not retry.

use axum::{Extension, Json, body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::error::AppError;
use crate::middleware::RequestId;
use crate::services::payments::signature::{self, SIGNATURE_HEADER, SignatureError};
use crate::services::webhook::{WebhookEvent, process_event};
use crate::state::AppState;

/// Acknowledgement body.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// Receive a Paystack event.
///
/// POST /api/webhooks/paystack
///
/// # Errors
///
/// Returns 400 for a missing or invalid signature and 500 for a body that
/// is not a JSON event.
#[instrument(
    skip(state, request_id, headers, body),
    fields(body_len = body.len(), delivery = request_id.as_ref().map(|ext| ext.0.as_str()))
)]
pub async fn paystack(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    signature::verify(&state.config().paystack.secret_key, &body, provided).map_err(
        |e| match e {
            SignatureError::Missing | SignatureError::Mismatch => {
                warn!(reason = %e, "Rejected webhook signature");
                AppError::BadRequest("Invalid signature".to_string())
            }
            SignatureError::Key(msg) => AppError::Internal(format!("webhook key: {msg}")),
        },
    )?;
    debug!("Paystack signature verified");

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Internal(format!("unreadable webhook payload: {e}")))?;

    match process_event(state.store(), state.notifier(), &event).await {
        Ok(outcome) => info!(event_type = %event.event, ?outcome, "Webhook processed"),
        Err(e) => {
            // Acknowledge anyway; the writes that succeeded stay applied
            error!(event_type = %event.event, error = %e, "Webhook processing failed");
        }
    }

    Ok(Json(WebhookAck { status: "success" }))
}
