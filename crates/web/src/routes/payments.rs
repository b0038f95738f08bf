//! Payment verification route handler.

use axum::extract::{Path, State};

use crate::error::{ApiResponse, AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::payments::PaymentVerification;
use crate::state::AppState;

/// Look up a transaction after the customer returns from checkout.
///
/// Read-only: the order is only updated by the webhook. The transaction
/// must name an order that exists and belongs to the caller.
///
/// GET /api/payments/verify/{reference}
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(reference): Path<String>,
) -> Result<ApiResponse<PaymentVerification>> {
    let verification = state.payments().verify(&reference).await?;

    let order = match &verification.order_id {
        Some(order_id) => state.store().get_order(order_id).await?,
        None => None,
    };
    if !order.is_some_and(|o| o.is_owned_by(&current.id)) {
        return Err(AppError::access_denied());
    }

    Ok(ApiResponse::ok("Payment status", verification))
}
