//! Customer order route handlers: booking, history, receipts, checkout.

use axum::extract::{Path, State};
use tracing::instrument;

use sudsy_core::OrderId;

use crate::error::{ApiJson, ApiResponse, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::booking::{BookedOrder, BookingRequest, BookingService};
use crate::services::payments::{InitializedPayment, start_checkout};
use crate::services::receipt::{Receipt, receipt_for_customer};
use crate::state::AppState;

/// Book an order.
///
/// POST /api/orders
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(request): ApiJson<BookingRequest>,
) -> Result<ApiResponse<BookedOrder>> {
    let user = state
        .store()
        .get_user(&current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let booked = BookingService::new(state.store(), state.notifier())
        .book(&user, &request)
        .await?;
    Ok(ApiResponse::ok("Order booked", booked))
}

/// The customer's orders, newest first.
///
/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = state.store().list_orders_for_customer(&current.id).await?;
    Ok(ApiResponse::ok("Orders", orders))
}

/// Receipt for one of the customer's orders.
///
/// GET /api/orders/{id}/receipt
pub async fn receipt(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<Receipt>> {
    let receipt = receipt_for_customer(state.store(), &current.id, &id).await?;
    Ok(ApiResponse::ok("Receipt", receipt))
}

/// Start paying for an order; the client redirects to `authorization_url`.
///
/// POST /api/orders/{id}/pay
#[instrument(skip_all, fields(user_id = %current.id, order_id = %id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<InitializedPayment>> {
    let order = state
        .store()
        .get_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    if !order.is_owned_by(&current.id) {
        return Err(AppError::access_denied());
    }

    let payment = start_checkout(
        state.store(),
        state.payments(),
        &order,
        &current.email,
        &state.config().payment_callback_url(),
    )
    .await?;
    Ok(ApiResponse::ok("Payment initialized", payment))
}
