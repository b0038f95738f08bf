//! Admin route handlers: login and order management.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sudsy_core::{OrderId, OrderStatus};

use crate::error::{ApiJson, ApiResponse, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Order, OrderFilter, OrderItem};
use crate::routes::auth::{LoginRequest, session_error};
use crate::services::auth::AuthService;
use crate::services::order_admin::OrderAdminService;
use crate::state::AppState;

/// An order with its items.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Requested status change.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Log an admin in. Customer credentials are refused.
///
/// POST /api/admin/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<ApiResponse<CurrentAdmin>> {
    let admin = AuthService::new(state.store())
        .admin_login(&form.email, &form.password)
        .await?;

    let current = CurrentAdmin::from(&admin);
    set_current_admin(&session, &current)
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    Ok(ApiResponse::ok("Login successful", current))
}

/// Log the admin out.
///
/// POST /api/admin/logout
pub async fn logout(session: Session) -> Result<ApiResponse<()>> {
    clear_current_admin(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();
    Ok(ApiResponse::done("Logged out"))
}

/// All orders, newest first, optionally filtered.
///
/// GET /api/admin/orders?status=&payment_status=&limit=
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = state.store().list_orders(&filter).await?;
    Ok(ApiResponse::ok("Orders", orders))
}

/// One order with its items.
///
/// GET /api/admin/orders/{id}
pub async fn order(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<OrderDetail>> {
    let order = state
        .store()
        .get_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let items = state.store().get_order_items(&order.id).await?;
    Ok(ApiResponse::ok("Order", OrderDetail { order, items }))
}

/// Move an order to a new status.
///
/// POST /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<ApiResponse<Order>> {
    let order = OrderAdminService::new(state.store(), state.notifier())
        .update_status(&admin, &id, update.status)
        .await?;
    Ok(ApiResponse::ok("Order status updated", order))
}

/// Assign an order to the logged-in admin.
///
/// POST /api/admin/orders/{id}/assign
pub async fn assign(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = OrderAdminService::new(state.store(), state.notifier())
        .assign_to_self(&admin, &id)
        .await?;
    Ok(ApiResponse::ok("Order assigned", order))
}

/// Send the customer a WhatsApp payment reminder.
///
/// POST /api/admin/orders/{id}/remind
pub async fn remind(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = OrderAdminService::new(state.store(), state.notifier())
        .send_reminder(&id)
        .await?;
    Ok(ApiResponse::ok("Payment reminder sent", order))
}
