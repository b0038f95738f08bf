//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness
//! GET  /health/ready                         - Store connectivity
//!
//! # Webhooks
//! POST /api/webhooks/paystack                - Paystack events (signed)
//!
//! # Auth
//! POST /api/auth/register                    - Register and log in
//! POST /api/auth/login                       - Login
//! POST /api/auth/logout                      - Logout
//! GET  /api/auth/me                          - Session identity
//!
//! # Account (requires auth)
//! GET    /api/account                        - Profile
//! PATCH  /api/account                        - Update name/phone
//! POST   /api/account/addresses              - Add address
//! DELETE /api/account/addresses/{index}      - Remove address
//! POST   /api/account/addresses/{index}/default - Set default address
//!
//! # Catalog
//! GET  /api/services                         - Active services
//!
//! # Orders (requires auth)
//! POST /api/orders                           - Book an order
//! GET  /api/orders                           - Order history
//! GET  /api/orders/{id}/receipt              - Receipt (owner only)
//! POST /api/orders/{id}/pay                  - Initialize payment
//! GET  /api/payments/verify/{reference}      - Payment status
//!
//! # Admin (requires admin auth except login)
//! POST /api/admin/login                      - Login
//! POST /api/admin/logout                     - Logout
//! GET  /api/admin/orders                     - Filtered order list
//! GET  /api/admin/orders/{id}                - Order with items
//! POST /api/admin/orders/{id}/status         - Update status
//! POST /api/admin/orders/{id}/assign         - Assign to self
//! POST /api/admin/orders/{id}/remind         - WhatsApp payment reminder
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod payments;
pub mod webhooks;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{create_session_layer, propagate_request_id};
use crate::state::AppState;

/// Create the customer auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route("/", get(account::show).patch(account::update))
        .route("/addresses", post(account::add_address))
        .route("/addresses/{index}", delete(account::remove_address))
        .route(
            "/addresses/{index}/default",
            post(account::set_default_address),
        )
}

/// Create the customer order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}/receipt", get(orders::receipt))
        .route("/{id}/pay", post(orders::pay))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}", get(admin::order))
        .route("/orders/{id}/status", post(admin::update_status))
        .route("/orders/{id}/assign", post(admin::assign))
        .route("/orders/{id}/remind", post(admin::remind))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/paystack", post(webhooks::paystack))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .route("/services", get(catalog::index))
        .nest("/orders", order_routes())
        .route("/payments/verify/{reference}", get(payments::verify))
        .nest("/admin", admin_routes())
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// Build the application router with sessions, request IDs, and tracing.
///
/// Sentry layers are added by the binary around this router.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());

    routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(propagate_request_id))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
