//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Session layer (tower-sessions)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    RequireAdmin, RequireAuth, clear_current_admin, clear_current_user, set_current_admin,
    set_current_user,
};
pub use request_id::{RequestId, propagate_request_id};
pub use session::create_session_layer;
