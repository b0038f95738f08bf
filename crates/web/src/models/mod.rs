//! Domain models for the booking service.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod admin_user;
pub mod order;
pub mod service;
pub mod session;
pub mod user;

pub use admin_user::{AdminUser, NewAdminUser};
pub use order::{NewOrderItem, Order, OrderFilter, OrderItem};
pub use service::Service;
pub use session::{CurrentAdmin, CurrentUser, keys as session_keys};
pub use user::{Address, NewUser, User};
