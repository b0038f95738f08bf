//! Back-office accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sudsy_core::{AdminUserId, Email};

pub use sudsy_core::AdminRole;

/// A staff member or administrator who manages orders.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    /// Deactivated admins cannot log in.
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `AdminStore::create_admin`; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub password_hash: String,
}
