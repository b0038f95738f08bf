//! Identities serialized into the session record after login.

use serde::{Deserialize, Serialize};

use sudsy_core::{AdminRole, AdminUserId, Email, UserId};

use super::{AdminUser, User};

/// A logged-in customer, as the session remembers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A logged-in admin. The role is copied at login time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub name: String,
    pub email: Email,
    pub role: AdminRole,
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: admin.role,
        }
    }
}

pub mod keys {
    pub const CURRENT_USER: &str = "current_user";
    pub const CURRENT_ADMIN: &str = "current_admin";
}
