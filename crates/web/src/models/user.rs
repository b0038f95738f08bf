//! Customer domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sudsy_core::{Email, PhoneNumber, UserId};

/// A registered customer.
///
/// The password hash lives only in the store and is never part of this type.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: PhoneNumber,
    /// Saved pickup/delivery addresses, at most one marked default.
    pub addresses: Vec<Address>,
    /// Number of orders ever booked.
    pub total_orders: i32,
    /// Redeemable loyalty balance (1 point = ₦1).
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The default address, or the first one saved.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
    }
}

/// A saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Short label, e.g. "Home" or "Office".
    pub label: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Single-line form used on orders and receipts.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.push(&self.city);
        parts.push(&self.state);
        parts.join(", ")
    }
}

/// Data needed to create a customer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub phone: PhoneNumber,
    pub password_hash: String,
}
