//! Status enums for orders, payments, services, and admins.

use serde::{Deserialize, Serialize};

/// Order processing status.
///
/// ```text
/// pending -> confirmed -> picked_up -> processing -> ready -> out_for_delivery -> delivered
///    \___________\____________\____________\__________\_____________\_______-> cancelled
/// ```
///
/// Pickup-type orders may skip `out_for_delivery` (customer collects at `ready`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sudsy.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    PickedUp,
    Processing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns true if no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Returns true if an admin may move an order from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::{
            Cancelled, Confirmed, Delivered, OutForDelivery, Pending, PickedUp, Processing, Ready,
        };

        if self.is_terminal() {
            return false;
        }

        matches!(
            (self, next),
            (_, Cancelled)
                | (Pending, Confirmed)
                | (Confirmed, PickedUp)
                | (PickedUp, Processing)
                | (Processing, Ready)
                | (Ready, OutForDelivery | Delivered)
                | (OutForDelivery, Delivered)
        )
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::PickedUp => "picked_up",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status, driven by the payment gateway's webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sudsy.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How the cleaned laundry gets back to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sudsy.delivery_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Customer collects from the shop.
    #[default]
    Pickup,
    /// Delivered to the customer's address.
    Delivery,
}

/// How a catalog service is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sudsy.pricing_unit", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    /// Unit price times item count.
    PerItem,
    /// Unit price times weight in kilograms.
    PerKg,
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sudsy.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including admin user management.
    SuperAdmin,
    /// Full access to order management.
    Admin,
    /// Can update order progress but not cancel orders.
    Staff,
}

impl AdminRole {
    /// Returns true if this role may cancel orders.
    #[must_use]
    pub const fn can_cancel_orders(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::PickedUp));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::OutForDelivery));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancel_from_any_open_state() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::PickedUp,
            OrderStatus::Processing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled), "{status}");
        }
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).ok().as_deref(),
            Some("\"out_for_delivery\"")
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).ok().as_deref(),
            Some("\"paid\"")
        );
        assert_eq!(OrderStatus::PickedUp.to_string(), "picked_up");
    }

    #[test]
    fn test_admin_role_round_trip_from_str() {
        assert_eq!("staff".parse::<AdminRole>(), Ok(AdminRole::Staff));
        assert!("owner".parse::<AdminRole>().is_err());
        assert!(!AdminRole::Staff.can_cancel_orders());
    }
}
