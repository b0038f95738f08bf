//! Order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sudsy_core::{
    AdminUserId, DeliveryType, Kobo, OrderAmounts, OrderId, OrderItemId, OrderStatus,
    PaymentStatus, PhoneNumber, ServiceId, UserId,
};

/// Characters used in order numbers and payment references (no 0/O, 1/I).
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A laundry order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-friendly number quoted to customers, e.g. `SUD-7KQ2MX`.
    pub order_number: String,
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_phone: PhoneNumber,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Gateway reference of the latest payment attempt.
    pub payment_reference: Option<String>,
    #[serde(flatten)]
    pub amounts: OrderAmounts,
    pub delivery_type: DeliveryType,
    pub pickup_date: NaiveDate,
    pub pickup_address: String,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub assigned_admin_id: Option<AdminUserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true if `user_id` owns this order.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.customer_id == user_id
    }

    /// Returns true if the order can still be paid for.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.payment_status != PaymentStatus::Paid
            && self.status != OrderStatus::Cancelled
            && self.amounts.final_amount() > Kobo::ZERO
    }
}

/// One priced line on an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub service_id: ServiceId,
    /// Item count (1 for weight-priced lines).
    pub quantity: u32,
    /// Weight in kilograms, for weight-priced lines.
    pub weight_kg: Option<Decimal>,
    /// Service price at booking time.
    pub unit_price: Kobo,
    pub total_price: Kobo,
}

/// A priced line before it is attached to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub service_id: ServiceId,
    pub quantity: u32,
    pub weight_kg: Option<Decimal>,
    pub unit_price: Kobo,
    pub total_price: Kobo,
}

impl NewOrderItem {
    /// Attach this line to an order, assigning it an ID.
    #[must_use]
    pub fn into_item(self, order_id: &OrderId) -> OrderItem {
        OrderItem {
            id: OrderItemId::generate(),
            order_id: order_id.clone(),
            service_id: self.service_id,
            quantity: self.quantity,
            weight_kg: self.weight_kg,
            unit_price: self.unit_price,
            total_price: self.total_price,
        }
    }
}

/// Admin order list filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub limit: Option<u32>,
}

impl OrderFilter {
    /// Default page size for order listings.
    pub const DEFAULT_LIMIT: u32 = 50;
    /// Largest page size accepted.
    pub const MAX_LIMIT: u32 = 200;

    /// The effective page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Returns true if `order` passes this filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| s == order.status)
            && self.payment_status.is_none_or(|p| p == order.payment_status)
    }
}

/// Generate `len` random characters from an unambiguous alphabet.
fn random_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .filter_map(|_| REFERENCE_CHARSET.choose(&mut rng).map(|&b| char::from(b)))
        .collect()
}

/// Generate an order number, e.g. `SUD-7KQ2MX`.
#[must_use]
pub fn generate_order_number() -> String {
    format!("SUD-{}", random_code(6))
}

/// Generate a unique payment reference for an order.
///
/// Paystack references allow only alphanumerics, `-`, `.` and `=`.
#[must_use]
pub fn generate_payment_reference(order_number: &str) -> String {
    format!("{order_number}-{}", random_code(8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("SUD-"));
        assert_eq!(number.len(), 10);
        assert!(
            number
                .trim_start_matches("SUD-")
                .bytes()
                .all(|b| REFERENCE_CHARSET.contains(&b))
        );
    }

    #[test]
    fn test_payment_reference_charset() {
        let reference = generate_payment_reference("SUD-ABC234");
        assert!(reference.starts_with("SUD-ABC234-"));
        assert!(
            reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        );
        assert_ne!(reference, generate_payment_reference("SUD-ABC234"));
    }

    #[test]
    fn test_filter_limit_clamped() {
        assert_eq!(OrderFilter::default().limit(), OrderFilter::DEFAULT_LIMIT);
        let filter = OrderFilter {
            limit: Some(10_000),
            ..OrderFilter::default()
        };
        assert_eq!(filter.limit(), OrderFilter::MAX_LIMIT);
        let filter = OrderFilter {
            limit: Some(0),
            ..OrderFilter::default()
        };
        assert_eq!(filter.limit(), 1);
    }
}
