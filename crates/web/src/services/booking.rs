//! Order booking.
//!
//! Prices the requested items against the live catalog, applies loyalty
//! redemption, stores the order, and sends the pickup confirmation.
//!
//! # Loyalty
//!
//! One point is worth ₦1 (100 kobo) when redeemed. Customers earn one point
//! per full ₦100 of an order's final amount when it is delivered.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use sudsy_core::{
    DeliveryType, Kobo, OrderAmounts, OrderAmountsError, OrderId, OrderStatus, PaymentStatus,
    PricingUnit, ServiceId,
};

use crate::db::{RepositoryError, Store};
use crate::models::order::generate_order_number;
use crate::models::{NewOrderItem, Order, OrderItem, Service, User};
use crate::services::notifications::Notifier;

/// Kobo value of one redeemed loyalty point.
pub const KOBO_PER_POINT: i64 = 100;

/// Final-amount kobo needed to earn one loyalty point (₦100).
pub const KOBO_PER_EARNED_POINT: i64 = 10_000;

/// Weights are stored as `NUMERIC(8, 2)`.
const WEIGHT_DECIMAL_PLACES: u32 = 2;

/// Largest weight the order items table can hold.
pub const MAX_WEIGHT_KG: Decimal =
    Decimal::from_parts(99_999_999, 0, 0, false, WEIGHT_DECIMAL_PLACES);

/// Errors that can occur while booking an order.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("an order needs at least one item")]
    NoItems,

    #[error("service {0} does not exist")]
    UnknownService(ServiceId),

    #[error("service {0} is not currently offered")]
    InactiveService(ServiceId),

    #[error("service {0} is priced per item and needs a quantity of at least 1")]
    MissingQuantity(ServiceId),

    #[error("service {0} is priced per kg and needs a weight above zero")]
    InvalidWeight(ServiceId),

    #[error("service {0} accepts at most {MAX_WEIGHT_KG} kg per line")]
    WeightTooLarge(ServiceId),

    #[error("a pickup address is required")]
    MissingPickupAddress,

    #[error("delivery orders need a delivery address")]
    MissingDeliveryAddress,

    #[error("pickup date {0} is in the past")]
    PickupDateInPast(NaiveDate),

    #[error("loyalty points to redeem cannot be negative")]
    NegativeRedemption,

    #[error("order amount is too large")]
    AmountOverflow,

    #[error("invalid amounts: {0}")]
    Amounts(#[from] OrderAmountsError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One line of a booking request.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingItem {
    pub service_id: ServiceId,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
}

/// A customer's booking request.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub items: Vec<BookingItem>,
    pub delivery_type: DeliveryType,
    pub pickup_date: NaiveDate,
    /// Defaults to the customer's default saved address.
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Loyalty points the customer wants to spend on this order.
    #[serde(default)]
    pub redeem_points: i64,
}

/// A stored order with its items.
#[derive(Debug, Clone, Serialize)]
pub struct BookedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub points_redeemed: i64,
}

/// Price one request line against its catalog entry.
///
/// # Errors
///
/// Returns an error if the service is inactive, the quantity or weight is
/// missing, or the price overflows.
pub fn price_item(service: &Service, item: &BookingItem) -> Result<NewOrderItem, BookingError> {
    if !service.is_active {
        return Err(BookingError::InactiveService(service.id.clone()));
    }

    let (quantity, weight_kg, total_price) = match service.pricing_unit {
        PricingUnit::PerItem => {
            let quantity = item
                .quantity
                .filter(|&q| q >= 1)
                .ok_or_else(|| BookingError::MissingQuantity(service.id.clone()))?;
            let total = service
                .unit_price
                .as_i64()
                .checked_mul(i64::from(quantity))
                .ok_or(BookingError::AmountOverflow)?;
            (quantity, None, Kobo::new(total))
        }
        PricingUnit::PerKg => {
            let weight = item
                .weight_kg
                .map(|w| {
                    w.round_dp_with_strategy(
                        WEIGHT_DECIMAL_PLACES,
                        RoundingStrategy::MidpointAwayFromZero,
                    )
                })
                .filter(|w| w.is_sign_positive() && !w.is_zero())
                .ok_or_else(|| BookingError::InvalidWeight(service.id.clone()))?;
            if weight > MAX_WEIGHT_KG {
                return Err(BookingError::WeightTooLarge(service.id.clone()));
            }
            let total = service
                .unit_price
                .scale(weight)
                .ok_or(BookingError::AmountOverflow)?;
            (1, Some(weight), total)
        }
    };

    Ok(NewOrderItem {
        service_id: service.id.clone(),
        quantity,
        weight_kg,
        unit_price: service.unit_price,
        total_price,
    })
}

/// Points actually redeemed: the request capped at the balance and at the
/// order total.
#[must_use]
pub fn redeemable_points(requested: i64, balance: i64, total: Kobo) -> i64 {
    requested
        .min(balance)
        .min(total.as_i64() / KOBO_PER_POINT)
        .max(0)
}

/// Loyalty points earned by a delivered order.
#[must_use]
pub const fn points_earned(final_amount: Kobo) -> i64 {
    final_amount.as_i64() / KOBO_PER_EARNED_POINT
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Books orders for a customer.
pub struct BookingService<'a> {
    store: &'a dyn Store,
    notifier: &'a dyn Notifier,
}

impl<'a> BookingService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    /// Validate, price, and store a new order.
    ///
    /// A failed pickup confirmation is logged and does not fail the booking.
    ///
    /// # Errors
    ///
    /// Returns `BookingError` for invalid requests or store failures.
    #[instrument(skip(self, user, request), fields(user_id = %user.id, items = request.items.len()))]
    pub async fn book(
        &self,
        user: &User,
        request: &BookingRequest,
    ) -> Result<BookedOrder, BookingError> {
        if request.items.is_empty() {
            return Err(BookingError::NoItems);
        }
        if request.redeem_points < 0 {
            return Err(BookingError::NegativeRedemption);
        }
        let today = Utc::now().date_naive();
        if request.pickup_date < today {
            return Err(BookingError::PickupDateInPast(request.pickup_date));
        }

        let pickup_address = non_empty(request.pickup_address.as_deref())
            .or_else(|| user.default_address().map(|a| a.one_line()))
            .ok_or(BookingError::MissingPickupAddress)?;
        let delivery_address = match request.delivery_type {
            DeliveryType::Delivery => Some(
                non_empty(request.delivery_address.as_deref())
                    .ok_or(BookingError::MissingDeliveryAddress)?,
            ),
            DeliveryType::Pickup => None,
        };

        let lines = self.price_items(&request.items).await?;
        let total = lines
            .iter()
            .try_fold(0_i64, |sum, line| sum.checked_add(line.total_price.as_i64()))
            .map(Kobo::new)
            .ok_or(BookingError::AmountOverflow)?;

        let points = redeemable_points(request.redeem_points, user.loyalty_points, total);
        let amounts = OrderAmounts::new(total, Kobo::new(points * KOBO_PER_POINT))?;

        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            order_number: generate_order_number(),
            customer_id: user.id.clone(),
            customer_name: user.name.clone(),
            customer_phone: user.phone.clone(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            amounts,
            delivery_type: request.delivery_type,
            pickup_date: request.pickup_date,
            pickup_address,
            delivery_address,
            notes: non_empty(request.notes.as_deref()),
            assigned_admin_id: None,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = lines
            .into_iter()
            .map(|line| line.into_item(&order.id))
            .collect();

        self.store.create_order(&order, &items).await?;
        self.store.record_booking(&user.id, points).await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            final_amount = %order.amounts.final_amount(),
            points_redeemed = points,
            "Order booked"
        );

        if let Err(e) = self
            .notifier
            .send_pickup_confirmation(order.customer_phone.as_str(), &order.customer_name, &order.id)
            .await
        {
            warn!(order_id = %order.id, error = %e, "Failed to send pickup confirmation");
        }

        Ok(BookedOrder {
            order,
            items,
            points_redeemed: points,
        })
    }

    async fn price_items(&self, items: &[BookingItem]) -> Result<Vec<NewOrderItem>, BookingError> {
        let ids: Vec<ServiceId> = items.iter().map(|i| i.service_id.clone()).collect();
        let catalog: HashMap<ServiceId, Service> = self
            .store
            .get_services(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        items
            .iter()
            .map(|item| {
                let service = catalog
                    .get(&item.service_id)
                    .ok_or_else(|| BookingError::UnknownService(item.service_id.clone()))?;
                price_item(service, item)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::Days;

    use sudsy_core::{Email, PhoneNumber};

    use super::*;
    use crate::db::{CatalogStore, MemoryStore, OrderStore, UserStore};
    use crate::models::{Address, NewUser};
    use crate::services::notifications::RecordingNotifier;

    fn service(pricing_unit: PricingUnit, unit_price: i64, is_active: bool) -> Service {
        let now = Utc::now();
        Service {
            id: ServiceId::new("s1"),
            name: "Wash & Fold".to_string(),
            description: String::new(),
            pricing_unit,
            unit_price: Kobo::new(unit_price),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(quantity: Option<u32>, weight: Option<&str>) -> BookingItem {
        BookingItem {
            service_id: ServiceId::new("s1"),
            quantity,
            weight_kg: weight.map(|w| Decimal::from_str(w).unwrap()),
        }
    }

    #[test]
    fn test_price_per_item() {
        let item = price_item(&service(PricingUnit::PerItem, 50_000, true), &line(Some(3), None))
            .unwrap();
        assert_eq!(item.total_price, Kobo::new(150_000));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.weight_kg, None);
    }

    #[test]
    fn test_price_per_kg_rounds_to_kobo() {
        // 1,234 kobo/kg x 2.5 kg = 3,085 kobo
        let item =
            price_item(&service(PricingUnit::PerKg, 1_234, true), &line(None, Some("2.5")))
                .unwrap();
        assert_eq!(item.total_price, Kobo::new(3_085));

        // 333 kobo/kg x 1.5 kg = 499.5 -> 500
        let item = price_item(&service(PricingUnit::PerKg, 333, true), &line(None, Some("1.5")))
            .unwrap();
        assert_eq!(item.total_price, Kobo::new(500));
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_price_rejects_bad_lines() {
        assert!(matches!(
            price_item(&service(PricingUnit::PerItem, 100, true), &line(Some(0), None)),
            Err(BookingError::MissingQuantity(_))
        ));
        assert!(matches!(
            price_item(&service(PricingUnit::PerKg, 100, true), &line(None, Some("0"))),
            Err(BookingError::InvalidWeight(_))
        ));
        assert!(matches!(
            price_item(&service(PricingUnit::PerKg, 100, true), &line(None, Some("-1"))),
            Err(BookingError::InvalidWeight(_))
        ));
        assert!(matches!(
            price_item(&service(PricingUnit::PerItem, 100, false), &line(Some(1), None)),
            Err(BookingError::InactiveService(_))
        ));
    }

    #[test]
    fn test_weight_is_priced_as_stored() {
        // 2.345 kg is kept as 2.35 kg, so 100,000 kobo/kg prices at 235,000
        let item =
            price_item(&service(PricingUnit::PerKg, 100_000, true), &line(None, Some("2.345")))
                .unwrap();
        assert_eq!(item.weight_kg, Some(Decimal::from_str("2.35").unwrap()));
        assert_eq!(item.total_price, Kobo::new(235_000));

        // Rounds down to zero
        assert!(matches!(
            price_item(&service(PricingUnit::PerKg, 100, true), &line(None, Some("0.004"))),
            Err(BookingError::InvalidWeight(_))
        ));
    }

    #[test]
    fn test_weight_is_capped_at_column_range() {
        let item =
            price_item(&service(PricingUnit::PerKg, 100, true), &line(None, Some("999999.99")))
                .unwrap();
        assert_eq!(item.weight_kg, Some(MAX_WEIGHT_KG));

        assert!(matches!(
            price_item(&service(PricingUnit::PerKg, 100, true), &line(None, Some("1000000"))),
            Err(BookingError::WeightTooLarge(_))
        ));
    }

    #[test]
    fn test_redeemable_points_caps() {
        assert_eq!(redeemable_points(500, 200, Kobo::new(100_000)), 200);
        assert_eq!(redeemable_points(500, 5_000, Kobo::new(30_000)), 300);
        assert_eq!(redeemable_points(50, 5_000, Kobo::new(30_000)), 50);
        assert_eq!(redeemable_points(0, 5_000, Kobo::new(30_000)), 0);
    }

    #[test]
    fn test_points_earned_per_full_hundred_naira() {
        assert_eq!(points_earned(Kobo::new(9_999)), 0);
        assert_eq!(points_earned(Kobo::from_naira(100)), 1);
        assert_eq!(points_earned(Kobo::from_naira(4_550)), 45);
    }

    async fn setup() -> (MemoryStore, User, ServiceId, ServiceId) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: Email::parse("ada@example.com").unwrap(),
                phone: PhoneNumber::parse("+2348000000000").unwrap(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let user = store
            .set_addresses(
                &user.id,
                &[Address {
                    label: "Home".to_string(),
                    line1: "12 Bode Thomas St".to_string(),
                    line2: None,
                    city: "Surulere".to_string(),
                    state: "Lagos".to_string(),
                    is_default: true,
                }],
            )
            .await
            .unwrap();
        store.credit_loyalty_points(&user.id, 300).await.unwrap();
        let user = store.get_user(&user.id).await.unwrap().unwrap();

        let shirts = store
            .upsert_service("Shirts", "", PricingUnit::PerItem, Kobo::from_naira(500))
            .await
            .unwrap();
        let wash = store
            .upsert_service("Wash & Fold", "", PricingUnit::PerKg, Kobo::from_naira(1_000))
            .await
            .unwrap();

        (store, user, shirts.id, wash.id)
    }

    fn request(shirts: &ServiceId, wash: &ServiceId) -> BookingRequest {
        BookingRequest {
            items: vec![
                BookingItem {
                    service_id: shirts.clone(),
                    quantity: Some(4),
                    weight_kg: None,
                },
                BookingItem {
                    service_id: wash.clone(),
                    quantity: None,
                    weight_kg: Some(Decimal::new(35, 1)),
                },
            ],
            delivery_type: DeliveryType::Pickup,
            pickup_date: Utc::now().date_naive() + Days::new(1),
            pickup_address: None,
            delivery_address: None,
            notes: Some("  ".to_string()),
            redeem_points: 0,
        }
    }

    #[tokio::test]
    async fn test_book_prices_and_stores_order() {
        let (store, user, shirts, wash) = setup().await;
        let notifier = RecordingNotifier::new();
        let booking = BookingService::new(&store, &notifier);

        let mut req = request(&shirts, &wash);
        req.redeem_points = 1_000;
        let booked = booking.book(&user, &req).await.unwrap();

        // 4 x ₦500 + 3.5 kg x ₦1,000 = ₦5,500; 300 points = ₦300 off
        let amounts = booked.order.amounts;
        assert_eq!(amounts.total(), Kobo::from_naira(5_500));
        assert_eq!(amounts.discount(), Kobo::from_naira(300));
        assert_eq!(amounts.final_amount(), Kobo::from_naira(5_200));
        assert_eq!(booked.points_redeemed, 300);
        assert_eq!(
            booked.order.pickup_address,
            "12 Bode Thomas St, Surulere, Lagos"
        );
        assert_eq!(booked.order.notes, None);

        let stored_items = store.get_order_items(&booked.order.id).await.unwrap();
        assert_eq!(stored_items.len(), 2);

        let user = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(user.total_orders, 1);
        assert_eq!(user.loyalty_points, 0);

        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent()[0].order_id, booked.order.id);
    }

    #[tokio::test]
    async fn test_book_survives_notification_failure() {
        let (store, user, shirts, wash) = setup().await;
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);

        let booked = BookingService::new(&store, &notifier)
            .book(&user, &request(&shirts, &wash))
            .await
            .unwrap();
        assert!(store.get_order(&booked.order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_book_validation() {
        let (store, user, shirts, wash) = setup().await;
        let notifier = RecordingNotifier::new();
        let booking = BookingService::new(&store, &notifier);

        let mut req = request(&shirts, &wash);
        req.delivery_type = DeliveryType::Delivery;
        assert!(matches!(
            booking.book(&user, &req).await,
            Err(BookingError::MissingDeliveryAddress)
        ));

        let mut req = request(&shirts, &wash);
        req.items.clear();
        assert!(matches!(
            booking.book(&user, &req).await,
            Err(BookingError::NoItems)
        ));

        let mut req = request(&shirts, &wash);
        req.items[0].service_id = ServiceId::new("missing");
        assert!(matches!(
            booking.book(&user, &req).await,
            Err(BookingError::UnknownService(_))
        ));

        let mut req = request(&shirts, &wash);
        req.pickup_date = Utc::now().date_naive() - Days::new(1);
        assert!(matches!(
            booking.book(&user, &req).await,
            Err(BookingError::PickupDateInPast(_))
        ));

        assert!(notifier.sent().is_empty());
    }
}
