//! Order receipts.
//!
//! Receipts are not stored. Each request joins the order, its items, and the
//! catalog entries they reference.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use sudsy_core::{
    DeliveryType, Kobo, OrderId, OrderStatus, PaymentStatus, PricingUnit, ServiceId, UserId,
};

use crate::db::{RepositoryError, Store};
use crate::models::{Order, OrderItem, Service};

/// Errors that can occur while building a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("order not found")]
    NotFound,

    /// The requester does not own the order.
    #[error("access denied")]
    AccessDenied,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One priced line on a receipt.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLine {
    pub service_id: ServiceId,
    pub service_name: String,
    pub pricing_unit: Option<PricingUnit>,
    pub quantity: u32,
    pub weight_kg: Option<Decimal>,
    pub unit_price: Kobo,
    pub total_price: Kobo,
}

/// Naira strings for display, e.g. `₦5,200.00`.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptTotals {
    pub total: String,
    pub discount: String,
    pub final_amount: String,
}

/// A customer-facing receipt.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub delivery_type: DeliveryType,
    pub pickup_date: NaiveDate,
    pub pickup_address: String,
    pub delivery_address: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub total_amount: Kobo,
    pub discount_amount: Kobo,
    pub final_amount: Kobo,
    pub display: ReceiptTotals,
    pub created_at: DateTime<Utc>,
}

/// Build a receipt from an order, its items, and the services they use.
///
/// Items whose service has since been removed keep their stored prices and
/// show the service ID as the name.
#[must_use]
pub fn build_receipt(order: &Order, items: &[OrderItem], services: &[Service]) -> Receipt {
    let catalog: HashMap<&ServiceId, &Service> = services.iter().map(|s| (&s.id, s)).collect();

    let lines = items
        .iter()
        .map(|item| {
            let service = catalog.get(&item.service_id);
            ReceiptLine {
                service_id: item.service_id.clone(),
                service_name: service
                    .map_or_else(|| item.service_id.to_string(), |s| s.name.clone()),
                pricing_unit: service.map(|s| s.pricing_unit),
                quantity: item.quantity,
                weight_kg: item.weight_kg,
                unit_price: item.unit_price,
                total_price: item.total_price,
            }
        })
        .collect();

    let amounts = order.amounts;
    Receipt {
        order_id: order.id.clone(),
        order_number: order.order_number.clone(),
        customer_name: order.customer_name.clone(),
        status: order.status,
        payment_status: order.payment_status,
        payment_reference: order.payment_reference.clone(),
        delivery_type: order.delivery_type,
        pickup_date: order.pickup_date,
        pickup_address: order.pickup_address.clone(),
        delivery_address: order.delivery_address.clone(),
        lines,
        total_amount: amounts.total(),
        discount_amount: amounts.discount(),
        final_amount: amounts.final_amount(),
        display: ReceiptTotals {
            total: amounts.total().display(),
            discount: amounts.discount().display(),
            final_amount: amounts.final_amount().display(),
        },
        created_at: order.created_at,
    }
}

/// Load an order and render its receipt, without an ownership check.
///
/// # Errors
///
/// Returns `ReceiptError::NotFound` if the order does not exist.
pub async fn load_receipt(
    store: &dyn Store,
    order_id: &OrderId,
) -> Result<(Order, Receipt), ReceiptError> {
    let order = store
        .get_order(order_id)
        .await?
        .ok_or(ReceiptError::NotFound)?;
    let items = store.get_order_items(&order.id).await?;

    let mut service_ids: Vec<ServiceId> = items.iter().map(|i| i.service_id.clone()).collect();
    service_ids.sort();
    service_ids.dedup();
    let services = store.get_services(&service_ids).await?;

    let receipt = build_receipt(&order, &items, &services);
    Ok((order, receipt))
}

/// The receipt for `order_id`, only if `requester` owns the order.
///
/// # Errors
///
/// Returns `ReceiptError::AccessDenied` when the order belongs to someone
/// else, and no order data.
pub async fn receipt_for_customer(
    store: &dyn Store,
    requester: &UserId,
    order_id: &OrderId,
) -> Result<Receipt, ReceiptError> {
    let (order, receipt) = load_receipt(store, order_id).await?;
    if !order.is_owned_by(requester) {
        tracing::warn!(%order_id, %requester, "Receipt access denied");
        return Err(ReceiptError::AccessDenied);
    }
    Ok(receipt)
}
