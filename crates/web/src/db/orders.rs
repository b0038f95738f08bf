//! Order and order item collections.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use sudsy_core::{
    AdminUserId, DeliveryType, Kobo, OrderAmounts, OrderId, OrderItemId, OrderStatus,
    PaymentStatus, PhoneNumber, ServiceId, UserId,
};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::{Order, OrderFilter, OrderItem};

/// A payment outcome written by the webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    /// Gateway reference; `None` leaves the stored reference unchanged.
    pub reference: Option<String>,
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order together with its items.
    async fn create_order(&self, order: &Order, items: &[OrderItem])
    -> Result<(), RepositoryError>;

    /// Get an order by ID.
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// A customer's orders, newest first.
    async fn list_orders_for_customer(
        &self,
        customer_id: &UserId,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// All orders matching `filter`, newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    /// Items of an order.
    async fn get_order_items(&self, order_id: &OrderId)
    -> Result<Vec<OrderItem>, RepositoryError>;

    /// Overwrite the processing status.
    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    /// Overwrite the payment status (and optionally the reference).
    async fn update_payment(
        &self,
        id: &OrderId,
        update: PaymentUpdate,
    ) -> Result<Order, RepositoryError>;

    /// Record the reference of a newly initialized payment.
    async fn set_payment_reference(
        &self,
        id: &OrderId,
        reference: &str,
    ) -> Result<(), RepositoryError>;

    /// Assign the order to an admin.
    async fn assign_order(
        &self,
        id: &OrderId,
        admin_id: &AdminUserId,
    ) -> Result<Order, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

const ORDER_COLUMNS: &str = "id, order_number, customer_id, customer_name, customer_phone, \
                             status, payment_status, payment_reference, total_amount, \
                             discount_amount, final_amount, delivery_type, pickup_date, \
                             pickup_address, delivery_address, notes, assigned_admin_id, \
                             created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, service_id, quantity, weight_kg, unit_price, total_price";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    customer_id: UserId,
    customer_name: String,
    customer_phone: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_reference: Option<String>,
    total_amount: Kobo,
    discount_amount: Kobo,
    final_amount: Kobo,
    delivery_type: DeliveryType,
    pickup_date: NaiveDate,
    pickup_address: String,
    delivery_address: Option<String>,
    notes: Option<String>,
    assigned_admin_id: Option<AdminUserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let customer_phone = PhoneNumber::parse(&row.customer_phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone on order {}: {e}", row.id))
        })?;
        let amounts =
            OrderAmounts::from_stored(row.total_amount, row.discount_amount, row.final_amount)
                .map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid amounts on order {}: {e}",
                        row.id
                    ))
                })?;

        Ok(Self {
            id: row.id,
            order_number: row.order_number,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_phone,
            status: row.status,
            payment_status: row.payment_status,
            payment_reference: row.payment_reference,
            amounts,
            delivery_type: row.delivery_type,
            pickup_date: row.pickup_date,
            pickup_address: row.pickup_address,
            delivery_address: row.delivery_address,
            notes: row.notes,
            assigned_admin_id: row.assigned_admin_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    service_id: ServiceId,
    quantity: i32,
    weight_kg: Option<Decimal>,
    unit_price: Kobo,
    total_price: Kobo,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity on item {}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            service_id: row.service_id,
            quantity,
            weight_kg: row.weight_kg,
            unit_price: row.unit_price,
            total_price: row.total_price,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

// =============================================================================
// PostgreSQL
// =============================================================================

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r"
            INSERT INTO sudsy.order (
                id, order_number, customer_id, customer_name, customer_phone,
                status, payment_status, payment_reference,
                total_amount, discount_amount, final_amount,
                delivery_type, pickup_date, pickup_address, delivery_address, notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ",
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.payment_reference.as_deref())
        .bind(order.amounts.total())
        .bind(order.amounts.discount())
        .bind(order.amounts.final_amount())
        .bind(order.delivery_type)
        .bind(order.pickup_date)
        .bind(&order.pickup_address)
        .bind(order.delivery_address.as_deref())
        .bind(order.notes.as_deref())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order number"))?;

        for item in items {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity too large on item {}", item.id))
            })?;

            sqlx::query(
                r"
                INSERT INTO sudsy.order_item
                    (id, order_id, service_id, quantity, weight_kg, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.service_id)
            .bind(quantity)
            .bind(item.weight_kg)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM sudsy.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: &UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM sudsy.order
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool())
        .await?;

        into_orders(rows)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM sudsy.order
            WHERE ($1::sudsy.order_status IS NULL OR status = $1)
              AND ($2::sudsy.payment_status IS NULL OR payment_status = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "
        ))
        .bind(filter.status)
        .bind(filter.payment_status)
        .bind(i64::from(filter.limit()))
        .fetch_all(self.pool())
        .await?;

        into_orders(rows)
    }

    async fn get_order_items(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM sudsy.order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE sudsy.order
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn update_payment(
        &self,
        id: &OrderId,
        update: PaymentUpdate,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE sudsy.order
            SET payment_status = $2,
                payment_reference = COALESCE($3, payment_reference),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.payment_status)
        .bind(update.reference)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn set_payment_reference(
        &self,
        id: &OrderId,
        reference: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE sudsy.order SET payment_reference = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(reference)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn assign_order(
        &self,
        id: &OrderId,
        admin_id: &AdminUserId,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE sudsy.order
            SET assigned_admin_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(admin_id)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
