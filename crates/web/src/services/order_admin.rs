//! Admin order management.

use thiserror::Error;
use tracing::{info, instrument};

use sudsy_core::{OrderId, OrderStatus, PaymentStatus};

use crate::db::{RepositoryError, Store};
use crate::models::{CurrentAdmin, Order};
use crate::services::booking::points_earned;
use crate::services::notifications::{Notifier, NotifyError};

/// Errors from admin order actions.
#[derive(Debug, Error)]
pub enum OrderAdminError {
    #[error("order not found")]
    NotFound,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The admin's role does not allow this action.
    #[error("access denied")]
    AccessDenied,

    #[error("order is already paid")]
    AlreadyPaid,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Order actions available to admins.
pub struct OrderAdminService<'a> {
    store: &'a dyn Store,
    notifier: &'a dyn Notifier,
}

impl<'a> OrderAdminService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    async fn fetch(&self, id: &OrderId) -> Result<Order, OrderAdminError> {
        self.store
            .get_order(id)
            .await?
            .ok_or(OrderAdminError::NotFound)
    }

    /// Move an order along its lifecycle.
    ///
    /// Delivering an order credits the customer's loyalty points.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::InvalidTransition` for moves the lifecycle
    /// does not allow and `OrderAdminError::AccessDenied` when staff try to
    /// cancel.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn update_status(
        &self,
        admin: &CurrentAdmin,
        id: &OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderAdminError> {
        let order = self.fetch(id).await?;

        if next == OrderStatus::Cancelled && !admin.role.can_cancel_orders() {
            return Err(OrderAdminError::AccessDenied);
        }
        if !order.status.can_transition_to(next) {
            return Err(OrderAdminError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let updated = self.store.update_order_status(id, next).await?;
        info!(from = %order.status, to = %next, "Order status updated");

        if next == OrderStatus::Delivered {
            let points = points_earned(updated.amounts.final_amount());
            if points > 0 {
                self.store
                    .credit_loyalty_points(&updated.customer_id, points)
                    .await?;
                info!(customer_id = %updated.customer_id, points, "Loyalty points credited");
            }
        }

        Ok(updated)
    }

    /// Assign the order to the acting admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::NotFound` if the order does not exist.
    pub async fn assign_to_self(
        &self,
        admin: &CurrentAdmin,
        id: &OrderId,
    ) -> Result<Order, OrderAdminError> {
        let order = self.store.assign_order(id, &admin.id).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderAdminError::NotFound,
            other => OrderAdminError::Repository(other),
        })?;
        info!(%id, admin_id = %admin.id, "Order assigned");
        Ok(order)
    }

    /// Send the customer a payment reminder for an unpaid order.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::AlreadyPaid` for paid orders and
    /// `OrderAdminError::Notify` if the message cannot be sent.
    pub async fn send_reminder(&self, id: &OrderId) -> Result<Order, OrderAdminError> {
        let order = self.fetch(id).await?;
        if order.payment_status == PaymentStatus::Paid {
            return Err(OrderAdminError::AlreadyPaid);
        }

        self.notifier
            .send_payment_reminder(order.customer_phone.as_str(), &order.customer_name, &order.id)
            .await?;
        info!(%id, "Payment reminder sent");
        Ok(order)
    }
}
