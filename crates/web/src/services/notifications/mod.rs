//! Customer notifications.
//!
//! Two templated messages are sent to customers over WhatsApp:
//!
//! - pickup confirmation, when an order is booked or its payment succeeds
//! - payment reminder, when a payment fails or an admin chases an unpaid order
//!
//! Handlers talk to the [`Notifier`] trait. In production this is the
//! [`WhatsAppClient`]; when WhatsApp is not configured the
//! [`LoggingNotifier`] records the message in the logs instead.

mod logging;
#[cfg(any(test, feature = "test-utils"))]
mod recording;
mod whatsapp;

pub use logging::LoggingNotifier;
#[cfg(any(test, feature = "test-utils"))]
pub use recording::{Notification, NotificationKind, RecordingNotifier};
pub use whatsapp::WhatsAppClient;

use async_trait::async_trait;
use thiserror::Error;

use sudsy_core::OrderId;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Messaging API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Recipient number is unusable.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Outbound customer messaging.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the customer their pickup is booked and confirmed.
    async fn send_pickup_confirmation(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError>;

    /// Ask the customer to complete payment for an order.
    async fn send_payment_reminder(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError>;
}

/// Body of the pickup confirmation message.
#[must_use]
pub fn pickup_confirmation_text(name: &str, order_id: &OrderId) -> String {
    format!(
        "Hi {name}, your Sudsy laundry pickup for order {order_id} is confirmed. \
         Our rider will reach out before arriving. Thank you for choosing Sudsy!"
    )
}

/// Body of the payment reminder message.
#[must_use]
pub fn payment_reminder_text(name: &str, order_id: &OrderId) -> String {
    format!(
        "Hi {name}, we could not confirm payment for your Sudsy order {order_id}. \
         Please complete your payment from the app so we can schedule your pickup."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_address_customer_and_order() {
        let order_id = OrderId::new("o1");

        let confirmation = pickup_confirmation_text("Ada", &order_id);
        assert!(confirmation.starts_with("Hi Ada,"));
        assert!(confirmation.contains("order o1"));

        let reminder = payment_reminder_text("Ada", &order_id);
        assert!(reminder.starts_with("Hi Ada,"));
        assert!(reminder.contains("order o1"));
        assert_ne!(confirmation, reminder);
    }
}
