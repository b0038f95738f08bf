//! Notifier used when no messaging provider is configured.

use async_trait::async_trait;
use tracing::info;

use sudsy_core::OrderId;

use super::{Notifier, NotifyError, payment_reminder_text, pickup_confirmation_text};

/// Writes each message to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_pickup_confirmation(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        info!(
            %phone,
            %order_id,
            body = %pickup_confirmation_text(name, order_id),
            "WhatsApp not configured; pickup confirmation not sent"
        );
        Ok(())
    }

    async fn send_payment_reminder(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        info!(
            %phone,
            %order_id,
            body = %payment_reminder_text(name, order_id),
            "WhatsApp not configured; payment reminder not sent"
        );
        Ok(())
    }
}
