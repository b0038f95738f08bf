//! Notifier that remembers every call, for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use sudsy_core::OrderId;

use super::{Notifier, NotifyError};

/// Which template was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    PickupConfirmation,
    PaymentReminder,
}

/// One recorded send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub phone: String,
    pub name: String,
    pub order_id: OrderId,
}

/// Records sends instead of delivering them. Can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (nothing is recorded while failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    fn record(
        &self,
        kind: NotificationKind,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Api {
                status: 503,
                message: "messaging unavailable".to_string(),
            });
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(Notification {
                kind,
                phone: phone.to_string(),
                name: name.to_string(),
                order_id: order_id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_pickup_confirmation(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        self.record(NotificationKind::PickupConfirmation, phone, name, order_id)
    }

    async fn send_payment_reminder(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        self.record(NotificationKind::PaymentReminder, phone, name, order_id)
    }
}
