//! Payment webhook event processing.
//!
//! Runs after the signature has been checked. Each event is applied as-is:
//! there is no idempotency check, so a redelivered event repeats its writes
//! and its notification.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use sudsy_core::{OrderId, OrderStatus, PaymentStatus};

use crate::db::{PaymentUpdate, RepositoryError, Store};
use crate::services::notifications::{Notifier, NotifyError};

/// A webhook delivery body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: EventData,
}

/// The `data` object of a webhook event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub reference: Option<String>,
    /// An object when the transaction carried metadata, otherwise any JSON.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// How an event type is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Succeeded,
    Failed,
    Ignored,
}

impl EventOutcome {
    /// Classify an event type string.
    #[must_use]
    pub fn of(event: &str) -> Self {
        match event {
            "charge.success" | "transfer.success" => Self::Succeeded,
            "charge.failed" | "transfer.failed" => Self::Failed,
            _ => Self::Ignored,
        }
    }
}

/// Errors while applying an event. The receiver logs these and still
/// acknowledges the delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Event lacks the metadata needed to find the order.
    #[error("missing metadata field: {0}")]
    MissingMetadata(&'static str),

    /// Store write failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Notification failed after the writes were made.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),
}

impl EventData {
    fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata
            .get(field)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Apply one verified webhook event.
///
/// Only `orderId` is needed to write. The recipient comes from the event
/// metadata when present, otherwise from the stored order.
///
/// # Errors
///
/// Returns `WebhookError` if `orderId` is missing, a write fails, or the
/// notification cannot be sent.
#[instrument(skip(store, notifier, event), fields(event_type = %event.event))]
pub async fn process_event(
    store: &dyn Store,
    notifier: &dyn Notifier,
    event: &WebhookEvent,
) -> Result<EventOutcome, WebhookError> {
    let outcome = EventOutcome::of(&event.event);
    if outcome == EventOutcome::Ignored {
        debug!("Ignoring webhook event");
        return Ok(outcome);
    }

    let data = &event.data;
    let order_id = OrderId::new(
        data.metadata_str("orderId")
            .ok_or(WebhookError::MissingMetadata("orderId"))?,
    );
    let payment_status = if outcome == EventOutcome::Succeeded {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    };

    let mut order = store
        .update_payment(
            &order_id,
            PaymentUpdate {
                payment_status,
                reference: data.reference.clone(),
            },
        )
        .await?;

    if outcome == EventOutcome::Succeeded {
        order = store
            .update_order_status(&order_id, OrderStatus::Confirmed)
            .await?;
        info!(%order_id, order_number = %order.order_number, "Payment received, order confirmed");
    } else {
        warn!(%order_id, "Payment failed");
    }

    let phone = data
        .metadata_str("customerPhone")
        .unwrap_or_else(|| order.customer_phone.as_str());
    let name = data
        .metadata_str("customerName")
        .unwrap_or(&order.customer_name);

    if outcome == EventOutcome::Succeeded {
        notifier
            .send_pickup_confirmation(phone, name, &order_id)
            .await?;
    } else {
        notifier.send_payment_reminder(phone, name, &order_id).await?;
    }

    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use sudsy_core::{DeliveryType, Kobo, OrderAmounts, PhoneNumber, UserId};

    use super::*;
    use crate::db::{MemoryStore, OrderStore};
    use crate::models::Order;
    use crate::services::notifications::{NotificationKind, RecordingNotifier};

    fn order(id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(id),
            order_number: "SUD-ABC234".to_string(),
            customer_id: UserId::new("u1"),
            customer_name: "Ada".to_string(),
            customer_phone: PhoneNumber::parse("+2348000000000").unwrap(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            amounts: OrderAmounts::new(Kobo::new(500_000), Kobo::ZERO).unwrap(),
            delivery_type: DeliveryType::Pickup,
            pickup_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            pickup_address: "1 Admiralty Way, Lekki, Lagos".to_string(),
            delivery_address: None,
            notes: None,
            assigned_admin_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(kind: &str) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "event": kind,
            "data": {
                "reference": "abc123",
                "metadata": {
                    "orderId": "o1",
                    "customerPhone": "+2348000000000",
                    "customerName": "Ada"
                }
            }
        }))
        .unwrap()
    }

    async fn store_with_order() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_order(&order("o1"), &[]).await.unwrap();
        store
    }

    #[test]
    fn test_event_classification() {
        assert_eq!(EventOutcome::of("charge.success"), EventOutcome::Succeeded);
        assert_eq!(EventOutcome::of("transfer.success"), EventOutcome::Succeeded);
        assert_eq!(EventOutcome::of("charge.failed"), EventOutcome::Failed);
        assert_eq!(EventOutcome::of("transfer.failed"), EventOutcome::Failed);
        assert_eq!(EventOutcome::of("subscription.create"), EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_success_confirms_and_notifies() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();

        let outcome = process_event(&store, &notifier, &event("charge.success"))
            .await
            .unwrap();
        assert_eq!(outcome, EventOutcome::Succeeded);

        let order = store.get_order(&OrderId::new("o1")).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_reference.as_deref(), Some("abc123"));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::PickupConfirmation);
        assert_eq!(sent[0].phone, "+2348000000000");
        assert_eq!(sent[0].name, "Ada");
        assert_eq!(sent[0].order_id, OrderId::new("o1"));
    }

    #[tokio::test]
    async fn test_failure_marks_failed_and_reminds() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();

        process_event(&store, &notifier, &event("charge.failed"))
            .await
            .unwrap();

        let order = store.get_order(&OrderId::new("o1")).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(notifier.sent()[0].kind, NotificationKind::PaymentReminder);
    }

    #[tokio::test]
    async fn test_replay_repeats_writes_and_notification() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();
        let writes_before = store.write_count();

        for _ in 0..2 {
            process_event(&store, &notifier, &event("charge.success"))
                .await
                .unwrap();
        }

        assert_eq!(store.write_count() - writes_before, 4);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_event_is_ignored() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();
        let writes_before = store.write_count();

        let outcome = process_event(&store, &notifier, &event("refund.processed"))
            .await
            .unwrap();

        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(store.write_count(), writes_before);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_metadata_writes_nothing() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();
        let writes_before = store.write_count();
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "event": "charge.success",
            "data": { "reference": "abc123", "metadata": "" }
        }))
        .unwrap();

        let err = process_event(&store, &notifier, &event).await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingMetadata("orderId")));
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_partial_metadata_falls_back_to_the_order() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": "abc123",
                "metadata": { "orderId": "o1", "customerPhone": "+2348011112222" }
            }
        }))
        .unwrap();

        process_event(&store, &notifier, &event).await.unwrap();

        let order = store.get_order(&OrderId::new("o1")).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Confirmed);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].phone, "+2348011112222");
        assert_eq!(sent[0].name, "Ada");
    }

    #[tokio::test]
    async fn test_failed_event_without_customer_fields_still_writes() {
        let store = store_with_order().await;
        let notifier = RecordingNotifier::new();
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "event": "charge.failed",
            "data": { "metadata": { "orderId": "o1" } }
        }))
        .unwrap();

        process_event(&store, &notifier, &event).await.unwrap();

        let order = store.get_order(&OrderId::new("o1")).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        let sent = notifier.sent();
        assert_eq!(sent[0].kind, NotificationKind::PaymentReminder);
        assert_eq!(sent[0].phone, "+2348000000000");
        assert_eq!(sent[0].name, "Ada");
    }

    #[tokio::test]
    async fn test_unknown_order_is_an_error() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();

        let err = process_event(&store, &notifier, &event("charge.success"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WebhookError::Repository(RepositoryError::NotFound)
        ));
        assert!(notifier.sent().is_empty());
    }
}
