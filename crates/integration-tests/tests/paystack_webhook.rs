//! Paystack webhook receiver over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use sudsy_core::{Kobo, OrderId, OrderStatus, PaymentStatus, UserId};
use sudsy_integration_tests::TestApp;
use sudsy_web::services::notifications::NotificationKind;

fn event(kind: &str, order_id: &str) -> Vec<u8> {
    json!({
        "event": kind,
        "data": {
            "reference": "abc123",
            "metadata": {
                "orderId": order_id,
                "customerPhone": "+2348000000000",
                "customerName": "Ada"
            }
        }
    })
    .to_string()
    .into_bytes()
}

async fn app_with_o1() -> TestApp {
    let app = TestApp::new();
    app.insert_order("o1", &UserId::new("u1"), "Ada", Kobo::new(520_000))
        .await;
    app
}

#[tokio::test]
async fn test_charge_success_confirms_order_and_notifies() {
    let app = app_with_o1().await;
    let body = event("charge.success", "o1");

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "status": "success" }));

    let order = app.order("o1").await;
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment_reference.as_deref(), Some("abc123"));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::PickupConfirmation);
    assert_eq!(sent[0].phone, "+2348000000000");
    assert_eq!(sent[0].name, "Ada");
    assert_eq!(sent[0].order_id, OrderId::new("o1"));
}

#[tokio::test]
async fn test_charge_failed_marks_payment_and_reminds() {
    let app = app_with_o1().await;
    let body = event("charge.failed", "o1");

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::OK);
    let order = app.order("o1").await;
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(app.notifier.sent()[0].kind, NotificationKind::PaymentReminder);
}

#[tokio::test]
async fn test_bad_signature_is_rejected_without_writes() {
    let app = app_with_o1().await;
    let body = event("charge.success", "o1");
    let writes_before = app.store.write_count();

    let forged = app.sign(b"some other body");
    let response = app.post_webhook(&body, Some(&forged)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Hex comparison is case-sensitive
    let shouted = app.sign(&body).to_uppercase();
    let response = app.post_webhook(&body, Some(&shouted)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.post_webhook(&body, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], json!(false));

    assert_eq!(app.store.write_count(), writes_before);
    assert!(app.notifier.sent().is_empty());
    assert_eq!(app.order("o1").await.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_unparseable_body_is_a_server_error() {
    let app = app_with_o1().await;
    let body = b"{ not json".to_vec();

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_replay_reapplies_writes_and_notifies_again() {
    let app = app_with_o1().await;
    let body = event("charge.success", "o1");
    let signature = app.sign(&body);

    for _ in 0..2 {
        let response = app.post_webhook(&body, Some(&signature)).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let order = app.order("o1").await;
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(app.notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_processing_failures_are_still_acknowledged() {
    let app = TestApp::new();
    let body = event("charge.success", "missing-order");

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "status": "success" }));
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_notification_failure_keeps_payment_written() {
    let app = app_with_o1().await;
    app.notifier.set_failing(true);
    let body = event("charge.success", "o1");

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.order("o1").await.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_other_events_are_acknowledged_and_ignored() {
    let app = app_with_o1().await;
    let writes_before = app.store.write_count();
    let body = event("subscription.create", "o1");

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.store.write_count(), writes_before);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_success_without_customer_name_still_confirms() {
    let app = app_with_o1().await;
    let body = json!({
        "event": "charge.success",
        "data": {
            "reference": "abc123",
            "metadata": { "orderId": "o1", "customerPhone": "+2348000000000" }
        }
    })
    .to_string()
    .into_bytes();

    let response = app.post_webhook(&body, Some(&app.sign(&body))).await;

    assert_eq!(response.status, StatusCode::OK);
    let order = app.order("o1").await;
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone, "+2348000000000");
    assert_eq!(sent[0].name, "Ada");
}
