//! Customer booking, receipts, and checkout over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use chrono::{Days, Utc};
use serde_json::{Value, json};

use sudsy_core::{Kobo, OrderId, PricingUnit};
use sudsy_integration_tests::TestApp;
use sudsy_web::db::CatalogStore;
use sudsy_web::models::Service;
use sudsy_web::services::notifications::NotificationKind;
use sudsy_web::services::payments::{PaymentVerification, VerificationStatus};

async fn seed_catalog(app: &TestApp) -> (Service, Service) {
    let wash = app
        .store
        .upsert_service(
            "Wash & Fold",
            "Priced by weight",
            PricingUnit::PerKg,
            Kobo::from_naira(1_500),
        )
        .await
        .unwrap();
    let iron = app
        .store
        .upsert_service(
            "Ironing Only",
            "Pressing",
            PricingUnit::PerItem,
            Kobo::from_naira(300),
        )
        .await
        .unwrap();
    (wash, iron)
}

fn booking(wash: &Service, iron: &Service) -> Value {
    let tomorrow = Utc::now().date_naive().checked_add_days(Days::new(1)).unwrap();
    json!({
        "items": [
            { "service_id": wash.id, "weight_kg": "2.5" },
            { "service_id": iron.id, "quantity": 4 }
        ],
        "delivery_type": "pickup",
        "pickup_date": tomorrow,
        "pickup_address": "12 Admiralty Way, Lekki, Lagos"
    })
}

#[tokio::test]
async fn test_book_then_read_receipt() {
    let app = TestApp::new();
    let (wash, iron) = seed_catalog(&app).await;
    let (_, cookie) = app.register_customer("Ada", "ada@example.com").await;

    let response = app
        .post("/api/orders", &booking(&wash, &iron), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    // 1,500 * 2.5 + 300 * 4 = 4,950 naira
    let order = &response.data()["order"];
    assert_eq!(order["total_amount"], json!(495_000));
    assert_eq!(order["final_amount"], json!(495_000));
    assert_eq!(order["status"], json!("pending"));
    let order_id = order["id"].as_str().unwrap().to_string();

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::PickupConfirmation);
    assert_eq!(sent[0].order_id, OrderId::new(order_id.as_str()));

    let receipt = app
        .get(&format!("/api/orders/{order_id}/receipt"), Some(&cookie))
        .await;
    assert_eq!(receipt.status, StatusCode::OK);
    let data = receipt.data();
    assert_eq!(data["lines"].as_array().unwrap().len(), 2);
    let total = data["total_amount"].as_i64().unwrap();
    let discount = data["discount_amount"].as_i64().unwrap();
    assert_eq!(data["final_amount"].as_i64().unwrap(), total - discount);
    assert_eq!(data["display"]["total"], json!("₦4,950.00"));

    let history = app.get("/api/orders", Some(&cookie)).await;
    assert_eq!(history.data().as_array().unwrap().len(), 1);

    let account = app.get("/api/account", Some(&cookie)).await;
    assert_eq!(account.data()["total_orders"], json!(1));
}

#[tokio::test]
async fn test_receipt_is_only_for_the_owner() {
    let app = TestApp::new();
    let (wash, iron) = seed_catalog(&app).await;
    let (_, ada) = app.register_customer("Ada", "ada@example.com").await;
    let (_, bayo) = app.register_customer("Bayo", "bayo@example.com").await;

    let booked = app.post("/api/orders", &booking(&wash, &iron), Some(&ada)).await;
    let order_id = booked.data()["order"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/orders/{order_id}/receipt");

    let response = app.get(&uri, Some(&bayo)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, json!({ "success": false, "message": "Access denied" }));

    let response = app.get(&uri, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.get("/api/orders/nope/receipt", Some(&ada)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_bookings_are_rejected() {
    let app = TestApp::new();
    let (wash, iron) = seed_catalog(&app).await;
    let (_, cookie) = app.register_customer("Ada", "ada@example.com").await;
    let writes_before = app.store.write_count();

    let mut request = booking(&wash, &iron);
    request["items"][0]["weight_kg"] = json!("0");
    let response = app.post("/api/orders", &request, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("per kg"));

    let mut request = booking(&wash, &iron);
    request["items"][0]["weight_kg"] = json!("1000000");
    let response = app.post("/api/orders", &request, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("at most"));

    let mut request = booking(&wash, &iron);
    request["delivery_type"] = json!("delivery");
    let response = app.post("/api/orders", &request, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/orders", &json!({ "items": "nope" }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], json!(false));

    assert_eq!(app.store.write_count(), writes_before);
}

#[tokio::test]
async fn test_pay_initializes_checkout_for_final_amount() {
    let app = TestApp::new();
    let (wash, iron) = seed_catalog(&app).await;
    let (_, ada) = app.register_customer("Ada", "ada@example.com").await;
    let (_, bayo) = app.register_customer("Bayo", "bayo@example.com").await;

    let booked = app.post("/api/orders", &booking(&wash, &iron), Some(&ada)).await;
    let order_id = booked.data()["order"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/orders/{order_id}/pay");

    let response = app.post(&uri, &json!({}), Some(&bayo)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.payments.charges().is_empty());

    let response = app.post(&uri, &json!({}), Some(&ada)).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let reference = response.data()["reference"].as_str().unwrap().to_string();
    assert!(
        response.data()["authorization_url"]
            .as_str()
            .unwrap()
            .ends_with(&reference)
    );

    let charges = app.payments.charges();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].amount, Kobo::new(495_000));
    assert_eq!(charges[0].email.as_str(), "ada@example.com");
    assert_eq!(charges[0].callback_url, "http://localhost:3000/payment/callback");
    assert_eq!(charges[0].metadata.order_id, OrderId::new(order_id.as_str()));

    let stored = app.order(&order_id).await;
    assert_eq!(stored.payment_reference.as_deref(), Some(reference.as_str()));
}

#[tokio::test]
async fn test_verify_is_read_only() {
    let app = TestApp::new();
    let (wash, iron) = seed_catalog(&app).await;
    let (_, ada) = app.register_customer("Ada", "ada@example.com").await;
    let booked = app.post("/api/orders", &booking(&wash, &iron), Some(&ada)).await;
    let order_id = booked.data()["order"]["id"].as_str().unwrap().to_string();

    app.payments.set_verification(PaymentVerification {
        status: VerificationStatus::Success,
        reference: "ref-1".to_string(),
        amount: Kobo::new(495_000),
        order_id: Some(OrderId::new(order_id.as_str())),
    });
    let writes_before = app.store.write_count();

    let response = app.get("/api/payments/verify/ref-1", Some(&ada)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], json!("success"));
    assert_eq!(app.store.write_count(), writes_before);

    let response = app.get("/api/payments/verify/unknown", Some(&ada)).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_verify_requires_an_owned_order() {
    let app = TestApp::new();
    let (wash, iron) = seed_catalog(&app).await;
    let (_, ada) = app.register_customer("Ada", "ada@example.com").await;
    let (_, bayo) = app.register_customer("Bayo", "bayo@example.com").await;
    let booked = app.post("/api/orders", &booking(&wash, &iron), Some(&ada)).await;
    let order_id = booked.data()["order"]["id"].as_str().unwrap().to_string();

    let verification = |reference: &str, order_id: Option<&str>| PaymentVerification {
        status: VerificationStatus::Success,
        reference: reference.to_string(),
        amount: Kobo::new(495_000),
        order_id: order_id.map(OrderId::new),
    };
    app.payments
        .set_verification(verification("ref-owned", Some(order_id.as_str())));
    app.payments.set_verification(verification("ref-bare", None));
    app.payments
        .set_verification(verification("ref-gone", Some("deleted-order")));

    let response = app.get("/api/payments/verify/ref-owned", Some(&bayo)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.get("data").is_none());

    for reference in ["ref-bare", "ref-gone"] {
        let response = app
            .get(&format!("/api/payments/verify/{reference}"), Some(&ada))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{reference}");
        assert_eq!(response.message(), "Access denied");
    }

    let response = app.get("/api/payments/verify/ref-owned", Some(&ada)).await;
    assert_eq!(response.status, StatusCode::OK);
}
