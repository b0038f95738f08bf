//! Integration tests for Sudsy.
//!
//! Every test drives the real axum router in-process with
//! `tower::ServiceExt::oneshot`. Collaborators are the in-memory doubles
//! from `sudsy-web`'s `test-utils` feature, so no database, Paystack, or
//! WhatsApp account is needed:
//!
//! ```bash
//! cargo test -p sudsy-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use sudsy_core::{
    AdminRole, DeliveryType, Email, Kobo, OrderAmounts, OrderId, OrderStatus, PaymentStatus,
    PhoneNumber, UserId,
};
use sudsy_web::config::{PaystackConfig, WebConfig};
use sudsy_web::db::{AdminStore, MemoryStore, OrderStore};
use sudsy_web::models::{AdminUser, NewAdminUser, Order};
use sudsy_web::services::auth::hash_password;
use sudsy_web::services::notifications::RecordingNotifier;
use sudsy_web::services::payments::FakePaymentGateway;
use sudsy_web::services::payments::signature::{SIGNATURE_HEADER, sign};
use sudsy_web::{AppState, app};

/// Paystack secret used to sign test webhooks.
pub const PAYSTACK_SECRET: &str = "sk_test_4f9c2a7e1b8d6035c9e2f1a7b4d8e6c0";

/// Password given to every account the harness creates.
pub const PASSWORD: &str = "correct-horse-battery";

/// Server configuration for tests. Nothing in it is dialled.
#[must_use]
pub fn test_config() -> WebConfig {
    WebConfig {
        database_url: SecretString::from("postgres://unused@localhost/sudsy_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("t".repeat(64)),
        paystack: PaystackConfig {
            base_url: "https://api.paystack.test".to_string(),
            secret_key: SecretString::from(PAYSTACK_SECRET),
        },
        whatsapp: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// `name=value` of the session cookie, if one was set.
    pub cookie: Option<String>,
    pub request_id: Option<String>,
    /// JSON body, or the body text as a JSON string.
    pub body: Value,
}

impl TestResponse {
    /// The envelope's `message`.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// The envelope's `data`.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// The application wired to in-memory collaborators.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub payments: Arc<FakePaymentGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let payments = Arc::new(FakePaymentGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let state = AppState::with_services(
            test_config(),
            store.clone(),
            payments.clone(),
            notifier.clone(),
        );
        let router = app(state, tower_sessions::MemoryStore::default());

        Self {
            router,
            store,
            payments,
            notifier,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            cookie,
            request_id,
            body,
        }
    }

    /// Send a request with an optional JSON body and session cookie.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request is well formed");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.call(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.call(Method::POST, uri, Some(body), cookie).await
    }

    /// Deliver a webhook body with the given signature header.
    pub async fn post_webhook(&self, body: &[u8], signature: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/paystack")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        let request = builder
            .body(Body::from(body.to_vec()))
            .expect("request is well formed");
        self.send(request).await
    }

    /// Sign `body` the way Paystack does.
    #[must_use]
    pub fn sign(&self, body: &[u8]) -> String {
        sign(&SecretString::from(PAYSTACK_SECRET), body).expect("HMAC accepts any key")
    }

    /// Register a customer through the API; returns their ID and cookie.
    pub async fn register_customer(&self, name: &str, email: &str) -> (UserId, String) {
        let response = self
            .post(
                "/api/auth/register",
                &serde_json::json!({
                    "name": name,
                    "email": email,
                    "phone": "+2348000000000",
                    "password": PASSWORD,
                }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

        let id = response.data()["id"]
            .as_str()
            .expect("registered user has an id");
        let cookie = response.cookie.clone().expect("login sets a cookie");
        (UserId::new(id), cookie)
    }

    /// Create an admin directly in the store.
    pub async fn create_admin(&self, email: &str, role: AdminRole) -> AdminUser {
        self.store
            .create_admin(NewAdminUser {
                email: Email::parse(email).expect("valid email"),
                name: "Ops".to_string(),
                role,
                password_hash: hash_password(PASSWORD).expect("hashable password"),
            })
            .await
            .expect("admin is created")
    }

    /// Log an admin in; returns the session cookie.
    pub async fn login_admin(&self, email: &str) -> String {
        let response = self
            .post(
                "/api/admin/login",
                &serde_json::json!({ "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.cookie.expect("login sets a cookie")
    }

    /// Insert an unpaid order directly in the store.
    pub async fn insert_order(
        &self,
        id: &str,
        customer_id: &UserId,
        customer_name: &str,
        total: Kobo,
    ) -> Order {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(id),
            order_number: format!("SUD-{}", id.to_uppercase()),
            customer_id: customer_id.clone(),
            customer_name: customer_name.to_string(),
            customer_phone: PhoneNumber::parse("+2348000000000").expect("valid phone"),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            amounts: OrderAmounts::new(total, Kobo::ZERO).expect("non-negative total"),
            delivery_type: DeliveryType::Pickup,
            pickup_date: now.date_naive(),
            pickup_address: "12 Admiralty Way, Lekki, Lagos".to_string(),
            delivery_address: None,
            notes: None,
            assigned_admin_id: None,
            created_at: now,
            updated_at: now,
        };
        self.store
            .create_order(&order, &[])
            .await
            .expect("order is stored");
        order
    }

    /// Read an order back from the store.
    pub async fn order(&self, id: &str) -> Order {
        self.store
            .get_order(&OrderId::new(id))
            .await
            .expect("store is readable")
            .expect("order exists")
    }
}
