//! Online payments through Paystack.
//!
//! # Flow
//!
//! 1. [`start_checkout`] initializes a transaction for an order's final
//!    amount and stores the generated reference on the order.
//! 2. The customer pays on the gateway's hosted page and is sent back to
//!    `<base_url>/payment/callback?reference=...`.
//! 3. The gateway posts a signed webhook (see [`signature`] and
//!    [`crate::services::webhook`]); that webhook is the only thing that
//!    writes payment status.
//! 4. The client may call [`PaymentGateway::verify`] to show the outcome.
//!    Verification is read-only.

#[cfg(any(test, feature = "test-utils"))]
mod fake;
mod paystack;
pub mod signature;

#[cfg(any(test, feature = "test-utils"))]
pub use fake::FakePaymentGateway;
pub use paystack::PaystackClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use sudsy_core::{Email, Kobo, OrderId};

use crate::db::{RepositoryError, Store};
use crate::models::Order;
use crate::models::order::generate_payment_reference;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a gateway response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The order cannot be paid for.
    #[error("order not payable: {0}")]
    NotPayable(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Metadata attached to a transaction and echoed back in webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    pub order_id: OrderId,
    pub customer_phone: String,
    pub customer_name: String,
}

/// A transaction to initialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub email: Email,
    pub amount: Kobo,
    pub reference: String,
    pub callback_url: String,
    pub metadata: PaymentMetadata,
}

/// An initialized transaction awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedPayment {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Outcome of a transaction as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Success,
    Failed,
    Abandoned,
    Pending,
}

impl VerificationStatus {
    /// Map a gateway transaction status onto the four outcomes clients show.
    #[must_use]
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "success" => Self::Success,
            "failed" | "reversed" => Self::Failed,
            "abandoned" => Self::Abandoned,
            _ => Self::Pending,
        }
    }
}

/// Result of looking up a transaction by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub status: VerificationStatus,
    pub reference: String,
    pub amount: Kobo,
    pub order_id: Option<OrderId>,
}

/// Payment gateway charge/verify API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize a transaction and return where to send the customer.
    async fn initialize(&self, charge: &ChargeRequest)
    -> Result<InitializedPayment, PaymentError>;

    /// Look up a transaction by reference.
    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError>;
}

/// Start paying for an order.
///
/// Generates a fresh reference, initializes the transaction for the order's
/// final amount, and records the reference on the order.
///
/// # Errors
///
/// Returns `PaymentError::NotPayable` if the order is paid, cancelled, or
/// free. Returns gateway or repository errors otherwise.
#[instrument(skip(store, gateway, order, email), fields(order_id = %order.id))]
pub async fn start_checkout(
    store: &dyn Store,
    gateway: &dyn PaymentGateway,
    order: &Order,
    email: &Email,
    callback_url: &str,
) -> Result<InitializedPayment, PaymentError> {
    if !order.is_payable() {
        return Err(PaymentError::NotPayable(format!(
            "order {} is {} with payment {}",
            order.order_number, order.status, order.payment_status
        )));
    }

    let charge = ChargeRequest {
        email: email.clone(),
        amount: order.amounts.final_amount(),
        reference: generate_payment_reference(&order.order_number),
        callback_url: callback_url.to_string(),
        metadata: PaymentMetadata {
            order_id: order.id.clone(),
            customer_phone: order.customer_phone.to_string(),
            customer_name: order.customer_name.clone(),
        },
    };

    let payment = gateway.initialize(&charge).await?;
    store
        .set_payment_reference(&order.id, &payment.reference)
        .await?;

    info!(reference = %payment.reference, amount = %charge.amount, "Payment initialized");
    Ok(payment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_status_mapping() {
        assert_eq!(
            VerificationStatus::from_gateway("success"),
            VerificationStatus::Success
        );
        assert_eq!(
            VerificationStatus::from_gateway("reversed"),
            VerificationStatus::Failed
        );
        assert_eq!(
            VerificationStatus::from_gateway("abandoned"),
            VerificationStatus::Abandoned
        );
        assert_eq!(
            VerificationStatus::from_gateway("ongoing"),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn test_metadata_uses_gateway_field_names() {
        let metadata = PaymentMetadata {
            order_id: OrderId::new("o1"),
            customer_phone: "+2348000000000".to_string(),
            customer_name: "Ada".to_string(),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "orderId": "o1",
                "customerPhone": "+2348000000000",
                "customerName": "Ada"
            })
        );
    }
}
