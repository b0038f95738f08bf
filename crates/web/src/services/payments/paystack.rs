//! Paystack REST API client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use sudsy_core::{Kobo, OrderId};

use super::{
    ChargeRequest, InitializedPayment, PaymentError, PaymentGateway, PaymentMetadata,
    PaymentVerification, VerificationStatus,
};
use crate::config::PaystackConfig;

/// Paystack API client.
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: SecretString,
}

impl std::fmt::Debug for PaystackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    callback_url: &'a str,
    metadata: &'a PaymentMetadata,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    status: String,
    reference: String,
    amount: i64,
    /// An object when set at initialization, otherwise an empty string.
    #[serde(default)]
    metadata: serde_json::Value,
}

impl From<TransactionData> for PaymentVerification {
    fn from(data: TransactionData) -> Self {
        let order_id = data
            .metadata
            .get("orderId")
            .and_then(serde_json::Value::as_str)
            .map(OrderId::new);

        Self {
            status: VerificationStatus::from_gateway(&data.status),
            reference: data.reference,
            amount: Kobo::new(data.amount),
            order_id,
        }
    }
}

impl PaystackClient {
    /// Create a new Paystack client.
    #[must_use]
    pub fn new(config: &PaystackConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(PaymentError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }
            Err(e) => return Err(PaymentError::Parse(e.to_string())),
        };

        if !status.is_success() || !envelope.status {
            error!(status = status.as_u16(), message = %envelope.message, "Paystack API error");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: envelope.message,
            });
        }

        envelope
            .data
            .ok_or_else(|| PaymentError::Parse("response has no data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[instrument(skip(self, charge), fields(reference = %charge.reference))]
    async fn initialize(
        &self,
        charge: &ChargeRequest,
    ) -> Result<InitializedPayment, PaymentError> {
        let body = InitializeBody {
            email: charge.email.as_str(),
            amount: charge.amount.as_i64(),
            reference: &charge.reference,
            callback_url: &charge.callback_url,
            metadata: &charge.metadata,
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let payment: InitializedPayment = Self::read_envelope(response).await?;
        debug!(authorization_url = %payment.authorization_url, "Transaction initialized");
        Ok(payment)
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| PaymentError::Parse(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| PaymentError::Parse("base URL cannot have a path".to_string()))?
            .extend(["transaction", "verify", reference]);

        let response = self
            .client
            .get(url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let data: TransactionData = Self::read_envelope(response).await?;
        Ok(data.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_data_with_metadata() {
        let data: TransactionData = serde_json::from_value(serde_json::json!({
            "status": "success",
            "reference": "SUD-ABC234-XYZ23456",
            "amount": 450_000,
            "metadata": { "orderId": "o1", "customerPhone": "+2348000000000" }
        }))
        .unwrap();

        let verification = PaymentVerification::from(data);
        assert_eq!(verification.status, VerificationStatus::Success);
        assert_eq!(verification.amount, Kobo::new(450_000));
        assert_eq!(verification.order_id, Some(OrderId::new("o1")));
    }

    #[test]
    fn test_transaction_data_without_metadata() {
        let data: TransactionData = serde_json::from_value(serde_json::json!({
            "status": "abandoned",
            "reference": "ref",
            "amount": 100,
            "metadata": ""
        }))
        .unwrap();

        let verification = PaymentVerification::from(data);
        assert_eq!(verification.status, VerificationStatus::Abandoned);
        assert_eq!(verification.order_id, None);
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<TransactionData> = serde_json::from_value(serde_json::json!({
            "status": false,
            "message": "Transaction reference not found"
        }))
        .unwrap();
        assert!(!envelope.status);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let client = PaystackClient::new(&PaystackConfig {
            base_url: "https://api.paystack.co/".to_string(),
            secret_key: SecretString::from("sk_test_abc123"),
        });
        let debug = format!("{client:?}");
        assert!(debug.contains("https://api.paystack.co\""));
        assert!(!debug.contains("sk_test_abc123"));
    }
}
