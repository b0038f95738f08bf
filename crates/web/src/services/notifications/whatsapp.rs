//! WhatsApp Cloud API client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use sudsy_core::OrderId;

use super::{Notifier, NotifyError, payment_reminder_text, pickup_confirmation_text};
use crate::config::WhatsAppConfig;

/// Graph API base URL.
const GRAPH_API_BASE: &str = "https://graph.facebook.com";

/// Sends text messages through a WhatsApp Business phone number.
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    messages_url: String,
    access_token: SecretString,
}

impl std::fmt::Debug for WhatsAppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppClient")
            .field("messages_url", &self.messages_url)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    preview_url: bool,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

impl WhatsAppClient {
    /// Create a client for the configured phone number.
    #[must_use]
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            client: Client::new(),
            messages_url: format!(
                "{GRAPH_API_BASE}/{}/{}/messages",
                config.api_version, config.phone_number_id
            ),
            access_token: config.access_token.clone(),
        }
    }

    /// Send a plain text message.
    ///
    /// # Errors
    ///
    /// Returns error if the number has no digits, the request fails, or the
    /// Graph API rejects the message.
    #[instrument(skip(self, body))]
    pub async fn send_text(&self, phone: &str, body: &str) -> Result<(), NotifyError> {
        let to = recipient_digits(phone)?;
        let message = TextMessage {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &to,
            kind: "text",
            text: TextBody {
                preview_url: false,
                body,
            },
        };

        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&message)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map_or(text, |envelope| envelope.error.message);
            error!(status = status.as_u16(), %message, "WhatsApp API error");
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("WhatsApp message sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WhatsAppClient {
    async fn send_pickup_confirmation(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        self.send_text(phone, &pickup_confirmation_text(name, order_id))
            .await
    }

    async fn send_payment_reminder(
        &self,
        phone: &str,
        name: &str,
        order_id: &OrderId,
    ) -> Result<(), NotifyError> {
        self.send_text(phone, &payment_reminder_text(name, order_id))
            .await
    }
}

/// The Cloud API wants the international number as bare digits.
fn recipient_digits(phone: &str) -> Result<String, NotifyError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(NotifyError::InvalidRecipient(phone.to_string()));
    }
    Ok(digits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_digits() {
        assert_eq!(recipient_digits("+2348000000000").unwrap(), "2348000000000");
        assert_eq!(recipient_digits("+234 800 000 0000").unwrap(), "2348000000000");
        assert!(matches!(
            recipient_digits("n/a"),
            Err(NotifyError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn test_text_message_shape() {
        let message = TextMessage {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: "2348000000000",
            kind: "text",
            text: TextBody {
                preview_url: false,
                body: "hello",
            },
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["messaging_product"], "whatsapp");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["body"], "hello");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = WhatsAppClient::new(&WhatsAppConfig {
            api_version: "v21.0".to_string(),
            phone_number_id: "1234567890".to_string(),
            access_token: SecretString::from("EAAG-secret-token"),
        });
        let debug = format!("{client:?}");
        assert!(debug.contains("graph.facebook.com/v21.0/1234567890/messages"));
        assert!(!debug.contains("EAAG-secret-token"));
    }
}
