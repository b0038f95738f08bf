//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::WebConfig;
use crate::db::Store;
use crate::services::notifications::{LoggingNotifier, Notifier, WhatsAppClient};
use crate::services::payments::{PaymentGateway, PaystackClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store, payment gateway, and notifier are
/// trait objects so tests can swap in in-memory versions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    store: Arc<dyn Store>,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Build production state: Paystack for payments, WhatsApp for
    /// notifications (or the logging notifier when WhatsApp is not
    /// configured).
    #[must_use]
    pub fn new(config: WebConfig, store: Arc<dyn Store>) -> Self {
        let payments: Arc<dyn PaymentGateway> = Arc::new(PaystackClient::new(&config.paystack));
        let notifier: Arc<dyn Notifier> = match &config.whatsapp {
            Some(whatsapp) => Arc::new(WhatsAppClient::new(whatsapp)),
            None => {
                tracing::warn!("WhatsApp not configured; notifications will only be logged");
                Arc::new(LoggingNotifier)
            }
        };

        Self::with_services(config, store, payments, notifier)
    }

    /// Build state from explicit collaborators.
    #[must_use]
    pub fn with_services(
        config: WebConfig,
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                payments,
                notifier,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get the document store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get the payment gateway.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    /// Get the customer notifier.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }
}
