//! In-process payment gateway for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ChargeRequest, InitializedPayment, PaymentError, PaymentGateway, PaymentVerification,
};

/// Accepts every charge and answers verifications from a preset table.
#[derive(Debug, Default)]
pub struct FakePaymentGateway {
    charges: Mutex<Vec<ChargeRequest>>,
    verifications: Mutex<HashMap<String, PaymentVerification>>,
}

impl FakePaymentGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset the answer for `verify(verification.reference)`.
    pub fn set_verification(&self, verification: PaymentVerification) {
        if let Ok(mut table) = self.verifications.lock() {
            table.insert(verification.reference.clone(), verification);
        }
    }

    /// Every charge initialized so far.
    #[must_use]
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges
            .lock()
            .map(|charges| charges.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn initialize(
        &self,
        charge: &ChargeRequest,
    ) -> Result<InitializedPayment, PaymentError> {
        if let Ok(mut charges) = self.charges.lock() {
            charges.push(charge.clone());
        }

        Ok(InitializedPayment {
            authorization_url: format!("https://checkout.paystack.test/{}", charge.reference),
            access_code: format!("access_{}", charge.reference),
            reference: charge.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError> {
        self.verifications
            .lock()
            .ok()
            .and_then(|table| table.get(reference).cloned())
            .ok_or_else(|| PaymentError::Api {
                status: 400,
                message: "Transaction reference not found".to_string(),
            })
    }
}
