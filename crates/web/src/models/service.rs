//! Service catalog entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sudsy_core::{Kobo, PricingUnit, ServiceId};

/// A bookable laundry service, e.g. "Wash & Fold" priced per kilogram.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub pricing_unit: PricingUnit,
    /// Price per item or per kilogram, depending on `pricing_unit`.
    pub unit_price: Kobo,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
