//! Seed the service catalog.
//!
//! Services are matched by name, so re-running the seed refreshes prices and
//! descriptions without duplicating entries.

use sudsy_core::{Kobo, PricingUnit};
use sudsy_web::db::{CatalogStore, PgStore};

use super::connect;

/// A catalog entry to seed.
#[derive(Debug, Clone, Copy)]
pub struct SeedService {
    pub name: &'static str,
    pub description: &'static str,
    pub pricing_unit: PricingUnit,
    pub unit_price: Kobo,
}

/// The default catalog.
pub const DEFAULT_SERVICES: &[SeedService] = &[
    SeedService {
        name: "Wash & Fold",
        description: "Washed, dried, and neatly folded. Priced by weight.",
        pricing_unit: PricingUnit::PerKg,
        unit_price: Kobo::from_naira(1_500),
    },
    SeedService {
        name: "Wash & Iron",
        description: "Washed, dried, and pressed. Priced by weight.",
        pricing_unit: PricingUnit::PerKg,
        unit_price: Kobo::from_naira(2_200),
    },
    SeedService {
        name: "Ironing Only",
        description: "Pressing for clean garments.",
        pricing_unit: PricingUnit::PerItem,
        unit_price: Kobo::from_naira(300),
    },
    SeedService {
        name: "Dry Cleaning",
        description: "Suits, dresses, and delicate fabrics.",
        pricing_unit: PricingUnit::PerItem,
        unit_price: Kobo::from_naira(2_500),
    },
    SeedService {
        name: "Duvet & Bedding",
        description: "Duvets, blankets, and bedspreads.",
        pricing_unit: PricingUnit::PerItem,
        unit_price: Kobo::from_naira(4_000),
    },
];

/// Insert or refresh the default services.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an upsert fails.
pub async fn services() -> Result<(), Box<dyn std::error::Error>> {
    let store = PgStore::new(connect().await?);

    for service in DEFAULT_SERVICES {
        let saved = store
            .upsert_service(
                service.name,
                service.description,
                service.pricing_unit,
                service.unit_price,
            )
            .await?;
        tracing::info!(id = %saved.id, name = %saved.name, price = %saved.unit_price, "Service seeded");
    }

    tracing::info!("Seeded {} services", DEFAULT_SERVICES.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_services_have_unique_names_and_prices() {
        let mut names: Vec<&str> = DEFAULT_SERVICES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_SERVICES.len());
        assert!(DEFAULT_SERVICES.iter().all(|s| s.unit_price > Kobo::ZERO));
    }
}
