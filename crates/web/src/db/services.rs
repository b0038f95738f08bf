//! Service catalog collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sudsy_core::{Kobo, PricingUnit, ServiceId};

use super::{PgStore, RepositoryError};
use crate::models::Service;

/// Service catalog persistence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List services ordered by name.
    async fn list_services(&self, active_only: bool) -> Result<Vec<Service>, RepositoryError>;

    /// Fetch the given services (missing IDs are simply absent from the result).
    async fn get_services(&self, ids: &[ServiceId]) -> Result<Vec<Service>, RepositoryError>;

    /// Insert or update a service keyed by name.
    async fn upsert_service(
        &self,
        name: &str,
        description: &str,
        pricing_unit: PricingUnit,
        unit_price: Kobo,
    ) -> Result<Service, RepositoryError>;
}

const SERVICE_COLUMNS: &str =
    "id, name, description, pricing_unit, unit_price, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: ServiceId,
    name: String,
    description: String,
    pricing_unit: PricingUnit,
    unit_price: Kobo,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            pricing_unit: row.pricing_unit,
            unit_price: row.unit_price,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_services(&self, active_only: bool) -> Result<Vec<Service>, RepositoryError> {
        let rows: Vec<ServiceRow> = sqlx::query_as(&format!(
            r"
            SELECT {SERVICE_COLUMNS}
            FROM sudsy.service
            WHERE is_active OR NOT $1
            ORDER BY name
            "
        ))
        .bind(active_only)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_services(&self, ids: &[ServiceId]) -> Result<Vec<Service>, RepositoryError> {
        let ids: Vec<&str> = ids.iter().map(ServiceId::as_str).collect();
        let rows: Vec<ServiceRow> = sqlx::query_as(&format!(
            "SELECT {SERVICE_COLUMNS} FROM sudsy.service WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_service(
        &self,
        name: &str,
        description: &str,
        pricing_unit: PricingUnit,
        unit_price: Kobo,
    ) -> Result<Service, RepositoryError> {
        let row: ServiceRow = sqlx::query_as(&format!(
            r"
            INSERT INTO sudsy.service (id, name, description, pricing_unit, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                pricing_unit = EXCLUDED.pricing_unit,
                unit_price = EXCLUDED.unit_price,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING {SERVICE_COLUMNS}
            "
        ))
        .bind(ServiceId::generate())
        .bind(name)
        .bind(description)
        .bind(pricing_unit)
        .bind(unit_price)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }
}
