//! Admin user collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sudsy_core::{AdminUserId, Email};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::admin_user::{AdminRole, AdminUser, NewAdminUser};

/// Admin user persistence.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Create an admin user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create_admin(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError>;

    /// Get an admin user by ID.
    async fn get_admin(&self, id: &AdminUserId) -> Result<Option<AdminUser>, RepositoryError>;

    /// Get an admin user and their password hash by email.
    async fn get_admin_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError>;

    /// Stamp a successful login.
    async fn record_admin_login(
        &self,
        id: &AdminUserId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

const ADMIN_COLUMNS: &str = "id, email, name, role, is_active, last_login_at, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    email: String,
    name: String,
    role: AdminRole,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            role: row.role,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminCredentialsRow {
    #[sqlx(flatten)]
    admin: AdminUserRow,
    password_hash: String,
}

// =============================================================================
// PostgreSQL
// =============================================================================

#[async_trait]
impl AdminStore for PgStore {
    async fn create_admin(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let row: AdminUserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO sudsy.admin_user (id, email, name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(AdminUserId::generate())
        .bind(&new.email)
        .bind(&new.name)
        .bind(new.role)
        .bind(&new.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "admin email"))?;

        row.try_into()
    }

    async fn get_admin(&self, id: &AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row: Option<AdminUserRow> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS} FROM sudsy.admin_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_admin_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row: Option<AdminCredentialsRow> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM sudsy.admin_user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(r) => Ok(Some((AdminUser::try_from(r.admin)?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn record_admin_login(
        &self,
        id: &AdminUserId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE sudsy.admin_user SET last_login_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
