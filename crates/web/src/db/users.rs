//! Customer collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use sudsy_core::{Email, PhoneNumber, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::{Address, NewUser, User};

/// Customer persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a customer.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError>;

    /// Get a customer by ID.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a customer and their password hash by email.
    async fn get_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Update name and/or phone.
    async fn update_profile(
        &self,
        id: &UserId,
        name: Option<&str>,
        phone: Option<&PhoneNumber>,
    ) -> Result<User, RepositoryError>;

    /// Replace the saved address list.
    async fn set_addresses(
        &self,
        id: &UserId,
        addresses: &[Address],
    ) -> Result<User, RepositoryError>;

    /// Count a new booking and debit redeemed loyalty points.
    ///
    /// Returns `RepositoryError::Conflict` if the balance is too low.
    async fn record_booking(
        &self,
        id: &UserId,
        points_redeemed: i64,
    ) -> Result<(), RepositoryError>;

    /// Credit loyalty points.
    async fn credit_loyalty_points(&self, id: &UserId, points: i64)
    -> Result<(), RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

const USER_COLUMNS: &str = "id, name, email, phone, addresses, total_orders, loyalty_points, \
                            created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    phone: String,
    addresses: Json<Vec<Address>>,
    total_orders: i32,
    loyalty_points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let phone = PhoneNumber::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            phone,
            addresses: row.addresses.0,
            total_orders: row.total_orders,
            loyalty_points: row.loyalty_points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserCredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// PostgreSQL
// =============================================================================

impl PgStore {
    async fn fetch_user(&self, id: &UserId) -> Result<User, RepositoryError> {
        self.get_user(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO sudsy.user (id, name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(UserId::generate())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM sudsy.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserCredentialsRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM sudsy.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn update_profile(
        &self,
        id: &UserId,
        name: Option<&str>,
        phone: Option<&PhoneNumber>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE sudsy.user
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(phone)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn set_addresses(
        &self,
        id: &UserId,
        addresses: &[Address],
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE sudsy.user
            SET addresses = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(Json(addresses))
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn record_booking(
        &self,
        id: &UserId,
        points_redeemed: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE sudsy.user
            SET total_orders = total_orders + 1,
                loyalty_points = loyalty_points - $2,
                updated_at = NOW()
            WHERE id = $1 AND loyalty_points >= $2
            ",
        )
        .bind(id)
        .bind(points_redeemed)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing user from an insufficient balance
            self.fetch_user(id).await?;
            return Err(RepositoryError::Conflict(
                "insufficient loyalty points".to_string(),
            ));
        }
        Ok(())
    }

    async fn credit_loyalty_points(
        &self,
        id: &UserId,
        points: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE sudsy.user
            SET loyalty_points = loyalty_points + $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(points)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
