//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! SUDSY_ADMIN_PASSWORD='...' sudsy admin create -e ops@sudsy.ng -n "Ops Lead" -r super_admin
//! ```

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use sudsy_core::{AdminRole, AdminUserId, Email};
use sudsy_web::db::{AdminStore, PgStore, RepositoryError};
use sudsy_web::models::NewAdminUser;
use sudsy_web::services::auth::{AuthError, hash_password, validate_password};

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, staff")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected or could not be hashed.
    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    /// Insert failed.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create a new admin user.
///
/// Input is validated before connecting to the database.
///
/// # Errors
///
/// Returns an error for an unknown role, a malformed email, a password under
/// the minimum length, or an email that is already registered.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: SecretString,
) -> Result<AdminUserId, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    validate_password(password.expose_secret())?;
    let password_hash = hash_password(password.expose_secret())?;

    let store = PgStore::new(connect().await?);

    tracing::info!("Creating admin user: {} ({})", email, role);
    let admin = store
        .create_admin(NewAdminUser {
            email: email.clone(),
            name: name.trim().to_owned(),
            role,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );
    Ok(admin.id)
}
