//! Authentication service.
//!
//! Password authentication for customers and admins. Passwords are hashed
//! with Argon2id; identities are kept in the session by the route layer.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use sudsy_core::{Email, PhoneNumber};

use crate::db::{RepositoryError, Store};
use crate::models::{AdminUser, NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Customer registration input.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'r> {
    pub name: &'r str,
    pub email: &'r str,
    pub phone: &'r str,
    pub password: &'r str,
}

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidPhone`,
    /// `AuthError::MissingName` or `AuthError::WeakPassword` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(registration.email)?;
        let phone = PhoneNumber::parse(registration.phone)?;
        validate_password(registration.password)?;

        let password_hash = hash_password(registration.password)?;

        let user = self
            .store
            .create_user(NewUser {
                name: name.to_string(),
                email,
                phone,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "Customer registered");
        Ok(user)
    }

    /// Login a customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .store
            .get_user_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // Admins
    // =========================================================================

    /// Login an admin and stamp `last_login_at`.
    ///
    /// Only active admin accounts may log in. Any other account, including
    /// a customer's, is refused with `AuthError::AccessDenied`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccessDenied` for unknown or inactive admins and
    /// `AuthError::InvalidCredentials` for a wrong password.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::AccessDenied)?;

        let Some((mut admin, password_hash)) = self.store.get_admin_credentials(&email).await?
        else {
            warn!(%email, "Admin login refused: not an admin account");
            return Err(AuthError::AccessDenied);
        };

        if !admin.is_active {
            warn!(admin_id = %admin.id, "Admin login refused: account deactivated");
            return Err(AuthError::AccessDenied);
        }

        verify_password(password, &password_hash)?;

        let now = Utc::now();
        self.store.record_admin_login(&admin.id, now).await?;
        admin.last_login_at = Some(now);

        info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");
        Ok(admin)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
