//! Customer account route handlers: profile and saved addresses.

use axum::extract::{Path, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use sudsy_core::PhoneNumber;

use crate::db::RepositoryError;
use crate::error::{ApiJson, ApiResponse, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, CurrentUser, User, session_keys};
use crate::routes::auth::session_error;
use crate::state::AppState;

/// Profile changes; absent fields are left as they are.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

async fn load_user(state: &AppState, current: &CurrentUser) -> Result<User> {
    state
        .store()
        .get_user(&current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
}

fn not_found_as(e: RepositoryError, what: &str) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound(format!("{what} not found")),
        other => AppError::Database(other),
    }
}

/// The customer's profile.
///
/// GET /api/account
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<ApiResponse<User>> {
    let user = load_user(&state, &current).await?;
    Ok(ApiResponse::ok("Account", user))
}

/// Update name and/or phone.
///
/// PATCH /api/account
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    ApiJson(form): ApiJson<UpdateAccountRequest>,
) -> Result<ApiResponse<User>> {
    let name = match form.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::BadRequest("Name is required".to_string())),
        other => other,
    };
    let phone = form
        .phone
        .as_deref()
        .map(PhoneNumber::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid phone number: {e}")))?;

    let user = state
        .store()
        .update_profile(&current.id, name, phone.as_ref())
        .await
        .map_err(|e| not_found_as(e, "Account"))?;

    // Keep the session's display name in step with the profile
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await
        .map_err(|e| session_error(&e))?;

    Ok(ApiResponse::ok("Account updated", user))
}

/// Save a new address.
///
/// POST /api/account/addresses
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(address): ApiJson<Address>,
) -> Result<ApiResponse<Vec<Address>>> {
    validate_address(&address)?;
    let user = load_user(&state, &current).await?;

    let addresses = with_added(user.addresses, address);
    let user = state.store().set_addresses(&current.id, &addresses).await?;
    Ok(ApiResponse::ok("Address saved", user.addresses))
}

/// Remove an address by position.
///
/// DELETE /api/account/addresses/{index}
pub async fn remove_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(index): Path<usize>,
) -> Result<ApiResponse<Vec<Address>>> {
    let user = load_user(&state, &current).await?;

    let addresses = without(user.addresses, index)
        .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;
    let user = state.store().set_addresses(&current.id, &addresses).await?;
    Ok(ApiResponse::ok("Address removed", user.addresses))
}

/// Make an address the default.
///
/// POST /api/account/addresses/{index}/default
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(index): Path<usize>,
) -> Result<ApiResponse<Vec<Address>>> {
    let user = load_user(&state, &current).await?;

    let addresses = with_default(user.addresses, index)
        .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;
    let user = state.store().set_addresses(&current.id, &addresses).await?;
    Ok(ApiResponse::ok("Default address updated", user.addresses))
}

// =============================================================================
// Address list rules
// =============================================================================

fn validate_address(address: &Address) -> Result<()> {
    let required = [
        ("label", &address.label),
        ("line1", &address.line1),
        ("city", &address.city),
        ("state", &address.state),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("Address {field} is required")));
        }
    }
    Ok(())
}

/// Append `address`. The first address, or one flagged default, becomes the
/// only default.
fn with_added(mut addresses: Vec<Address>, mut address: Address) -> Vec<Address> {
    if addresses.is_empty() {
        address.is_default = true;
    }
    if address.is_default {
        for a in &mut addresses {
            a.is_default = false;
        }
    }
    addresses.push(address);
    addresses
}

/// Remove the address at `index`; if it was the default, the first remaining
/// address takes over. `None` if `index` is out of range.
fn without(mut addresses: Vec<Address>, index: usize) -> Option<Vec<Address>> {
    if index >= addresses.len() {
        return None;
    }
    let removed = addresses.remove(index);
    if removed.is_default
        && let Some(first) = addresses.first_mut()
    {
        first.is_default = true;
    }
    Some(addresses)
}

/// Flag the address at `index` as the only default. `None` if out of range.
fn with_default(mut addresses: Vec<Address>, index: usize) -> Option<Vec<Address>> {
    if index >= addresses.len() {
        return None;
    }
    for (i, a) in addresses.iter_mut().enumerate() {
        a.is_default = i == index;
    }
    Some(addresses)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn address(label: &str) -> Address {
        Address {
            label: label.to_string(),
            line1: "3 Bode Thomas St".to_string(),
            line2: None,
            city: "Surulere".to_string(),
            state: "Lagos".to_string(),
            is_default: false,
        }
    }

    fn defaults(addresses: &[Address]) -> Vec<&str> {
        addresses
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.label.as_str())
            .collect()
    }

    #[test]
    fn test_first_address_becomes_default() {
        let list = with_added(Vec::new(), address("Home"));
        assert_eq!(defaults(&list), ["Home"]);

        let list = with_added(list, address("Office"));
        assert_eq!(defaults(&list), ["Home"]);
    }

    #[test]
    fn test_new_default_replaces_old() {
        let list = with_added(Vec::new(), address("Home"));
        let mut office = address("Office");
        office.is_default = true;
        let list = with_added(list, office);
        assert_eq!(defaults(&list), ["Office"]);
    }

    #[test]
    fn test_removing_default_promotes_first() {
        let list = with_added(Vec::new(), address("Home"));
        let list = with_added(list, address("Office"));
        let list = without(list, 0).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(defaults(&list), ["Office"]);
        assert!(without(list, 5).is_none());
    }

    #[test]
    fn test_set_default_by_index() {
        let list = with_added(Vec::new(), address("Home"));
        let list = with_added(list, address("Office"));
        let list = with_default(list, 1).unwrap();
        assert_eq!(defaults(&list), ["Office"]);
        assert!(with_default(list, 2).is_none());
    }

    #[test]
    fn test_validate_address_requires_fields() {
        assert!(validate_address(&address("Home")).is_ok());
        let mut a = address("Home");
        a.city = "  ".to_string();
        let err = validate_address(&a).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("city")));
    }
}
