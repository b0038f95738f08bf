//! Customer authentication route handlers.

use axum::extract::State;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiJson, ApiResponse, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub(super) fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Register a customer and log them in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<User>> {
    let auth = AuthService::new(state.store());
    let user = auth
        .register(Registration {
            name: &form.name,
            email: &form.email,
            phone: &form.phone,
            password: &form.password,
        })
        .await?;

    start_session(&session, &user).await?;
    Ok(ApiResponse::ok("Registration successful", user))
}

/// Log a customer in.
///
/// POST /api/auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<ApiResponse<User>> {
    let auth = AuthService::new(state.store());
    let user = auth.login(&form.email, &form.password).await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer logged in");
    Ok(ApiResponse::ok("Login successful", user))
}

/// Log the customer out.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<ApiResponse<()>> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();
    Ok(ApiResponse::done("Logged out"))
}

/// The logged-in customer's session identity.
///
/// GET /api/auth/me
pub async fn me(RequireAuth(current): RequireAuth) -> ApiResponse<CurrentUser> {
    ApiResponse::ok("Current user", current)
}
