//! Service catalog route handlers.

use axum::extract::State;

use crate::error::{ApiResponse, Result};
use crate::models::Service;
use crate::state::AppState;

/// Services currently offered, by name.
///
/// GET /api/services
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Service>>> {
    let services = state.store().list_services(true).await?;
    Ok(ApiResponse::ok("Services", services))
}
