//! Storage summary handler for Web API.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::file::{FileRepository, StorageSummary};
use crate::web::dto::ApiResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/storage - Stored bytes per file category.
#[utoipa::path(
    get,
    path = "/storage",
    tag = "storage",
    responses(
        (status = 200, description = "Storage summary", body = StorageSummary),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_storage(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<StorageSummary>>, ApiError> {
    let summary = FileRepository::new(state.db.pool())
        .storage_summary(user.user_id())
        .await?;

    Ok(Json(ApiResponse::new(summary)))
}
