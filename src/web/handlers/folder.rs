//! Folder handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::file::{Folder, FolderRepository, NewFolder};
use crate::web::dto::{
    ApiResponse, BreadcrumbItem, CreateFolderRequest, FolderDetailResponse, FolderResponse,
    ListFoldersQuery, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

async fn with_file_counts(
    repo: &FolderRepository<'_>,
    folders: Vec<Folder>,
) -> crate::Result<Vec<FolderResponse>> {
    let mut responses = Vec::with_capacity(folders.len());
    for folder in folders {
        let file_count = repo.count_files(folder.id).await?;
        responses.push(FolderResponse::new(folder, file_count));
    }
    Ok(responses)
}

/// GET /api/folders - List root folders or the children of a folder.
#[utoipa::path(
    get,
    path = "/folders",
    tag = "folders",
    params(ListFoldersQuery),
    responses(
        (status = 200, description = "List of folders", body = Vec<FolderResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Parent folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListFoldersQuery>,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let user_id = user.user_id();
    let repo = FolderRepository::new(state.db.pool());

    let folders = match query.parent_id {
        Some(parent_id) => {
            repo.get_for_user(parent_id, user_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Folder not found"))?;
            repo.list_by_parent(user_id, parent_id).await?
        }
        None => repo.list_root(user_id).await?,
    };

    Ok(Json(ApiResponse::new(
        with_file_counts(&repo, folders).await?,
    )))
}

/// POST /api/folders - Create a folder.
#[utoipa::path(
    post,
    path = "/folders",
    tag = "folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Parent folder not found"),
        (status = 409, description = "Folder name already used"),
        (status = 422, description = "Validation error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    let mut new_folder = NewFolder::new(user.user_id(), req.name);
    if let Some(parent_id) = req.parent_id {
        new_folder = new_folder.with_parent(parent_id);
    }

    let folder = FolderRepository::new(state.db.pool())
        .create(&new_folder)
        .await?;

    tracing::info!(user_id = user.user_id(), folder_id = folder.id, "Folder created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FolderResponse::new(folder, 0))),
    ))
}

/// GET /api/folders/:id - Folder detail with breadcrumb and subfolders.
#[utoipa::path(
    get,
    path = "/folders/{id}",
    tag = "folders",
    params(
        ("id" = i64, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder detail", body = FolderDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(folder_id): Path<i64>,
) -> Result<Json<ApiResponse<FolderDetailResponse>>, ApiError> {
    let user_id = user.user_id();
    let repo = FolderRepository::new(state.db.pool());

    let folder = repo
        .get_for_user(folder_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;

    let path = repo
        .get_path(folder.id)
        .await?
        .into_iter()
        .map(|f| BreadcrumbItem {
            id: f.id,
            name: f.name,
        })
        .collect();

    let subfolders = repo.list_by_parent(user_id, folder.id).await?;
    let subfolders = with_file_counts(&repo, subfolders).await?;
    let file_count = repo.count_files(folder.id).await?;

    Ok(Json(ApiResponse::new(FolderDetailResponse {
        folder: FolderResponse::new(folder, file_count),
        path,
        subfolders,
    })))
}
