//! File handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::file::{FileRepository, FileUpdate, FolderRepository, FolderScope, NewFile};
use crate::web::dto::{
    ApiResponse, DeletedResponse, FileResponse, ListFilesQuery, RegisterFileRequest,
    UpdateFileRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/files - List the account's active files.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "List of files", body = Vec<FileResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let user_id = user.user_id();
    let file_query = query.to_file_query();

    if let FolderScope::Folder(folder_id) = file_query.scope {
        FolderRepository::new(state.db.pool())
            .get_for_user(folder_id, user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Folder not found"))?;
    }

    let files = FileRepository::new(state.db.pool())
        .list(user_id, &file_query)
        .await?;

    Ok(Json(ApiResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}

/// POST /api/files - Register an uploaded file.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    request_body = RegisterFileRequest,
    responses(
        (status = 201, description = "File registered", body = FileResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found"),
        (status = 422, description = "Validation error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<RegisterFileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let mut new_file = NewFile::new(user.user_id(), req.filename, req.file_size);
    if let Some(folder_id) = req.folder_id {
        new_file = new_file.with_folder(folder_id);
    }
    if let Some(file_key) = req.file_key {
        new_file = new_file.with_file_key(file_key);
    }

    let file = FileRepository::new(state.db.pool())
        .create(&new_file)
        .await?;

    tracing::info!(
        user_id = user.user_id(),
        file_id = file.id,
        size = file.file_size,
        "File registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(file))),
    ))
}

/// GET /api/files/:id - Get file metadata.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = FileRepository::new(state.db.pool())
        .get_for_user(file_id, user.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}

/// PATCH /api/files/:id - Rename or move a file.
#[utoipa::path(
    patch,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File or folder not found"),
        (status = 422, description = "Validation error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let update = FileUpdate {
        filename: req.filename,
        folder_id: req.folder_id,
    };

    let file = FileRepository::new(state.db.pool())
        .update(file_id, user.user_id(), &update)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}

/// DELETE /api/files/:id - Delete a file.
///
/// The file stays billable for the days it was stored.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = DeletedResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let deleted = FileRepository::new(state.db.pool())
        .soft_delete(file_id, user.user_id(), Utc::now())
        .await?;

    if !deleted {
        return Err(ApiError::not_found("File not found"));
    }

    tracing::info!(user_id = user.user_id(), file_id, "File deleted");

    Ok(Json(ApiResponse::new(DeletedResponse {
        id: file_id,
        deleted: true,
    })))
}
