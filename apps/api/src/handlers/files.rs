use axum::Json;
use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use taskhub_application::UploadFileInput;
use taskhub_core::{AppError, FileId, ProjectId, TaskId};
use taskhub_domain::Actor;
use tracing::warn;
use uuid::Uuid;

use crate::dto::{FileListParams, FileResponse, StorageStatsResponse, UpdateFileRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_files_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<FileListParams>,
) -> ApiResult<Json<Vec<FileResponse>>> {
    let files = state
        .file_service
        .list_files(&actor, params.into())
        .await?
        .into_iter()
        .map(FileResponse::from)
        .collect();

    Ok(Json(files))
}

/// POST /api/files - multipart upload with a `file` part and optional
/// `project_id`, `task_id`, `description` and `is_public` parts.
pub async fn upload_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    let input = read_upload(&actor, multipart).await?;
    let file = state.file_service.upload_file(&actor, input).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(file))))
}

pub async fn get_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(file_id): Path<FileId>,
) -> ApiResult<Json<FileResponse>> {
    let file = state.file_service.get_file(&actor, file_id).await?;
    Ok(Json(FileResponse::from(file)))
}

pub async fn download_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(file_id): Path<FileId>,
) -> ApiResult<Response> {
    let download = state.file_service.download_file(&actor, file_id).await?;

    let content_type = HeaderValue::from_str(download.file.mime_type())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(
        download.file.original_filename(),
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        download.content,
    )
        .into_response())
}

pub async fn update_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(file_id): Path<FileId>,
    Json(payload): Json<UpdateFileRequest>,
) -> ApiResult<Json<FileResponse>> {
    let file = state
        .file_service
        .update_file(&actor, file_id, payload.into())
        .await?;
    Ok(Json(FileResponse::from(file)))
}

pub async fn delete_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(file_id): Path<FileId>,
) -> ApiResult<StatusCode> {
    state.file_service.delete_file(&actor, file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn storage_stats_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<StorageStatsResponse>> {
    let stats = state.file_service.storage_stats(&actor).await?;
    Ok(Json(StorageStatsResponse::from(stats)))
}

async fn read_upload(actor: &Actor, mut multipart: Multipart) -> Result<UploadFileInput, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut project_id = None;
    let mut task_id = None;
    let mut description = String::new();
    let mut is_public = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::Validation(format!("malformed multipart body: {error}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_owned();
            let content = field.bytes().await.map_err(|error| {
                AppError::Validation(format!("failed to read uploaded file: {error}"))
            })?;
            upload = Some((filename, content.to_vec()));
            continue;
        }

        let value = field.text().await.map_err(|error| {
            AppError::Validation(format!("failed to read field '{name}': {error}"))
        })?;
        let value = value.trim();
        match name.as_str() {
            "project_id" if !value.is_empty() => {
                project_id = Some(ProjectId::from_uuid(parse_uuid(&name, value)?));
            }
            "task_id" if !value.is_empty() => {
                task_id = Some(TaskId::from_uuid(parse_uuid(&name, value)?));
            }
            "description" => description = value.to_owned(),
            "is_public" => is_public = parse_flag(value),
            "uploaded_by" | "user" => warn!(
                actor = ?actor.user_id(),
                claimed_owner = %value,
                "ignoring client-supplied file owner"
            ),
            _ => {}
        }
    }

    let (filename, content) =
        upload.ok_or_else(|| AppError::Validation("a 'file' part is required".to_owned()))?;

    Ok(UploadFileInput {
        filename,
        content,
        project_id,
        task_id,
        description,
        is_public,
    })
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|error| AppError::Validation(format!("invalid {field} '{value}': {error}")))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

/// Builds an `attachment` disposition with an ASCII-safe quoted filename.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|character| {
            if character.is_ascii_graphic() && character != '"' && character != '\\' {
                character
            } else if character == ' ' {
                ' '
            } else {
                '_'
            }
        })
        .collect();

    format!("attachment; filename=\"{safe}\"")
}
