// ABOUTME: HTTP request handlers for task operations
// ABOUTME: Single-task CRUD, status changes and multipart bulk upload

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentAgent;
use crate::db::DbState;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use tasklane_core::truncate;
use tasklane_tasks::{NewTask, TaskQuery, TaskStatus, TaskUpdateInput, UploadedFile};

/// Multipart field holding the uploaded spreadsheet
pub const UPLOAD_FIELD: &str = "file";

pub async fn create_task(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    Json(request): Json<NewTask>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Agent {} creating task '{}'",
        agent.id,
        truncate(&request.title, 60)
    );

    let task = db.task_service.create_task(&agent, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Task created successfully", task)),
    ))
}

/// Stage the `file` field, then distribute its rows
pub async fn upload_tasks(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut staged = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;

        info!(
            "Agent {} uploading '{}' ({} bytes)",
            agent.id,
            file_name,
            bytes.len()
        );

        let dir = db.upload_dir.clone();
        let upload = tokio::task::spawn_blocking(move || {
            UploadedFile::stage(&dir, &file_name, content_type, &bytes)
        })
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

        staged = Some(upload);
        break;
    }

    let upload = staged.ok_or_else(|| ApiError::validation("No file uploaded"))?;
    let report = db.upload_service.upload_tasks(upload, &agent.id).await?;

    Ok(Json(ApiResponse::with_message(report.message.clone(), report)))
}

pub async fn list_tasks(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    Query(query): Query<TaskQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("Listing tasks for {} (page: {:?})", agent.id, query.page);

    let page = db.task_service.list_tasks(&agent, query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get_task(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let task = db.task_service.get_task(&agent, &task_id).await?;
    Ok(Json(ApiResponse::success(task)))
}

pub async fn update_task(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    Path(task_id): Path<String>,
    Json(request): Json<TaskUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Agent {} updating task {}", agent.id, task_id);

    let task = db.task_service.update_task(&agent, &task_id, request).await?;
    Ok(Json(ApiResponse::with_message("Task updated successfully", task)))
}

/// Request body for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_task_status(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    Path(task_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let status = TaskStatus::from_exact(&request.status).ok_or_else(|| {
        ApiError::validation(
            "Invalid status. Must be: pending, in-progress, completed, or cancelled",
        )
    })?;

    let task = db
        .task_service
        .update_status(&agent, &task_id, status)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Task status updated successfully",
        task,
    )))
}

pub async fn delete_task(
    State(db): State<DbState>,
    CurrentAgent(agent): CurrentAgent,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Agent {} deleting task {}", agent.id, task_id);

    db.task_service.delete_task(&agent, &task_id).await?;
    Ok(Json(ApiResponse::message("Task deleted successfully")))
}
