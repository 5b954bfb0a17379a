// ABOUTME: HTTP request handlers for the admin task console
// ABOUTME: System-wide task listing, upload batches and duplicate detection/removal/reporting

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AdminAgent;
use crate::db::DbState;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use tasklane_tasks::{AdminTaskQuery, BatchQuery, DuplicateReportEntry};

pub async fn list_all_tasks(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
    Query(query): Query<AdminTaskQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("Admin {} listing tasks", admin.id);

    let page = db.task_service.admin_list(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn list_upload_batches(
    State(db): State<DbState>,
    AdminAgent(_admin): AdminAgent,
    Query(query): Query<BatchQuery>,
) -> ApiResult<impl IntoResponse> {
    let listing = db.task_service.upload_batches(query).await?;
    Ok(Json(ApiResponse::success(listing)))
}

pub async fn detect_duplicates(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
) -> ApiResult<impl IntoResponse> {
    info!("Admin {} running duplicate detection", admin.id);

    let summary = db.duplicate_service.detect().await?;
    let message = format!(
        "Duplicate detection completed. Found {} duplicate groups with {} duplicate tasks",
        summary.duplicate_groups, summary.total_duplicates
    );
    Ok(Json(ApiResponse::with_message(message, summary)))
}

/// Request body for duplicate removal
#[derive(Debug, Default, Deserialize)]
pub struct RemoveDuplicatesRequest {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn remove_duplicates(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
    request: Option<Json<RemoveDuplicatesRequest>>,
) -> ApiResult<impl IntoResponse> {
    let confirm = request.map(|Json(body)| body.confirm).unwrap_or(false);
    info!("Admin {} removing duplicates (confirm: {})", admin.id, confirm);

    let summary = db.duplicate_service.remove(confirm).await?;
    let message = format!("Removed {} duplicate tasks", summary.removed);
    Ok(Json(ApiResponse::with_message(message, summary)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub total_duplicates: usize,
    pub duplicates: Vec<DuplicateReportEntry>,
}

pub async fn duplicate_report(
    State(db): State<DbState>,
    AdminAgent(_admin): AdminAgent,
) -> ApiResult<impl IntoResponse> {
    let duplicates = db.duplicate_service.report().await?;
    Ok(Json(ApiResponse::success(DuplicateReport {
        total_duplicates: duplicates.len(),
        duplicates,
    })))
}
