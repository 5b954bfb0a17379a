// ABOUTME: HTTP request handlers for sub-agent management
// ABOUTME: Agents create and manage only the sub-agents they own

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::agents_handlers::CreateAgentRequest;
use crate::auth::ParentAgent;
use crate::db::DbState;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use tasklane_agents::{Agent, AgentCreateInput, AgentUpdateInput, UserType};
use tasklane_storage::StorageError;

async fn owned_sub_agent(db: &DbState, parent: &Agent, sub_agent_id: &str) -> ApiResult<Agent> {
    match db.agent_storage.get_sub_agent(&parent.id, sub_agent_id).await {
        Ok(agent) => Ok(agent),
        Err(StorageError::NotFound) => Err(ApiError::not_found("Sub-agent not found")),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_sub_agents(
    State(db): State<DbState>,
    ParentAgent(parent): ParentAgent,
) -> ApiResult<impl IntoResponse> {
    info!("Listing sub-agents of {}", parent.id);
    let sub_agents = db.agent_storage.list_sub_agents(&parent.id, false).await?;
    Ok(Json(ApiResponse::success(sub_agents)))
}

pub async fn create_sub_agent(
    State(db): State<DbState>,
    ParentAgent(parent): ParentAgent,
    Json(request): Json<CreateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Agent {} creating sub-agent <{}>", parent.id, request.email);

    let sub_agent = db
        .agent_storage
        .create_agent(AgentCreateInput {
            name: request.name,
            email: request.email,
            mobile: request.mobile,
            user_type: UserType::SubAgent,
            parent_agent_id: Some(parent.id.clone()),
            created_by: Some(parent.id),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Sub-agent created successfully",
            sub_agent,
        )),
    ))
}

pub async fn get_sub_agent(
    State(db): State<DbState>,
    ParentAgent(parent): ParentAgent,
    Path(sub_agent_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let sub_agent = owned_sub_agent(&db, &parent, &sub_agent_id).await?;
    Ok(Json(ApiResponse::success(sub_agent)))
}

pub async fn update_sub_agent(
    State(db): State<DbState>,
    ParentAgent(parent): ParentAgent,
    Path(sub_agent_id): Path<String>,
    Json(request): Json<AgentUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Agent {} updating sub-agent {}", parent.id, sub_agent_id);

    owned_sub_agent(&db, &parent, &sub_agent_id).await?;
    let sub_agent = db.agent_storage.update_agent(&sub_agent_id, request).await?;
    Ok(Json(ApiResponse::with_message(
        "Sub-agent updated successfully",
        sub_agent,
    )))
}

pub async fn delete_sub_agent(
    State(db): State<DbState>,
    ParentAgent(parent): ParentAgent,
    Path(sub_agent_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Agent {} deleting sub-agent {}", parent.id, sub_agent_id);

    owned_sub_agent(&db, &parent, &sub_agent_id).await?;
    db.agent_storage.delete_agent(&sub_agent_id).await?;
    Ok(Json(ApiResponse::message("Sub-agent deleted successfully")))
}
