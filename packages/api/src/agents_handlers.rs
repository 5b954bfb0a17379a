// ABOUTME: HTTP request handlers for agent management
// ABOUTME: Admin-only create, list, get, update and delete of top-level agents

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AdminAgent;
use crate::db::DbState;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use tasklane_agents::{Agent, AgentCreateInput, AgentUpdateInput, UserType};

/// Request body for creating an agent or sub-agent
#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

async fn load_agent(db: &DbState, agent_id: &str) -> ApiResult<Agent> {
    match db.agent_storage.find_agent(agent_id).await? {
        Some(agent) if agent.user_type == UserType::Agent => Ok(agent),
        _ => Err(ApiError::not_found("Agent not found")),
    }
}

pub async fn list_agents(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
) -> ApiResult<impl IntoResponse> {
    info!("Listing agents for admin {}", admin.id);
    let agents = db.agent_storage.list_agents(Some(UserType::Agent)).await?;
    Ok(Json(ApiResponse::success(agents)))
}

pub async fn create_agent(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
    Json(request): Json<CreateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Admin {} creating agent <{}>", admin.id, request.email);

    let agent = db
        .agent_storage
        .create_agent(AgentCreateInput {
            name: request.name,
            email: request.email,
            mobile: request.mobile,
            user_type: UserType::Agent,
            parent_agent_id: None,
            created_by: Some(admin.id),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Agent created successfully", agent)),
    ))
}

pub async fn get_agent(
    State(db): State<DbState>,
    AdminAgent(_admin): AdminAgent,
    Path(agent_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let agent = load_agent(&db, &agent_id).await?;
    Ok(Json(ApiResponse::success(agent)))
}

pub async fn update_agent(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
    Path(agent_id): Path<String>,
    Json(request): Json<AgentUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Admin {} updating agent {}", admin.id, agent_id);

    load_agent(&db, &agent_id).await?;
    let agent = db.agent_storage.update_agent(&agent_id, request).await?;
    Ok(Json(ApiResponse::with_message("Agent updated successfully", agent)))
}

pub async fn delete_agent(
    State(db): State<DbState>,
    AdminAgent(admin): AdminAgent,
    Path(agent_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Admin {} deleting agent {}", admin.id, agent_id);

    load_agent(&db, &agent_id).await?;
    db.agent_storage.delete_agent(&agent_id).await?;
    Ok(Json(ApiResponse::message("Agent deleted successfully")))
}
