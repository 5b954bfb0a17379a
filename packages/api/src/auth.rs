// ABOUTME: Caller identity for API requests
// ABOUTME: Resolves the x-agent-id header to an active agent and checks role requirements

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::db::DbState;
use crate::error::ApiError;
use tasklane_agents::Agent;

/// Header carrying the id of the calling agent
pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// The active agent making the request
#[derive(Debug, Clone)]
pub struct CurrentAgent(pub Agent);

impl FromRequestParts<DbState> for CurrentAgent {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &DbState) -> Result<Self, Self::Rejection> {
        let agent_id = parts
            .headers
            .get(AGENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        match state.agent_storage.find_agent(agent_id).await? {
            Some(agent) if agent.is_active => Ok(Self(agent)),
            Some(_) => {
                warn!(agent_id = %agent_id, "Request from deactivated agent");
                Err(ApiError::Unauthorized)
            }
            None => {
                warn!(agent_id = %agent_id, "Request from unknown agent");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// An admin caller
#[derive(Debug, Clone)]
pub struct AdminAgent(pub Agent);

impl FromRequestParts<DbState> for AdminAgent {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &DbState) -> Result<Self, Self::Rejection> {
        let CurrentAgent(agent) = CurrentAgent::from_request_parts(parts, state).await?;
        if agent.is_admin() {
            Ok(Self(agent))
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

/// A regular agent caller, the only kind allowed to own sub-agents
#[derive(Debug, Clone)]
pub struct ParentAgent(pub Agent);

impl FromRequestParts<DbState> for ParentAgent {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &DbState) -> Result<Self, Self::Rejection> {
        let CurrentAgent(agent) = CurrentAgent::from_request_parts(parts, state).await?;
        if agent.can_create_sub_agents() {
            Ok(Self(agent))
        } else {
            Err(ApiError::forbidden("Only agents can manage sub-agents"))
        }
    }
}
