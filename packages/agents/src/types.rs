// ABOUTME: Agent type definitions
// ABOUTME: Accounts that create tasks (agents) and receive them (sub-agents)

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UserType {
    Admin,
    Agent,
    SubAgent,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::Agent => "agent",
            UserType::SubAgent => "sub-agent",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub user_type: UserType,
    pub parent_agent_id: Option<String>,
    pub created_by: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Only regular agents may own sub-agents
    pub fn can_create_sub_agents(&self) -> bool {
        self.user_type == UserType::Agent
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    /// True when `self` is a sub-agent owned by `parent_id`
    pub fn is_sub_agent_of(&self, parent_id: &str) -> bool {
        self.user_type == UserType::SubAgent && self.parent_agent_id.as_deref() == Some(parent_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCreateInput {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub user_type: UserType,
    pub parent_agent_id: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdateInput {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub is_active: Option<bool>,
}
