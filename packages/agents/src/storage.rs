// ABOUTME: Agent storage layer using SQLite
// ABOUTME: Handles CRUD operations for agents and parent/sub-agent lookups

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::types::{Agent, AgentCreateInput, AgentUpdateInput, UserType};
use tasklane_core::generate_id;
use tasklane_storage::StorageError;

const AGENT_COLUMNS: &str = r#"
    id, name, email, mobile, user_type, parent_agent_id, created_by,
    is_active, created_at, updated_at
"#;

#[derive(Clone)]
pub struct AgentStorage {
    pool: SqlitePool,
}

impl AgentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_agent(&self, input: AgentCreateInput) -> Result<Agent, StorageError> {
        let name = input.name.trim().to_string();
        let email = input.email.trim().to_lowercase();
        let mobile = input.mobile.trim().to_string();

        if name.is_empty() {
            return Err(StorageError::InvalidInput("Name is required".to_string()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(StorageError::InvalidInput(
                "A valid email is required".to_string(),
            ));
        }
        if mobile.is_empty() {
            return Err(StorageError::InvalidInput("Mobile is required".to_string()));
        }
        if input.user_type == UserType::SubAgent && input.parent_agent_id.is_none() {
            return Err(StorageError::InvalidInput(
                "Sub-agents require a parent agent".to_string(),
            ));
        }

        let agent_id = generate_id("agt");
        let now = Utc::now();

        debug!("Creating {} {} <{}>", input.user_type, agent_id, email);

        sqlx::query(
            r#"
            INSERT INTO agents (
                id, name, email, mobile, user_type, parent_agent_id, created_by,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&agent_id)
        .bind(&name)
        .bind(&email)
        .bind(&mobile)
        .bind(input.user_type)
        .bind(&input.parent_agent_id)
        .bind(&input.created_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_write(e, "Agent with this email already exists"))?;

        self.get_agent(&agent_id).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, StorageError> {
        self.find_agent(agent_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    pub async fn find_agent(&self, agent_id: &str) -> Result<Option<Agent>, StorageError> {
        debug!("Fetching agent: {}", agent_id);

        let query = format!("SELECT {} FROM agents WHERE id = ?", AGENT_COLUMNS);
        sqlx::query_as::<_, Agent>(&query)
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, StorageError> {
        let query = format!("SELECT {} FROM agents WHERE email = ?", AGENT_COLUMNS);
        sqlx::query_as::<_, Agent>(&query)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// List agents, optionally restricted to one user type, oldest first
    pub async fn list_agents(&self, user_type: Option<UserType>) -> Result<Vec<Agent>, StorageError> {
        debug!("Listing agents (type: {:?})", user_type);

        let agents = match user_type {
            Some(user_type) => {
                let query = format!(
                    "SELECT {} FROM agents WHERE user_type = ? ORDER BY created_at, rowid",
                    AGENT_COLUMNS
                );
                sqlx::query_as::<_, Agent>(&query)
                    .bind(user_type)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM agents ORDER BY created_at, rowid",
                    AGENT_COLUMNS
                );
                sqlx::query_as::<_, Agent>(&query)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(StorageError::Sqlx)?;

        Ok(agents)
    }

    /// Sub-agents owned by `parent_id` in creation order
    pub async fn list_sub_agents(
        &self,
        parent_id: &str,
        active_only: bool,
    ) -> Result<Vec<Agent>, StorageError> {
        debug!(
            "Listing sub-agents of {} (active only: {})",
            parent_id, active_only
        );

        let query = format!(
            r#"
            SELECT {} FROM agents
            WHERE parent_agent_id = ?
            AND user_type = 'sub-agent'
            AND (? = 0 OR is_active = 1)
            ORDER BY created_at, rowid
            "#,
            AGENT_COLUMNS
        );

        sqlx::query_as::<_, Agent>(&query)
            .bind(parent_id)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Fetch a sub-agent only if it belongs to `parent_id`
    pub async fn get_sub_agent(
        &self,
        parent_id: &str,
        sub_agent_id: &str,
    ) -> Result<Agent, StorageError> {
        let agent = self.get_agent(sub_agent_id).await?;
        if agent.is_sub_agent_of(parent_id) {
            Ok(agent)
        } else {
            Err(StorageError::NotFound)
        }
    }

    pub async fn update_agent(
        &self,
        agent_id: &str,
        input: AgentUpdateInput,
    ) -> Result<Agent, StorageError> {
        debug!("Updating agent: {}", agent_id);

        let name = input.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let mobile = input.mobile.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let result = sqlx::query(
            r#"
            UPDATE agents
            SET name = COALESCE(?, name),
                mobile = COALESCE(?, mobile),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(mobile)
        .bind(input.is_active)
        .bind(Utc::now())
        .bind(agent_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_agent(agent_id).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<(), StorageError> {
        debug!("Deleting agent: {}", agent_id);

        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
