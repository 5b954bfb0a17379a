// ABOUTME: Task type definitions
// ABOUTME: Persisted task records, inputs, filters and duplicate reporting shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn from_exact(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Exact, case-sensitive match against the stored spelling
    pub fn from_exact(value: &str) -> Option<Self> {
        match value {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// Normalized form of a title used for duplicate comparison
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    /// Populated from the agents table when available
    pub assignee_name: Option<String>,
    pub created_by: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub is_duplicate: bool,
    pub duplicate_of: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new task; assignment rules are enforced by the caller
#[derive(Debug, Clone)]
pub struct TaskCreateInput {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub created_by: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Conditions for listing tasks; every set field narrows the result
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    /// Tasks created by this agent or assigned to any of its sub-agents
    pub owner_agent: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_duplicate: Option<bool>,
    /// Case-insensitive substring match on title or description
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total_tasks: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub duplicates: i64,
}

/// Number of tasks created by one agent within a filtered listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorLoad {
    pub agent_id: String,
    pub agent_name: String,
    pub agent_email: String,
    pub user_type: String,
    pub task_count: i64,
}

/// Key columns loaded for a duplicate scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCandidate {
    pub id: String,
    pub title_key: String,
    pub assigned_to: String,
    pub created_at: DateTime<Utc>,
    /// Insertion order, breaks `created_at` ties
    pub seq: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateMark {
    pub task_id: String,
    pub duplicate_of: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub duplicate_groups: usize,
    pub total_duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalSummary {
    pub removed: u64,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReportEntry {
    pub task_id: String,
    pub title: String,
    pub assignee_id: String,
    pub assigned_to: String,
    pub created_at: DateTime<Utc>,
    pub original_id: Option<String>,
    pub original_title: Option<String>,
    pub original_created_at: Option<DateTime<Utc>>,
}
