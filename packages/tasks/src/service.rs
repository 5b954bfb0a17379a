// ABOUTME: Task operations performed on behalf of an authenticated agent
// ABOUTME: Enforces who may create, see and change which tasks, plus admin views

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batches::{group_upload_batches, UploadBatch};
use crate::error::{TaskError, TaskResult};
use crate::storage::TaskStorage;
use crate::types::{
    CreatorLoad, Task, TaskCreateInput, TaskFilter, TaskPriority, TaskStatistics, TaskStatus,
    TaskUpdateInput,
};
use tasklane_agents::{Agent, AgentStorage, UserType};
use tasklane_core::UPLOAD_BATCH_WINDOW_SECS;
use tasklane_storage::StorageError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_ADMIN_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub due_date: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub assigned_to: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTaskQuery {
    pub agent_id: Option<String>,
    pub sub_agent_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub has_duplicates: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuery {
    pub agent_id: Option<String>,
    /// Restrict to tasks created on this UTC day
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: i64,
    /// Number of pages
    pub total: i64,
    pub results: i64,
}

impl Pagination {
    fn new(page: i64, limit: i64, results: i64) -> Self {
        Self {
            current: page,
            total: (results + limit - 1) / limit,
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTaskPage {
    pub tasks: Vec<Task>,
    pub statistics: TaskStatistics,
    pub upload_distribution: Vec<CreatorLoad>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListing {
    pub batches: Vec<UploadBatch>,
    pub total_batches: usize,
    pub total_tasks: usize,
}

fn page_bounds(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}

#[derive(Clone)]
pub struct TaskService {
    agents: AgentStorage,
    tasks: TaskStorage,
}

impl TaskService {
    pub fn new(agents: AgentStorage, tasks: TaskStorage) -> Self {
        Self { agents, tasks }
    }

    /// Create a single task. Agents assign to one of their active sub-agents,
    /// sub-agents only to themselves.
    pub async fn create_task(&self, creator: &Agent, input: NewTask) -> TaskResult<Task> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskError::MissingTitle);
        }

        let assignee = match creator.user_type {
            UserType::Agent => match self.agents.get_sub_agent(&creator.id, &input.assigned_to).await {
                Ok(agent) if agent.is_active => agent,
                Ok(_) | Err(StorageError::NotFound) => return Err(TaskError::InvalidAssignment),
                Err(e) => return Err(e.into()),
            },
            UserType::SubAgent => {
                if input.assigned_to != creator.id {
                    return Err(TaskError::Forbidden(
                        "Sub-agents can only assign tasks to themselves".to_string(),
                    ));
                }
                creator.clone()
            }
            UserType::Admin => return Err(TaskError::InvalidAssignment),
        };

        if self.tasks.find_same_title(&title, &assignee.id).await?.is_some() {
            return Err(TaskError::DuplicateTask { title });
        }

        let task = self
            .tasks
            .create_task(TaskCreateInput {
                title,
                description: input.description,
                assigned_to: assignee.id,
                created_by: creator.id.clone(),
                priority: input.priority,
                due_date: input.due_date,
            })
            .await?;

        info!("Task {} created by {}", task.id, creator.id);
        Ok(task)
    }

    /// Tasks visible to `caller`, newest first
    pub async fn list_tasks(&self, caller: &Agent, query: TaskQuery) -> TaskResult<TaskPage> {
        let mut filter = TaskFilter {
            status: query.status,
            priority: query.priority,
            ..Default::default()
        };

        if caller.user_type == UserType::SubAgent {
            filter.assigned_to = Some(caller.id.clone());
        } else {
            filter.created_by = Some(caller.id.clone());
            if let Some(sub_agent_id) = query.assigned_to {
                // Unknown or foreign sub-agents are ignored rather than rejected
                if let Some(sub_agent) = self.agents.find_agent(&sub_agent_id).await? {
                    if sub_agent.is_sub_agent_of(&caller.id) {
                        filter.assigned_to = Some(sub_agent.id);
                    }
                }
            }
        }

        let (page, limit, offset) = page_bounds(query.page, query.limit, DEFAULT_PAGE_SIZE);
        let (tasks, total) = self
            .tasks
            .list_tasks(&filter, Some(limit), Some(offset))
            .await?;

        Ok(TaskPage {
            tasks,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn get_task(&self, caller: &Agent, task_id: &str) -> TaskResult<Task> {
        let task = self.visible_task(caller, task_id).await?;
        Ok(task)
    }

    /// Only the creator may edit a task
    pub async fn update_task(
        &self,
        caller: &Agent,
        task_id: &str,
        input: TaskUpdateInput,
    ) -> TaskResult<Task> {
        self.owned_task(caller, task_id).await?;

        if input.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return Err(TaskError::MissingTitle);
        }

        let task = self.tasks.update_task(task_id, input).await?;
        info!("Task {} updated by {}", task_id, caller.id);
        Ok(task)
    }

    pub async fn update_status(
        &self,
        caller: &Agent,
        task_id: &str,
        status: TaskStatus,
    ) -> TaskResult<Task> {
        self.visible_task(caller, task_id).await?;
        let task = self.tasks.update_status(task_id, status).await?;
        info!("Task {} moved to {:?} by {}", task_id, status, caller.id);
        Ok(task)
    }

    pub async fn delete_task(&self, caller: &Agent, task_id: &str) -> TaskResult<()> {
        self.owned_task(caller, task_id).await?;
        self.tasks.delete_task(task_id).await?;
        info!("Task {} deleted by {}", task_id, caller.id);
        Ok(())
    }

    /// All tasks with admin filters, page statistics and per-creator counts
    pub async fn admin_list(&self, query: AdminTaskQuery) -> TaskResult<AdminTaskPage> {
        let filter = TaskFilter {
            owner_agent: query.agent_id,
            assigned_to: query.sub_agent_id,
            status: query.status,
            priority: query.priority,
            is_duplicate: query.has_duplicates.filter(|flag| *flag),
            search: query.search,
            ..Default::default()
        };

        let (page, limit, offset) = page_bounds(query.page, query.limit, DEFAULT_ADMIN_PAGE_SIZE);
        let (tasks, total) = self
            .tasks
            .list_tasks(&filter, Some(limit), Some(offset))
            .await?;
        let statistics = self.tasks.statistics(&filter).await?;
        let upload_distribution = self.tasks.creator_distribution(&filter).await?;

        Ok(AdminTaskPage {
            tasks,
            statistics,
            upload_distribution,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn upload_batches(&self, query: BatchQuery) -> TaskResult<BatchListing> {
        let mut filter = TaskFilter {
            created_by: query.agent_id,
            ..Default::default()
        };

        if let Some(day) = query.date {
            let start = day
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive))
                .ok_or_else(|| TaskError::Internal(format!("Invalid date: {}", day)))?;
            filter.created_from = Some(start);
            filter.created_before = Some(start + Duration::days(1));
        }

        let (tasks, total) = self.tasks.list_tasks(&filter, None, None).await?;
        let batches = group_upload_batches(tasks, Duration::seconds(UPLOAD_BATCH_WINDOW_SECS));

        Ok(BatchListing {
            total_batches: batches.len(),
            total_tasks: total as usize,
            batches,
        })
    }

    /// Sub-agents see tasks assigned to them, everyone else tasks they created
    async fn visible_task(&self, caller: &Agent, task_id: &str) -> TaskResult<Task> {
        let task = self
            .tasks
            .find_task(task_id)
            .await?
            .ok_or_else(TaskError::task_not_found)?;

        let visible = match caller.user_type {
            UserType::SubAgent => task.assigned_to == caller.id,
            UserType::Agent | UserType::Admin => task.created_by == caller.id,
        };

        if visible {
            Ok(task)
        } else {
            Err(TaskError::task_not_found())
        }
    }

    async fn owned_task(&self, caller: &Agent, task_id: &str) -> TaskResult<Task> {
        match self.tasks.find_task(task_id).await? {
            Some(task) if task.created_by == caller.id => Ok(task),
            _ => Err(TaskError::task_not_found()),
        }
    }
}
