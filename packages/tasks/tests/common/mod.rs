// ABOUTME: Shared fixtures for task integration tests
// ABOUTME: In-memory database, agent hierarchy helpers and staged upload files

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tasklane_agents::{Agent, AgentCreateInput, AgentStorage, UserType};
use tasklane_storage::connect_in_memory;
use tasklane_tasks::{
    DuplicateService, Task, TaskCreateInput, TaskPriority, TaskService, TaskStorage,
    UploadService, UploadedFile,
};
use tempfile::TempDir;

pub struct Fixture {
    pub pool: SqlitePool,
    pub agents: AgentStorage,
    pub tasks: TaskStorage,
    pub duplicates: DuplicateService,
    pub upload_dir: TempDir,
}

pub async fn fixture() -> Fixture {
    let pool = connect_in_memory().await.unwrap();
    let tasks = TaskStorage::new(pool.clone());
    Fixture {
        agents: AgentStorage::new(pool.clone()),
        duplicates: DuplicateService::new(tasks.clone()),
        tasks,
        pool,
        upload_dir: TempDir::new().unwrap(),
    }
}

impl Fixture {
    pub async fn agent(&self, name: &str, user_type: UserType, parent: Option<&Agent>) -> Agent {
        self.agents
            .create_agent(AgentCreateInput {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                mobile: "+15550100".to_string(),
                user_type,
                parent_agent_id: parent.map(|p| p.id.clone()),
                created_by: parent.map(|p| p.id.clone()),
            })
            .await
            .unwrap()
    }

    pub async fn sub_agent(&self, name: &str, parent: &Agent) -> Agent {
        self.agent(name, UserType::SubAgent, Some(parent)).await
    }

    pub fn upload_service(&self) -> UploadService {
        UploadService::new(
            self.agents.clone(),
            self.tasks.clone(),
            self.duplicates.clone(),
        )
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(self.agents.clone(), self.tasks.clone())
    }

    pub fn csv(&self, body: &str) -> UploadedFile {
        UploadedFile::stage(
            self.upload_dir.path(),
            "tasks.csv",
            Some("text/csv".to_string()),
            body.as_bytes(),
        )
        .unwrap()
    }

    pub fn spreadsheet(&self, bytes: &[u8]) -> UploadedFile {
        UploadedFile::stage(
            self.upload_dir.path(),
            "tasks.xlsx",
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string()),
            bytes,
        )
        .unwrap()
    }

    /// Number of files still staged in the upload directory
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }

    pub async fn insert_task(&self, title: &str, assignee: &Agent, creator: &Agent) -> Task {
        self.tasks
            .create_task(TaskCreateInput {
                title: title.to_string(),
                description: String::new(),
                assigned_to: assignee.id.clone(),
                created_by: creator.id.clone(),
                priority: TaskPriority::Medium,
                due_date: None,
            })
            .await
            .unwrap()
    }

    pub async fn set_created_at(&self, task: &Task, created_at: DateTime<Utc>) {
        sqlx::query("UPDATE tasks SET created_at = ? WHERE id = ?")
            .bind(created_at)
            .bind(&task.id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    /// (id, is_duplicate, duplicate_of) for every task, ordered by id
    pub async fn flag_state(&self) -> Vec<(String, bool, Option<String>)> {
        sqlx::query_as("SELECT id, is_duplicate, duplicate_of FROM tasks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .unwrap()
    }

    pub async fn all_tasks(&self) -> Vec<Task> {
        self.tasks
            .list_tasks(&Default::default(), None, None)
            .await
            .unwrap()
            .0
    }
}
