// ABOUTME: Shared application state for API handlers
// ABOUTME: Wraps the SQLite pool together with the agent storage and task services

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::debug;

use tasklane_agents::AgentStorage;
use tasklane_tasks::{DuplicateService, TaskService, TaskStorage, UploadService};

/// Shared database state for API handlers
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub agent_storage: Arc<AgentStorage>,
    pub task_service: Arc<TaskService>,
    pub upload_service: Arc<UploadService>,
    pub duplicate_service: Arc<DuplicateService>,
    /// Where multipart uploads are staged before parsing
    pub upload_dir: PathBuf,
}

impl DbState {
    pub fn new(pool: SqlitePool, upload_dir: PathBuf) -> Self {
        let agent_storage = AgentStorage::new(pool.clone());
        let task_storage = TaskStorage::new(pool.clone());
        let duplicate_service = DuplicateService::new(task_storage.clone());

        let task_service = TaskService::new(agent_storage.clone(), task_storage.clone());
        let upload_service = UploadService::new(
            agent_storage.clone(),
            task_storage,
            duplicate_service.clone(),
        );

        debug!("API state ready (uploads staged in {})", upload_dir.display());

        Self {
            pool,
            agent_storage: Arc::new(agent_storage),
            task_service: Arc::new(task_service),
            upload_service: Arc::new(upload_service),
            duplicate_service: Arc::new(duplicate_service),
            upload_dir,
        }
    }
}
