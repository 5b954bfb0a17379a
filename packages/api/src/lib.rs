// ABOUTME: HTTP API layer for Tasklane providing REST endpoints and routing
// ABOUTME: Integration layer wiring agent, task and admin handlers onto shared state

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

pub mod admin_handlers;
pub mod agents_handlers;
pub mod auth;
pub mod db;
pub mod error;
pub mod health;
pub mod response;
pub mod sub_agents_handlers;
pub mod tasks_handlers;

pub use auth::AGENT_ID_HEADER;
pub use db::DbState;
pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;

/// Creates the agents API router (admin only)
pub fn create_agents_router() -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(agents_handlers::list_agents).post(agents_handlers::create_agent),
        )
        .route(
            "/{id}",
            get(agents_handlers::get_agent)
                .put(agents_handlers::update_agent)
                .delete(agents_handlers::delete_agent),
        )
}

/// Creates the sub-agents API router (agents only)
pub fn create_sub_agents_router() -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(sub_agents_handlers::list_sub_agents).post(sub_agents_handlers::create_sub_agent),
        )
        .route(
            "/{id}",
            get(sub_agents_handlers::get_sub_agent)
                .put(sub_agents_handlers::update_sub_agent)
                .delete(sub_agents_handlers::delete_sub_agent),
        )
}

/// Creates the tasks API router; `max_upload_bytes` bounds the upload body
pub fn create_tasks_router(max_upload_bytes: usize) -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(tasks_handlers::list_tasks).post(tasks_handlers::create_task),
        )
        .route(
            "/upload",
            post(tasks_handlers::upload_tasks).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/{id}",
            get(tasks_handlers::get_task)
                .put(tasks_handlers::update_task)
                .delete(tasks_handlers::delete_task),
        )
        .route("/{id}/status", put(tasks_handlers::update_task_status))
}

/// Creates the admin console router
pub fn create_admin_router() -> Router<DbState> {
    Router::new()
        .route("/tasks", get(admin_handlers::list_all_tasks))
        .route("/upload-batches", get(admin_handlers::list_upload_batches))
        .route("/duplicates/detect", post(admin_handlers::detect_duplicates))
        .route("/duplicates/remove", post(admin_handlers::remove_duplicates))
        .route("/duplicates/report", get(admin_handlers::duplicate_report))
}

/// Full `/api` surface bound to `state`
pub fn create_router(state: DbState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/agents", create_agents_router())
        .nest("/api/sub-agents", create_sub_agents_router())
        .nest("/api/tasks", create_tasks_router(max_upload_bytes))
        .nest("/api/admin", create_admin_router())
        .with_state(state)
}
