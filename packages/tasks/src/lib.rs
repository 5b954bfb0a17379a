// ABOUTME: Task distribution, bulk import and duplicate management
// ABOUTME: Parses uploads, round-robins rows to sub-agents and keeps duplicate flags consistent

pub mod batches;
pub mod distribution;
pub mod duplicates;
pub mod error;
pub mod import;
pub mod service;
pub mod storage;
pub mod types;
pub mod upload;

pub use batches::{group_upload_batches, UploadBatch};
pub use distribution::{assignee_for, eligible_assignees};
pub use duplicates::{plan_duplicates, DuplicateService};
pub use error::{RowError, RowFailure, TaskError, TaskResult};
pub use import::{parse_upload, FileKind, Row, TaskCandidate, UploadedFile};
pub use service::{
    AdminTaskPage, AdminTaskQuery, BatchListing, BatchQuery, NewTask, Pagination, TaskPage,
    TaskQuery, TaskService,
};
pub use storage::TaskStorage;
pub use types::*;
pub use upload::{AssigneeLoad, UploadReport, UploadService, UploadState};
