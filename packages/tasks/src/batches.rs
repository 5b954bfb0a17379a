// ABOUTME: Reconstruction of upload batches from task creation times
// ABOUTME: Groups consecutive tasks by the same creator created within a short window

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::Task;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatch {
    pub batch_id: String,
    pub upload_time: DateTime<Utc>,
    pub creator_id: String,
    pub task_count: usize,
    pub tasks: Vec<Task>,
}

/// Group `tasks` (already ordered newest first) into batches.
///
/// A task joins the current batch when it has the same creator as the previous
/// task and was created less than `window` apart from it.
pub fn group_upload_batches(tasks: Vec<Task>, window: Duration) -> Vec<UploadBatch> {
    let mut batches: Vec<UploadBatch> = Vec::new();
    let mut current: Vec<Task> = Vec::new();

    for task in tasks {
        let joins = current.last().is_some_and(|previous| {
            previous.created_by == task.created_by
                && (task.created_at - previous.created_at).abs() < window
        });

        if !joins && !current.is_empty() {
            let finished = std::mem::take(&mut current);
            batches.push(close_batch(batches.len() + 1, finished));
        }
        current.push(task);
    }

    if !current.is_empty() {
        batches.push(close_batch(batches.len() + 1, current));
    }

    batches
}

fn close_batch(number: usize, tasks: Vec<Task>) -> UploadBatch {
    let first = &tasks[0];
    UploadBatch {
        batch_id: format!("batch_{}", number),
        upload_time: first.created_at,
        creator_id: first.created_by.clone(),
        task_count: tasks.len(),
        tasks,
    }
}
