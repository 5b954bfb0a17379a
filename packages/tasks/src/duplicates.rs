// ABOUTME: System-wide duplicate detection and removal
// ABOUTME: Plans canonical/duplicate marks in memory and applies them in one transaction

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::{TaskError, TaskResult};
use crate::storage::TaskStorage;
use crate::types::{
    DetectionSummary, DuplicateCandidate, DuplicateMark, DuplicateReportEntry, RemovalSummary,
};

/// Compute the full set of duplicate marks for the given tasks.
///
/// Tasks are grouped by (normalized title, assignee). In every group with more
/// than one member the earliest `created_at` (then lowest `seq`) is canonical and
/// every other member is marked as a duplicate of it. No previous flag state is
/// consulted.
pub fn plan_duplicates(candidates: &[DuplicateCandidate]) -> (Vec<DuplicateMark>, DetectionSummary) {
    let mut groups: HashMap<(&str, &str), Vec<&DuplicateCandidate>> = HashMap::new();
    for candidate in candidates {
        groups
            .entry((candidate.title_key.as_str(), candidate.assigned_to.as_str()))
            .or_default()
            .push(candidate);
    }

    let mut summary = DetectionSummary::default();
    let mut marks = Vec::new();

    for members in groups.values_mut().filter(|members| members.len() > 1) {
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
        let canonical = members[0];

        summary.duplicate_groups += 1;
        summary.total_duplicates += members.len() - 1;

        marks.extend(members[1..].iter().map(|duplicate| {
            (
                duplicate.seq,
                DuplicateMark {
                    task_id: duplicate.id.clone(),
                    duplicate_of: canonical.id.clone(),
                },
            )
        }));
    }

    marks.sort_by_key(|(seq, _)| *seq);
    (marks.into_iter().map(|(_, mark)| mark).collect(), summary)
}

/// Detection, removal and reporting over the whole task store.
///
/// Detection and removal share one lock so a removal never interleaves with a
/// rewrite of the flags it acts on.
#[derive(Clone)]
pub struct DuplicateService {
    storage: TaskStorage,
    lock: Arc<Mutex<()>>,
}

impl DuplicateService {
    pub fn new(storage: TaskStorage) -> Self {
        Self {
            storage,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Recompute every duplicate flag from scratch
    pub async fn detect(&self) -> TaskResult<DetectionSummary> {
        let _guard = self.lock.lock().await;

        let candidates = self.storage.duplicate_candidates().await?;
        let (marks, summary) = plan_duplicates(&candidates);
        self.storage.apply_duplicate_marks(&marks).await?;

        info!(
            "Duplicate scan over {} tasks: {} groups, {} duplicates",
            candidates.len(),
            summary.duplicate_groups,
            summary.total_duplicates
        );
        Ok(summary)
    }

    /// Permanently delete every flagged duplicate; requires `confirm`
    pub async fn remove(&self, confirm: bool) -> TaskResult<RemovalSummary> {
        if !confirm {
            return Err(TaskError::ConfirmationRequired);
        }

        let _guard = self.lock.lock().await;
        let summary = self.storage.delete_duplicates().await?;

        info!(
            "Removed {} duplicate tasks, {} remaining",
            summary.removed, summary.remaining
        );
        Ok(summary)
    }

    pub async fn report(&self) -> TaskResult<Vec<DuplicateReportEntry>> {
        Ok(self.storage.duplicate_report().await?)
    }
}
