// ABOUTME: Bulk upload orchestration
// ABOUTME: Drives parse, normalize, assign, per-row duplicate check and persistence into a report

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::distribution::{assignee_for, eligible_assignees};
use crate::duplicates::DuplicateService;
use crate::error::{RowError, RowFailure, TaskError, TaskResult};
use crate::import::{normalize_row, parse_upload, Row, UploadedFile};
use crate::storage::TaskStorage;
use crate::types::{Task, TaskCreateInput};
use tasklane_agents::{Agent, AgentStorage, UserType};
use tasklane_core::PREVIEW_LIMIT;

/// Stages of one upload. `Completed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    ReceivingFile,
    Parsing,
    ResolvingAssignees,
    ProcessingRows,
    ReconcilingDuplicates,
    Reporting,
    Completed,
    Rejected,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::ReceivingFile => "receiving-file",
            UploadState::Parsing => "parsing",
            UploadState::ResolvingAssignees => "resolving-assignees",
            UploadState::ProcessingRows => "processing-rows",
            UploadState::ReconcilingDuplicates => "reconciling-duplicates",
            UploadState::Reporting => "reporting",
            UploadState::Completed => "completed",
            UploadState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeLoad {
    pub agent_id: String,
    pub agent: String,
    pub tasks_assigned: usize,
}

/// Outcome of a completed upload, including partial row failures
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub message: String,
    pub total_processed: usize,
    pub successful: usize,
    pub duplicates: usize,
    pub errors_count: usize,
    pub distribution: Vec<AssigneeLoad>,
    pub preview_tasks: Vec<Task>,
    pub preview_errors: Vec<String>,
    /// Every row failure, in row order
    #[serde(skip)]
    pub failures: Vec<RowFailure>,
}

#[derive(Default)]
struct RowOutcomes {
    created: Vec<Task>,
    failures: Vec<RowFailure>,
    duplicates: usize,
}

#[derive(Clone)]
pub struct UploadService {
    agents: AgentStorage,
    tasks: TaskStorage,
    duplicates: DuplicateService,
}

impl UploadService {
    pub fn new(agents: AgentStorage, tasks: TaskStorage, duplicates: DuplicateService) -> Self {
        Self {
            agents,
            tasks,
            duplicates,
        }
    }

    /// Import every row of `upload` as a task created by `creator_id`.
    ///
    /// Format and assignee problems reject the whole upload before any row is
    /// written. Row-level problems are collected into the report.
    pub async fn upload_tasks(
        &self,
        upload: UploadedFile,
        creator_id: &str,
    ) -> TaskResult<UploadReport> {
        match self.run(upload, creator_id).await {
            Ok(report) => {
                debug!(creator = %creator_id, state = %UploadState::Completed, "Upload finished");
                Ok(report)
            }
            Err(e) => {
                warn!(creator = %creator_id, state = %UploadState::Rejected, error = %e, "Upload rejected");
                Err(e)
            }
        }
    }

    async fn run(&self, upload: UploadedFile, creator_id: &str) -> TaskResult<UploadReport> {
        enter(UploadState::ReceivingFile, creator_id);
        let creator = self
            .agents
            .find_agent(creator_id)
            .await?
            .ok_or_else(|| TaskError::CreatorNotFound(creator_id.to_string()))?;

        enter(UploadState::Parsing, creator_id);
        let rows = tokio::task::spawn_blocking(move || parse_upload(upload))
            .await
            .map_err(|e| TaskError::Internal(format!("Upload parser panicked: {}", e)))??;

        enter(UploadState::ResolvingAssignees, creator_id);
        let assignees = self.resolve_assignees(&creator).await?;
        if assignees.is_empty() {
            return Err(TaskError::NoEligibleAssignees);
        }

        info!(
            "Distributing {} rows among {} assignee(s) for {}",
            rows.len(),
            assignees.len(),
            creator.id
        );

        enter(UploadState::ProcessingRows, creator_id);
        let outcomes = self.process_rows(&rows, &assignees, &creator).await;

        if !outcomes.created.is_empty() {
            enter(UploadState::ReconcilingDuplicates, creator_id);
            if let Err(e) = self.duplicates.detect().await {
                warn!("Duplicate reconciliation after upload failed: {}", e);
            }
        }

        enter(UploadState::Reporting, creator_id);
        Ok(build_report(rows.len(), &assignees, outcomes))
    }

    async fn resolve_assignees(&self, creator: &Agent) -> TaskResult<Vec<Agent>> {
        let pool = match creator.user_type {
            UserType::Agent => self.agents.list_sub_agents(&creator.id, true).await?,
            UserType::SubAgent | UserType::Admin => Vec::new(),
        };
        Ok(eligible_assignees(creator, &pool))
    }

    /// Rows run strictly in order: each row's duplicate check must see the rows
    /// persisted before it.
    async fn process_rows(&self, rows: &[Row], assignees: &[Agent], creator: &Agent) -> RowOutcomes {
        let mut outcomes = RowOutcomes::default();

        for (index, row) in rows.iter().enumerate() {
            let candidate = match normalize_row(row) {
                Ok(candidate) => candidate,
                Err(e) => {
                    outcomes.failures.push(RowFailure::new(index, e));
                    continue;
                }
            };

            let Some(assignee) = assignee_for(index, assignees) else {
                continue;
            };

            match self.tasks.find_same_title(&candidate.title, &assignee.id).await {
                Ok(Some(_)) => {
                    outcomes.duplicates += 1;
                    outcomes.failures.push(RowFailure::new(
                        index,
                        RowError::DuplicateRow {
                            title: candidate.title,
                            assignee: assignee.name.clone(),
                        },
                    ));
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Duplicate lookup failed for row {}: {}", index + 1, e);
                    outcomes
                        .failures
                        .push(RowFailure::new(index, RowError::Storage(e.to_string())));
                    continue;
                }
            }

            let input = TaskCreateInput {
                title: candidate.title,
                description: candidate.description,
                assigned_to: assignee.id.clone(),
                created_by: creator.id.clone(),
                priority: candidate.priority,
                due_date: candidate.due_date,
            };

            match self.tasks.create_task(input).await {
                Ok(task) => {
                    debug!("Task \"{}\" assigned to {}", task.title, assignee.name);
                    outcomes.created.push(task);
                }
                Err(e) => {
                    warn!("Failed to create task for row {}: {}", index + 1, e);
                    outcomes
                        .failures
                        .push(RowFailure::new(index, RowError::Storage(e.to_string())));
                }
            }
        }

        outcomes
    }
}

fn enter(state: UploadState, creator_id: &str) {
    debug!(creator = %creator_id, state = %state, "Upload state");
}

fn build_report(total_rows: usize, assignees: &[Agent], outcomes: RowOutcomes) -> UploadReport {
    let distribution = assignees
        .iter()
        .map(|agent| AssigneeLoad {
            agent_id: agent.id.clone(),
            agent: agent.name.clone(),
            tasks_assigned: outcomes
                .created
                .iter()
                .filter(|task| task.assigned_to == agent.id)
                .count(),
        })
        .collect();

    UploadReport {
        message: format!(
            "Bulk upload completed! Distributed {} tasks among {} sub-agent(s)",
            outcomes.created.len(),
            assignees.len()
        ),
        total_processed: total_rows,
        successful: outcomes.created.len(),
        duplicates: outcomes.duplicates,
        errors_count: outcomes.failures.len(),
        distribution,
        preview_tasks: outcomes.created.iter().take(PREVIEW_LIMIT).cloned().collect(),
        preview_errors: outcomes
            .failures
            .iter()
            .take(PREVIEW_LIMIT)
            .map(ToString::to_string)
            .collect(),
        failures: outcomes.failures,
    }
}
