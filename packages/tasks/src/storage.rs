// ABOUTME: Task storage layer using SQLite
// ABOUTME: Handles task CRUD, filtered listing and the batched duplicate-flag rewrites

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::types::{
    title_key, CreatorLoad, DuplicateCandidate, DuplicateMark, DuplicateReportEntry,
    RemovalSummary, Task, TaskCreateInput, TaskFilter, TaskStatistics, TaskStatus,
    TaskUpdateInput,
};
use tasklane_core::generate_id;
use tasklane_storage::StorageError;

const TASK_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.assigned_to, a.name AS assignee_name,
        t.created_by, t.status, t.priority, t.due_date, t.is_duplicate,
        t.duplicate_of, t.created_at, t.updated_at
    FROM tasks t
    LEFT JOIN agents a ON a.id = t.assigned_to
"#;

#[derive(Clone)]
pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_task(&self, input: TaskCreateInput) -> Result<Task, StorageError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(StorageError::InvalidInput("Title is required".to_string()));
        }

        let task_id = generate_id("tsk");
        let now = Utc::now();

        debug!(
            "Creating task: {} assigned to {} by {}",
            task_id, input.assigned_to, input.created_by
        );

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, title, title_key, description, assigned_to, created_by,
                status, priority, due_date, is_duplicate, duplicate_of,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)
            "#,
        )
        .bind(&task_id)
        .bind(&title)
        .bind(title_key(&title))
        .bind(&input.description)
        .bind(&input.assigned_to)
        .bind(&input.created_by)
        .bind(TaskStatus::Pending)
        .bind(input.priority)
        .bind(input.due_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_task(&task_id).await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task, StorageError> {
        self.find_task(task_id).await?.ok_or(StorageError::NotFound)
    }

    pub async fn find_task(&self, task_id: &str) -> Result<Option<Task>, StorageError> {
        debug!("Fetching task: {}", task_id);

        let query = format!("{} WHERE t.id = ?", TASK_SELECT);
        let row = sqlx::query(&query)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_task).transpose()
    }

    /// List tasks matching `filter`, newest first, together with the unpaginated total
    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<Task>, i64), StorageError> {
        debug!(
            "Listing tasks (filter: {:?}, limit: {:?}, offset: {:?})",
            filter, limit, offset
        );

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks t");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut query = QueryBuilder::<Sqlite>::new(TASK_SELECT);
        push_filter(&mut query, filter);
        query.push(" ORDER BY t.created_at DESC, t.rowid DESC");
        if let Some(limit) = limit {
            query.push(" LIMIT ").push_bind(limit);
            if let Some(offset) = offset {
                query.push(" OFFSET ").push_bind(offset);
            }
        }

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let tasks = rows.iter().map(row_to_task).collect::<Result<Vec<_>, _>>()?;
        Ok((tasks, total))
    }

    pub async fn statistics(&self, filter: &TaskFilter) -> Result<TaskStatistics, StorageError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COUNT(*) AS total_tasks,
                COALESCE(SUM(CASE WHEN t.status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN t.status = 'in-progress' THEN 1 ELSE 0 END), 0) AS in_progress,
                COALESCE(SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN t.status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled,
                COALESCE(SUM(t.is_duplicate), 0) AS duplicates
            FROM tasks t
            "#,
        );
        push_filter(&mut query, filter);

        let row = query
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(TaskStatistics {
            total_tasks: row.try_get("total_tasks")?,
            pending: row.try_get("pending")?,
            in_progress: row.try_get("in_progress")?,
            completed: row.try_get("completed")?,
            cancelled: row.try_get("cancelled")?,
            duplicates: row.try_get("duplicates")?,
        })
    }

    /// Task counts per creator for the filtered set, largest first
    pub async fn creator_distribution(
        &self,
        filter: &TaskFilter,
    ) -> Result<Vec<CreatorLoad>, StorageError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                c.id AS agent_id,
                c.name AS agent_name,
                c.email AS agent_email,
                c.user_type AS user_type,
                COUNT(*) AS task_count
            FROM tasks t
            JOIN agents c ON c.id = t.created_by
            "#,
        );
        push_filter(&mut query, filter);
        query.push(" GROUP BY c.id, c.name, c.email, c.user_type ORDER BY task_count DESC, c.name");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| {
                Ok(CreatorLoad {
                    agent_id: row.try_get("agent_id")?,
                    agent_name: row.try_get("agent_name")?,
                    agent_email: row.try_get("agent_email")?,
                    user_type: row.try_get("user_type")?,
                    task_count: row.try_get("task_count")?,
                })
            })
            .collect()
    }

    pub async fn count_tasks(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn update_task(
        &self,
        task_id: &str,
        input: TaskUpdateInput,
    ) -> Result<Task, StorageError> {
        debug!("Updating task: {}", task_id);

        let title = match input.title.as_deref().map(str::trim) {
            Some("") => {
                return Err(StorageError::InvalidInput("Title is required".to_string()));
            }
            other => other.map(str::to_string),
        };

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                title_key = COALESCE(?, title_key),
                description = COALESCE(?, description),
                priority = COALESCE(?, priority),
                due_date = COALESCE(?, due_date),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(title.as_deref().map(title_key))
        .bind(&input.description)
        .bind(input.priority)
        .bind(input.due_date)
        .bind(Utc::now())
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_task(task_id).await
    }

    pub async fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Task, StorageError> {
        debug!("Updating status of task {} to {:?}", task_id, status);

        let result = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_task(task_id).await
    }

    /// Delete a task. When it is the canonical of a duplicate group, the
    /// earliest remaining duplicate becomes canonical and the rest point to it.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), StorageError> {
        debug!("Deleting task: {}", task_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let successor: Option<String> = sqlx::query_scalar(
            "SELECT id FROM tasks WHERE duplicate_of = ? ORDER BY created_at, rowid LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if let Some(successor) = successor {
            debug!("Promoting {} to canonical in place of {}", successor, task_id);

            sqlx::query("UPDATE tasks SET duplicate_of = ? WHERE duplicate_of = ? AND id != ?")
                .bind(&successor)
                .bind(task_id)
                .bind(&successor)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

            sqlx::query("UPDATE tasks SET is_duplicate = 0, duplicate_of = NULL WHERE id = ?")
                .bind(&successor)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(())
    }

    /// Oldest non-duplicate task with exactly this trimmed title and assignee.
    /// Case variants are left to the duplicate scan.
    pub async fn find_same_title(
        &self,
        title: &str,
        assigned_to: &str,
    ) -> Result<Option<Task>, StorageError> {
        let query = format!(
            r#"{}
            WHERE t.title = ?
            AND t.assigned_to = ?
            AND t.is_duplicate = 0
            ORDER BY t.created_at, t.rowid
            LIMIT 1
            "#,
            TASK_SELECT
        );

        let row = sqlx::query(&query)
            .bind(title.trim())
            .bind(assigned_to)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_task).transpose()
    }

    /// Key columns of every task, for a full duplicate recomputation
    pub async fn duplicate_candidates(&self) -> Result<Vec<DuplicateCandidate>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, title_key, assigned_to, created_at, rowid AS seq FROM tasks ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| {
                Ok(DuplicateCandidate {
                    id: row.try_get("id")?,
                    title_key: row.try_get("title_key")?,
                    assigned_to: row.try_get("assigned_to")?,
                    created_at: row.try_get("created_at")?,
                    seq: row.try_get("seq")?,
                })
            })
            .collect()
    }

    /// Clear every duplicate flag, then apply `marks`, in one transaction
    pub async fn apply_duplicate_marks(&self, marks: &[DuplicateMark]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let reset = sqlx::query(
            r#"
            UPDATE tasks
            SET is_duplicate = 0, duplicate_of = NULL
            WHERE is_duplicate = 1 OR duplicate_of IS NOT NULL
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        for mark in marks {
            sqlx::query("UPDATE tasks SET is_duplicate = 1, duplicate_of = ? WHERE id = ?")
                .bind(&mark.duplicate_of)
                .bind(&mark.task_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        debug!(
            "Duplicate flags rewritten: {} cleared, {} marked",
            reset.rows_affected(),
            marks.len()
        );
        Ok(())
    }

    /// Delete every flagged duplicate and clear leftover flags, in one transaction
    pub async fn delete_duplicates(&self) -> Result<RemovalSummary, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let removed = sqlx::query("DELETE FROM tasks WHERE is_duplicate = 1")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .rows_affected();

        sqlx::query("UPDATE tasks SET is_duplicate = 0, duplicate_of = NULL WHERE is_duplicate = 1")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(RemovalSummary { removed, remaining })
    }

    /// Flagged duplicates with their canonical originals, newest first
    pub async fn duplicate_report(&self) -> Result<Vec<DuplicateReportEntry>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT
                d.id AS task_id,
                d.title AS title,
                d.assigned_to AS assignee_id,
                a.name AS assignee_name,
                d.created_at AS created_at,
                o.id AS original_id,
                o.title AS original_title,
                o.created_at AS original_created_at
            FROM tasks d
            JOIN agents a ON a.id = d.assigned_to
            LEFT JOIN tasks o ON o.id = d.duplicate_of
            WHERE d.is_duplicate = 1
            ORDER BY d.created_at DESC, d.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| {
                Ok(DuplicateReportEntry {
                    task_id: row.try_get("task_id")?,
                    title: row.try_get("title")?,
                    assignee_id: row.try_get("assignee_id")?,
                    assigned_to: row.try_get("assignee_name")?,
                    created_at: row.try_get("created_at")?,
                    original_id: row.try_get("original_id")?,
                    original_title: row.try_get("original_title")?,
                    original_created_at: row.try_get("original_created_at")?,
                })
            })
            .collect()
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &TaskFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(created_by) = &filter.created_by {
        query.push(" AND t.created_by = ").push_bind(created_by.clone());
    }
    if let Some(assigned_to) = &filter.assigned_to {
        query.push(" AND t.assigned_to = ").push_bind(assigned_to.clone());
    }
    if let Some(owner) = &filter.owner_agent {
        query
            .push(" AND (t.created_by = ")
            .push_bind(owner.clone())
            .push(" OR t.assigned_to IN (SELECT id FROM agents WHERE parent_agent_id = ")
            .push_bind(owner.clone())
            .push("))");
    }
    if let Some(status) = filter.status {
        query.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        query.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(is_duplicate) = filter.is_duplicate {
        query.push(" AND t.is_duplicate = ").push_bind(is_duplicate);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        query
            .push(" AND (lower(t.title) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(t.description) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filter.created_from {
        query.push(" AND t.created_at >= ").push_bind(from);
    }
    if let Some(before) = filter.created_before {
        query.push(" AND t.created_at < ").push_bind(before);
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task, StorageError> {
    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        assigned_to: row.try_get("assigned_to")?,
        assignee_name: row.try_get("assignee_name")?,
        created_by: row.try_get("created_by")?,
        status: row.try_get("status")?,
        priority: row.try_get("priority")?,
        due_date: row.try_get("due_date")?,
        is_duplicate: row.try_get("is_duplicate")?,
        duplicate_of: row.try_get("duplicate_of")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
