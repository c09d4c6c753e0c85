/// Task model and database operations
///
/// Tasks are the second level of the Project → Task → Subtask hierarchy. Each
/// task belongs to exactly one project, records who created it and may be
/// assigned to one accepted participant of that project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE work_status AS ENUM ('pending', 'in_progress', 'completed', 'blocked');
/// CREATE TYPE priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE NOT NULL,
///     status work_status NOT NULL DEFAULT 'pending',
///     priority priority NOT NULL DEFAULT 'medium',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a task cascades to its subtasks.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Priority, Task, WorkStatus};
/// use chrono::NaiveDate;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, admin_id: Uuid, member_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     name: "Write copy".to_string(),
///     description: None,
///     creator_id: admin_id,
///     assignee_id: Some(member_id),
///     due_date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
///     status: WorkStatus::Pending,
///     priority: Priority::High,
/// }).await?;
///
/// let tasks = Task::list_by_project(&pool, project_id).await?;
/// assert!(tasks.iter().any(|t| t.id == task.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Progress status shared by tasks and subtasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Not started (default)
    #[default]
    Pending,

    /// Someone is working on it
    InProgress,

    /// Done
    Completed,

    /// Waiting on something outside the assignee's control
    Blocked,
}

impl WorkStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Pending => "pending",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
            WorkStatus::Blocked => "blocked",
        }
    }
}

/// Priority shared by tasks and subtasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,

    /// Default for new work items
    #[default]
    Medium,

    High,
    Urgent,
}

impl Priority {
    /// Converts priority to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub name: String,
    pub description: Option<String>,

    /// User who created the task
    pub creator_id: Uuid,

    /// Accepted participant responsible for the task
    pub assignee_id: Option<Uuid>,

    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task joined with creator and assignee names, for project pages
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskDetail {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub assignee_id: Option<Uuid>,
    pub assignee_name: Option<String>,
    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
}

/// Input for editing a task
///
/// All fields are written; `assignee_id: None` unassigns the task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if the project, creator or assignee does not exist
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks
                (project_id, name, description, creator_id, assignee_id, due_date, status, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, project_id, name, description, creator_id, assignee_id,
                      due_date, status, priority, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .bind(data.due_date)
        .bind(data.status)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task that belongs to the given project
    ///
    /// # Returns
    ///
    /// `None` if the task does not exist or belongs to another project
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, name, description, creator_id, assignee_id,
                   due_date, status, priority, created_at, updated_at
            FROM tasks
            WHERE id = $2 AND project_id = $1
            "#,
        )
        .bind(project_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks, soonest due date first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskDetail>(
            r#"
            SELECT t.id, t.project_id, t.name, t.description,
                   t.creator_id, creator.name AS creator_name,
                   t.assignee_id, assignee.name AS assignee_name,
                   t.due_date, t.status, t.priority, t.created_at, t.updated_at
            FROM tasks t
            INNER JOIN users creator ON creator.id = t.creator_id
            LEFT JOIN users assignee ON assignee.id = t.assignee_id
            WHERE t.project_id = $1
            ORDER BY t.due_date ASC, t.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task's editable fields
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTask) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = $2, description = $3, assignee_id = $4, due_date = $5,
                status = $6, priority = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, name, description, creator_id, assignee_id,
                      due_date, status, priority, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.assignee_id)
        .bind(data.due_date)
        .bind(data.status)
        .bind(data.priority)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task and its subtasks
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(WorkStatus::default(), WorkStatus::Pending);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_work_status_form_values() {
        let status: WorkStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, WorkStatus::InProgress);
        assert_eq!(status.as_str(), "in_progress");
        assert!(serde_json::from_str::<WorkStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::High < Priority::Urgent);
        assert_eq!(Priority::Urgent.as_str(), "urgent");
    }
}
