/// Subtask model and database operations
///
/// Subtasks hang off a task and share its status and priority vocabulary.
/// They are always addressed through their project and task so a subtask can
/// never be reached through a project it does not belong to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::{Priority, WorkStatus};

/// Subtask row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subtask joined with creator and assignee names
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubtaskDetail {
    pub id: Uuid,
    pub task_id: Uuid,
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubtask {
    pub task_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSubtask {
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
}

impl Subtask {
    pub async fn create(pool: &PgPool, data: CreateSubtask) -> Result<Self, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(
            r#"
            INSERT INTO subtasks
                (task_id, name, description, creator_id, assignee_id, due_date, status, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, task_id, name, description, creator_id, assignee_id,
                      due_date, status, priority, created_at, updated_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .bind(data.due_date)
        .bind(data.status)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(subtask)
    }

    /// Finds a subtask through its full path
    ///
    /// Returns `None` unless the subtask belongs to `task_id` and that task
    /// belongs to `project_id`.
    pub async fn find_in_task(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(
            r#"
            SELECT s.id, s.task_id, s.name, s.description, s.creator_id, s.assignee_id,
                   s.due_date, s.status, s.priority, s.created_at, s.updated_at
            FROM subtasks s
            INNER JOIN tasks t ON t.id = s.task_id
            WHERE s.id = $3 AND s.task_id = $2 AND t.project_id = $1
            "#,
        )
        .bind(project_id)
        .bind(task_id)
        .bind(subtask_id)
        .fetch_optional(pool)
        .await?;

        Ok(subtask)
    }

    /// Lists the subtasks of several tasks in one round trip, soonest due first
    pub async fn list_by_tasks(pool: &PgPool, task_ids: &[Uuid]) -> Result<Vec<SubtaskDetail>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let subtasks = sqlx::query_as::<_, SubtaskDetail>(
            r#"
            SELECT s.id, s.task_id, s.name, s.description,
                   s.creator_id, creator.name AS creator_name,
                   s.assignee_id, assignee.name AS assignee_name,
                   s.due_date, s.status, s.priority, s.created_at
            FROM subtasks s
            INNER JOIN users creator ON creator.id = s.creator_id
            LEFT JOIN users assignee ON assignee.id = s.assignee_id
            WHERE s.task_id = ANY($1)
            ORDER BY s.due_date ASC, s.created_at ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        Ok(subtasks)
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateSubtask) -> Result<Option<Self>, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(
            r#"
            UPDATE subtasks
            SET name = $2, description = $3, assignee_id = $4, due_date = $5,
                status = $6, priority = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, task_id, name, description, creator_id, assignee_id,
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

        Ok(subtask)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
