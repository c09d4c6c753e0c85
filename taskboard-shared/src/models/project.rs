/// Project model and database operations
///
/// A project is the root of the Project → Task → Subtask hierarchy. The user
/// who creates a project owns it and is recorded as its first participant,
/// with the `admin` role and an `accepted` invitation status.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('active', 'on_hold', 'completed', 'cancelled');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     due_date DATE NOT NULL,
///     status project_status NOT NULL DEFAULT 'active',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a project cascades to its participants, tasks and subtasks.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::{CreateProject, Project};
/// use chrono::NaiveDate;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let project = Project::create_with_owner(&pool, CreateProject {
///     name: "Website relaunch".to_string(),
///     description: "New landing page and blog".to_string(),
///     due_date: NaiveDate::from_ymd_opt(2030, 6, 30).unwrap(),
///     owner_id: user_id,
/// }).await?;
///
/// // The owner can see it straight away
/// let visible = Project::list_for_member(&pool, user_id).await?;
/// assert!(visible.iter().any(|p| p.id == project.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::participant::ProjectRole;

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Work is ongoing (default for new projects)
    #[default]
    Active,

    /// Temporarily paused
    OnHold,

    /// Finished
    Completed,

    /// Abandoned
    Cancelled,
}

impl ProjectStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Delivery date
    pub due_date: NaiveDate,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// User who created the project
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project as seen by one of its accepted participants
///
/// Used by the project list and the project details header.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: ProjectStatus,
    pub owner_id: Uuid,

    /// Display name of the owner
    pub owner_name: String,

    /// Role of the viewing user in this project
    pub role: ProjectRole,
}

impl ProjectSummary {
    /// Whether the viewing user administers this project
    pub fn is_admin(&self) -> bool {
        self.role == ProjectRole::Admin
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub due_date: NaiveDate,

    /// Creator, who becomes the project admin
    pub owner_id: Uuid,
}

/// Input for editing a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: ProjectStatus,
}

impl Project {
    /// Creates a project and enrols its creator as accepted admin
    ///
    /// Both inserts run in one transaction: a project never exists without
    /// its admin participant.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - Project creation data
    ///
    /// # Returns
    ///
    /// The newly created project
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist or the database fails.
    /// Nothing is written in that case.
    pub async fn create_with_owner(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, due_date, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, due_date, status, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.description.trim())
        .bind(data.due_date)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO project_participants
                (project_id, user_id, role, status, invited_by, joined_at)
            VALUES ($1, $2, 'admin', 'accepted', $2, NOW())
            "#,
        )
        .bind(project.id)
        .bind(data.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID without any visibility check
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, due_date, status, owner_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project if the user is an accepted participant
    ///
    /// # Returns
    ///
    /// The project with the viewer's role, or `None` if the project does not
    /// exist or the user has not accepted an invitation to it
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskboard_shared::models::project::Project;
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// match Project::find_for_member(&pool, project_id, user_id).await? {
    ///     Some(project) if project.is_admin() => println!("You administer {}", project.name),
    ///     Some(project) => println!("You participate in {}", project.name),
    ///     None => println!("Not visible"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_for_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectSummary>, sqlx::Error> {
        let project = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT p.id, p.name, p.description, p.due_date, p.status, p.owner_id,
                   owner.name AS owner_name, pp.role
            FROM projects p
            INNER JOIN project_participants pp
                ON pp.project_id = p.id AND pp.user_id = $2 AND pp.status = 'accepted'
            INNER JOIN users owner ON owner.id = p.owner_id
            WHERE p.id = $1
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists the projects a user has joined, soonest due date first
    pub async fn list_for_member(pool: &PgPool, user_id: Uuid) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let projects = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT p.id, p.name, p.description, p.due_date, p.status, p.owner_id,
                   owner.name AS owner_name, pp.role
            FROM projects p
            INNER JOIN project_participants pp
                ON pp.project_id = p.id AND pp.user_id = $1 AND pp.status = 'accepted'
            INNER JOIN users owner ON owner.id = p.owner_id
            ORDER BY p.due_date ASC, p.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates a project's editable fields
    ///
    /// # Returns
    ///
    /// The updated project, or `None` if it no longer exists
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $2, description = $3, due_date = $4, status = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, due_date, status, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.description.trim())
        .bind(data.due_date)
        .bind(data.status)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project together with its participants, tasks and subtasks
    ///
    /// # Returns
    ///
    /// True if the project was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
