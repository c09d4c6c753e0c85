/// Project participant model and database operations
///
/// A participant row links a user to a project with a role and an invitation
/// status. Only `accepted` participants can see a project and its work items;
/// `pending` rows are open invitations and `rejected` rows can be re-invited.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('admin', 'member');
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'rejected');
///
/// CREATE TABLE project_participants (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'member',
///     status invitation_status NOT NULL DEFAULT 'pending',
///     invited_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     invited_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     joined_at TIMESTAMPTZ,
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # State machine
///
/// ```text
/// (none) --invite--> pending --accept--> accepted
///                       |
///                       +----reject--> rejected --reinvite--> pending
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::participant::Participant;
/// use sqlx::{PgExecutor, PgPool};
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, admin_id: Uuid, invitee_id: Uuid) -> Result<(), sqlx::Error> {
/// Participant::invite(&pool, project_id, invitee_id, admin_id).await?;
///
/// // Only the first answer counts
/// assert!(Participant::accept(&pool, project_id, invitee_id).await?);
/// assert!(!Participant::reject(&pool, project_id, invitee_id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Role of a participant within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Manages the project: edit, delete, invite, create tasks
    Admin,

    /// Works on tasks they created or were assigned
    Member,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::Member => "member",
        }
    }

    /// Can edit, delete and invite people to the project
    pub fn can_manage_project(&self) -> bool {
        matches!(self, ProjectRole::Admin)
    }

    /// Can create top-level tasks
    pub fn can_create_tasks(&self) -> bool {
        matches!(self, ProjectRole::Admin)
    }
}

/// Invitation status of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Rejected => "rejected",
        }
    }
}

/// Participant row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub status: InvitationStatus,

    /// Who sent the invitation (the creator for the admin row)
    pub invited_by: Option<Uuid>,

    pub invited_at: DateTime<Utc>,

    /// When the invitation was accepted
    pub joined_at: Option<DateTime<Utc>>,
}

/// Participant joined with user details, for project pages
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipantDetail {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: ProjectRole,
    pub status: InvitationStatus,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// An open invitation addressed to a user, for the notifications page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingInvitation {
    pub project_id: Uuid,
    pub project_name: String,

    /// Display name of the project owner
    pub owner_name: String,

    pub invited_at: DateTime<Utc>,
}

impl Participant {
    /// Finds the participant row for a (project, user) pair, whatever its status
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT project_id, user_id, role, status, invited_by, invited_at, joined_at
            FROM project_participants
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(participant)
    }

    /// Gets the role of an accepted participant
    ///
    /// # Returns
    ///
    /// The role, or `None` if the user is not an accepted participant
    pub async fn get_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_participants
            WHERE project_id = $1 AND user_id = $2 AND status = 'accepted'
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Checks whether a user has accepted an invitation to the project
    pub async fn is_accepted(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_participants
                WHERE project_id = $1 AND user_id = $2 AND status = 'accepted'
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Creates a pending `member` invitation
    ///
    /// # Errors
    ///
    /// Returns a primary key violation if the user already has a row for
    /// this project; callers check [`Participant::find`] first.
    pub async fn invite<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
        invited_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO project_participants (project_id, user_id, role, status, invited_by)
            VALUES ($1, $2, 'member', 'pending', $3)
            RETURNING project_id, user_id, role, status, invited_by, invited_at, joined_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(invited_by)
        .fetch_one(executor)
        .await?;

        Ok(participant)
    }

    /// Turns a rejected invitation back into a pending one
    ///
    /// # Returns
    ///
    /// True if a rejected row was reset, false otherwise
    pub async fn reinvite<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
        invited_by: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE project_participants
            SET status = 'pending', invited_by = $3, invited_at = NOW(), joined_at = NULL
            WHERE project_id = $1 AND user_id = $2 AND status = 'rejected'
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(invited_by)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Accepts a pending invitation
    ///
    /// # Returns
    ///
    /// False if there was no pending invitation (never sent or already answered)
    pub async fn accept<'e, E>(executor: E, project_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE project_participants
            SET status = 'accepted', joined_at = NOW()
            WHERE project_id = $1 AND user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rejects a pending invitation
    ///
    /// # Returns
    ///
    /// False if there was no pending invitation (never sent or already answered)
    pub async fn reject<'e, E>(executor: E, project_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE project_participants
            SET status = 'rejected'
            WHERE project_id = $1 AND user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists every participant of a project, whatever their status
    ///
    /// Admins come first, then everyone else in invitation order.
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<ParticipantDetail>, sqlx::Error> {
        let participants = sqlx::query_as::<_, ParticipantDetail>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, u.avatar_url,
                   pp.role, pp.status, pp.invited_at, pp.joined_at
            FROM project_participants pp
            INNER JOIN users u ON u.id = pp.user_id
            WHERE pp.project_id = $1
            ORDER BY pp.role ASC, pp.invited_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }

    /// Lists accepted participants (the people work can be assigned to)
    pub async fn list_accepted(pool: &PgPool, project_id: Uuid) -> Result<Vec<ParticipantDetail>, sqlx::Error> {
        let participants = sqlx::query_as::<_, ParticipantDetail>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, u.avatar_url,
                   pp.role, pp.status, pp.invited_at, pp.joined_at
            FROM project_participants pp
            INNER JOIN users u ON u.id = pp.user_id
            WHERE pp.project_id = $1 AND pp.status = 'accepted'
            ORDER BY u.name ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }

    /// Lists the open invitations addressed to a user, newest first
    pub async fn list_pending_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<PendingInvitation>, sqlx::Error> {
        let invitations = sqlx::query_as::<_, PendingInvitation>(
            r#"
            SELECT p.id AS project_id, p.name AS project_name,
                   owner.name AS owner_name, pp.invited_at
            FROM project_participants pp
            INNER JOIN projects p ON p.id = pp.project_id
            INNER JOIN users owner ON owner.id = p.owner_id
            WHERE pp.user_id = $1 AND pp.status = 'pending'
            ORDER BY pp.invited_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(invitations)
    }

    /// Counts the open invitations addressed to a user
    pub async fn count_pending_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM project_participants WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
