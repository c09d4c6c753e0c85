/// Notification model and database operations
///
/// Notifications are short in-app messages addressed to one user. They are
/// produced as side effects of invitations and assignments and are shown on
/// the notifications page, newest first.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_kind AS ENUM (
///     'project_invitation', 'invitation_accepted', 'invitation_rejected',
///     'task_assigned', 'subtask_assigned'
/// );
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     recipient_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     sender_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     kind notification_kind NOT NULL,
///     message TEXT NOT NULL,
///     reference_id UUID,
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `reference_id` points at the project for invitation kinds and at the
/// project for assignment kinds as well, so every notification links to a
/// project page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone invited the recipient to a project
    ProjectInvitation,

    /// An invitee accepted an invitation to the recipient's project
    InvitationAccepted,

    /// An invitee rejected an invitation to the recipient's project
    InvitationRejected,

    /// A task was assigned to the recipient
    TaskAssigned,

    /// A subtask was assigned to the recipient
    SubtaskAssigned,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ProjectInvitation => "project_invitation",
            NotificationKind::InvitationAccepted => "invitation_accepted",
            NotificationKind::InvitationRejected => "invitation_rejected",
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::SubtaskAssigned => "subtask_assigned",
        }
    }
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,

    /// Project the notification links to
    pub reference_id: Option<Uuid>,

    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification joined with the sender's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationDetail {
    pub id: Uuid,
    pub sender_id: Option<Uuid>,
    pub sender_name: Option<String>,
    pub kind: NotificationKind,
    pub message: String,
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub reference_id: Option<Uuid>,
}

impl Notification {
    /// Creates an unread notification
    ///
    /// Takes any executor so it can join a caller's transaction.
    pub async fn create<'e, E>(executor: E, data: CreateNotification) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_id, sender_id, kind, message, reference_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recipient_id, sender_id, kind, message, reference_id, read, created_at
            "#,
        )
        .bind(data.recipient_id)
        .bind(data.sender_id)
        .bind(data.kind)
        .bind(data.message)
        .bind(data.reference_id)
        .fetch_one(executor)
        .await?;

        Ok(notification)
    }

    /// Lists a user's notifications, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<NotificationDetail>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, NotificationDetail>(
            r#"
            SELECT n.id, n.sender_id, sender.name AS sender_name, n.kind, n.message,
                   n.reference_id, n.read, n.created_at
            FROM notifications n
            LEFT JOIN users sender ON sender.id = n.sender_id
            WHERE n.recipient_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Counts a user's unread notifications
    pub async fn count_unread(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks one notification read
    ///
    /// # Returns
    ///
    /// False if the notification does not exist or belongs to someone else
    pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the invitation notifications for one project read
    ///
    /// Called once the recipient has answered the invitation.
    pub async fn mark_invitation_read<'e, E>(
        executor: E,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE recipient_id = $1 AND reference_id = $2
              AND kind = 'project_invitation' AND read = FALSE
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
