/// Notification pages and the badge counter
///
/// # Endpoints
///
/// - `GET /notifications` - Pending invitations and notifications, newest first
/// - `POST /notifications/:notification_id/read` - Mark one notification read
/// - `GET /api/notifications/count` - `{"count": n}` for the navigation badge

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    flash::take_flash,
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::{
        notification::{CreateNotification, Notification, NotificationDetail, NotificationKind},
        participant::{Participant, PendingInvitation},
    },
};
use uuid::Uuid;

/// Notifications page view
#[derive(Debug, Serialize)]
pub struct NotificationsView {
    pub flash: Option<String>,
    pub invitations: Vec<PendingInvitation>,
    pub notifications: Vec<NotificationDetail>,
}

/// Badge counter response
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationCount {
    pub count: i64,
}

/// Notifies a newly assigned user
///
/// Nothing is sent when the assignee is the acting user or did not change.
pub async fn notify_assignment(
    pool: &PgPool,
    actor: &AuthContext,
    kind: NotificationKind,
    assignee_id: Option<Uuid>,
    previous_assignee_id: Option<Uuid>,
    project_id: Uuid,
    message: String,
) -> ApiResult<()> {
    let Some(recipient_id) = assignee_id else {
        return Ok(());
    };

    if recipient_id == actor.user_id || previous_assignee_id == Some(recipient_id) {
        return Ok(());
    }

    Notification::create(
        pool,
        CreateNotification {
            recipient_id,
            sender_id: Some(actor.user_id),
            kind,
            message,
            reference_id: Some(project_id),
        },
    )
    .await?;

    tracing::debug!(recipient_id = %recipient_id, kind = kind.as_str(), "Assignment notification sent");

    Ok(())
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthContext,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<NotificationsView>)> {
    let invitations = Participant::list_pending_for_user(&state.db, auth.user_id).await?;
    let notifications = Notification::list_for_user(&state.db, auth.user_id).await?;

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(NotificationsView {
            flash,
            invitations,
            notifications,
        }),
    ))
}

/// Marks one of the user's notifications read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Redirect> {
    if !Notification::mark_read(&state.db, notification_id, auth.user_id).await? {
        return Err(ApiError::flash("/notifications", "Notification not found."));
    }

    Ok(Redirect::to("/notifications"))
}

/// Pending invitations plus unread notifications
///
/// Anonymous callers get `0`.
///
/// ```text
/// GET /api/notifications/count
/// {"count": 3}
/// ```
pub async fn notification_count(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
) -> ApiResult<Json<NotificationCount>> {
    let Some(auth) = auth else {
        return Ok(Json(NotificationCount { count: 0 }));
    };

    let pending = Participant::count_pending_for_user(&state.db, auth.user_id).await?;
    let unread = Notification::count_unread(&state.db, auth.user_id).await?;

    Ok(Json(NotificationCount {
        count: pending + unread,
    }))
}
