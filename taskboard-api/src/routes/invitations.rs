/// Project invitations
///
/// An admin invites a registered user by email. The invitee sees the
/// invitation on `/notifications` and accepts or rejects it; only a pending
/// invitation can be answered.
///
/// # Endpoints
///
/// - `GET /projects/:project_id/invite` - Participants and their status (admin only)
/// - `POST /projects/:project_id/invite` - Invite by email (admin only)
/// - `POST /invitations/:project_id/accept`
/// - `POST /invitations/:project_id/reject`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrFlash},
    flash::{take_flash, with_flash},
    routes::{
        forms::FlashForm,
        projects::{load_member_project, project_path},
    },
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use taskboard_shared::{
    auth::{authorization::require_project_admin, middleware::AuthContext},
    models::{
        notification::{CreateNotification, Notification, NotificationKind},
        participant::{InvitationStatus, Participant, ParticipantDetail},
        project::{Project, ProjectSummary},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

const ALREADY_ANSWERED: &str = "The invitation does not exist or was already answered.";

/// Invite page view
#[derive(Debug, Serialize)]
pub struct InviteView {
    pub flash: Option<String>,
    pub project: ProjectSummary,
    /// Everyone invited so far, with their invitation status
    pub participants: Vec<ParticipantDetail>,
}

/// Invite form
#[derive(Debug, Deserialize, Validate)]
pub struct InviteForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

fn invite_path(project_id: Uuid) -> String {
    format!("/projects/{}/invite", project_id)
}

pub async fn invite_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<InviteView>)> {
    require_project_admin(&state.db, project_id, auth.user_id)
        .await
        .or_flash(&project_path(project_id))?;

    let project = load_member_project(&state, project_id, auth.user_id).await?;
    let participants = Participant::list_by_project(&state.db, project_id).await?;

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(InviteView {
            flash,
            project,
            participants,
        }),
    ))
}

/// Invites a registered user to the project
///
/// # Endpoint
///
/// ```text
/// POST /projects/:project_id/invite
/// email=grace@example.com
/// ```
///
/// A rejected invitee can be invited again; accepted participants and pending
/// invitees are reported back with a flash.
pub async fn invite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
    FlashForm(form): FlashForm<InviteForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    require_project_admin(&state.db, project_id, auth.user_id)
        .await
        .or_flash(&project_path(project_id))?;

    let back = invite_path(project_id);
    form.validate().or_flash(&back)?;

    let project = load_member_project(&state, project_id, auth.user_id).await?;

    let invitee = User::find_by_email(&state.db, &form.email)
        .await?
        .ok_or_else(|| ApiError::flash(&back, "No registered user has that email address."))?;

    if invitee.id == auth.user_id {
        return Err(ApiError::flash(&back, "You cannot invite yourself."));
    }

    // The participant row and its notification commit together
    let mut tx = state.db.begin().await?;

    match Participant::find(&state.db, project_id, invitee.id).await? {
        Some(existing) => match existing.status {
            InvitationStatus::Accepted => {
                return Err(ApiError::flash(
                    &back,
                    format!("{} is already a participant of this project.", invitee.name),
                ));
            }
            InvitationStatus::Pending => {
                return Err(ApiError::flash(
                    &back,
                    format!("An invitation for {} is already pending.", invitee.name),
                ));
            }
            InvitationStatus::Rejected => {
                if !Participant::reinvite(&mut *tx, project_id, invitee.id, auth.user_id).await? {
                    return Err(ApiError::flash(&back, "The invitation could not be renewed."));
                }
            }
        },
        None => {
            Participant::invite(&mut *tx, project_id, invitee.id, auth.user_id)
                .await
                .or_flash(&back)?;
        }
    }

    Notification::create(
        &mut *tx,
        CreateNotification {
            recipient_id: invitee.id,
            sender_id: Some(auth.user_id),
            kind: NotificationKind::ProjectInvitation,
            message: format!("{} invited you to join the project \"{}\".", auth.name, project.name),
            reference_id: Some(project_id),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        project_id = %project_id,
        invitee_id = %invitee.id,
        invited_by = %auth.user_id,
        "Invitation sent"
    );

    Ok((
        with_flash(jar, &format!("Invitation sent to {}.", invitee.name)),
        Redirect::to(&back),
    ))
}

/// Marks the invitation read and tells the project owner about the answer
async fn after_answer(
    conn: &mut PgConnection,
    auth: &AuthContext,
    project: &Project,
    kind: NotificationKind,
) -> ApiResult<()> {
    Notification::mark_invitation_read(&mut *conn, auth.user_id, project.id).await?;

    let verb = match kind {
        NotificationKind::InvitationAccepted => "accepted",
        _ => "declined",
    };

    Notification::create(
        conn,
        CreateNotification {
            recipient_id: project.owner_id,
            sender_id: Some(auth.user_id),
            kind,
            message: format!(
                "{} {} your invitation to the project \"{}\".",
                auth.name, verb, project.name
            ),
            reference_id: Some(project.id),
        },
    )
    .await?;

    Ok(())
}

/// Accepts a pending invitation and opens the project
pub async fn accept_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::flash("/notifications", ALREADY_ANSWERED))?;

    let mut tx = state.db.begin().await?;

    if !Participant::accept(&mut *tx, project_id, auth.user_id).await? {
        return Err(ApiError::flash("/notifications", ALREADY_ANSWERED));
    }

    after_answer(&mut *tx, &auth, &project, NotificationKind::InvitationAccepted).await?;
    tx.commit().await?;

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Invitation accepted");

    Ok((
        with_flash(jar, &format!("You joined the project \"{}\".", project.name)),
        Redirect::to(&project_path(project_id)),
    ))
}

/// Rejects a pending invitation
pub async fn reject_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::flash("/notifications", ALREADY_ANSWERED))?;

    let mut tx = state.db.begin().await?;

    if !Participant::reject(&mut *tx, project_id, auth.user_id).await? {
        return Err(ApiError::flash("/notifications", ALREADY_ANSWERED));
    }

    after_answer(&mut *tx, &auth, &project, NotificationKind::InvitationRejected).await?;
    tx.commit().await?;

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Invitation rejected");

    Ok((with_flash(jar, "Invitation rejected."), Redirect::to("/notifications")))
}
