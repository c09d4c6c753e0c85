/// Subtask handlers
///
/// # Endpoints
///
/// - `POST /projects/:project_id/tasks/:task_id/subtasks` - admin or task assignee
/// - `GET|POST /projects/:project_id/tasks/:task_id/subtasks/:subtask_id/edit`
/// - `POST /projects/:project_id/tasks/:task_id/subtasks/:subtask_id/delete`
///
/// Editing and deleting are open to admins and to anyone involved with the
/// subtask or its parent task.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrFlash},
    flash::{take_flash, with_flash},
    routes::{
        forms::{
            blank_as_default, check_assignee, empty_string_as_none, optional_text, parse_due_date,
            today, within_name_limit, FlashForm,
        },
        notifications::notify_assignment,
        projects::project_path,
        tasks::{priorities, work_statuses},
    },
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{SubtaskAccess, SubtaskAction, TaskAccess, TaskAction},
        middleware::AuthContext,
    },
    models::{
        notification::NotificationKind,
        participant::{Participant, ParticipantDetail},
        subtask::{CreateSubtask, Subtask, UpdateSubtask},
        task::{Priority, WorkStatus},
    },
};
use uuid::Uuid;
use validator::Validate;

const SUBTASK_NOT_FOUND: &str = "Subtask not found in this task.";

/// Create and edit form for subtasks
#[derive(Debug, Deserialize, Validate)]
pub struct SubtaskForm {
    #[validate(
        length(min = 1, message = "Subtask name is required."),
        custom(function = "within_name_limit", message = "Subtask name must be at most 200 characters.")
    )]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub assignee_id: Option<Uuid>,

    pub due_date: String,

    #[serde(default, deserialize_with = "blank_as_default")]
    pub status: WorkStatus,

    #[serde(default, deserialize_with = "blank_as_default")]
    pub priority: Priority,
}

/// Edit page view
#[derive(Debug, Serialize)]
pub struct EditSubtaskView {
    pub flash: Option<String>,
    pub project_id: Uuid,
    pub subtask: Subtask,
    pub participants: Vec<ParticipantDetail>,
    pub statuses: Vec<WorkStatus>,
    pub priorities: Vec<Priority>,
}

fn edit_path(project_id: Uuid, task_id: Uuid, subtask_id: Uuid) -> String {
    format!(
        "/projects/{}/tasks/{}/subtasks/{}/edit",
        project_id, task_id, subtask_id
    )
}

/// Creates a subtask under a task
pub async fn create_subtask(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<SubtaskForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let back = project_path(project_id);

    TaskAccess::load(&state.db, project_id, task_id, auth.user_id)
        .await
        .or_flash(&back)?
        .require(auth.user_id, TaskAction::CreateSubtask)
        .or_flash(&back)?;

    form.name = form.name.trim().to_string();
    form.validate().or_flash(&back)?;

    let due_date = parse_due_date(&form.due_date, today(), None).or_flash(&back)?;
    check_assignee(&state.db, project_id, form.assignee_id).await.or_flash(&back)?;

    let subtask = Subtask::create(
        &state.db,
        CreateSubtask {
            task_id,
            name: form.name,
            description: optional_text(form.description),
            creator_id: auth.user_id,
            assignee_id: form.assignee_id,
            due_date,
            status: form.status,
            priority: form.priority,
        },
    )
    .await?;

    notify_assignment(
        &state.db,
        &auth,
        NotificationKind::SubtaskAssigned,
        subtask.assignee_id,
        None,
        project_id,
        format!("{} assigned you the subtask \"{}\".", auth.name, subtask.name),
    )
    .await?;

    tracing::info!(subtask_id = %subtask.id, task_id = %task_id, "Subtask created");

    Ok((with_flash(jar, "Subtask created successfully."), Redirect::to(&back)))
}

/// Loads a subtask the user may act on, flashing back to the project otherwise
async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    (project_id, task_id, subtask_id): (Uuid, Uuid, Uuid),
    action: SubtaskAction,
) -> ApiResult<Subtask> {
    let back = project_path(project_id);

    SubtaskAccess::load(&state.db, project_id, task_id, subtask_id, auth.user_id)
        .await
        .or_flash(&back)?
        .require(auth.user_id, action)
        .or_flash(&back)?;

    Subtask::find_in_task(&state.db, project_id, task_id, subtask_id)
        .await?
        .ok_or_else(|| ApiError::flash(&back, SUBTASK_NOT_FOUND))
}

pub async fn edit_subtask_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(ids): Path<(Uuid, Uuid, Uuid)>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<EditSubtaskView>)> {
    let subtask = authorize(&state, &auth, ids, SubtaskAction::Edit).await?;
    let participants = Participant::list_accepted(&state.db, ids.0).await?;

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(EditSubtaskView {
            flash,
            project_id: ids.0,
            subtask,
            participants,
            statuses: work_statuses(),
            priorities: priorities(),
        }),
    ))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(ids): Path<(Uuid, Uuid, Uuid)>,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<SubtaskForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let (project_id, task_id, subtask_id) = ids;
    let current = authorize(&state, &auth, ids, SubtaskAction::Edit).await?;
    let back = edit_path(project_id, task_id, subtask_id);

    form.name = form.name.trim().to_string();
    form.validate().or_flash(&back)?;

    let due_date = parse_due_date(&form.due_date, today(), Some(current.due_date)).or_flash(&back)?;
    check_assignee(&state.db, project_id, form.assignee_id).await.or_flash(&back)?;

    let subtask = Subtask::update(
        &state.db,
        subtask_id,
        UpdateSubtask {
            name: form.name,
            description: optional_text(form.description),
            assignee_id: form.assignee_id,
            due_date,
            status: form.status,
            priority: form.priority,
        },
    )
    .await?
    .ok_or_else(|| ApiError::flash(&project_path(project_id), SUBTASK_NOT_FOUND))?;

    notify_assignment(
        &state.db,
        &auth,
        NotificationKind::SubtaskAssigned,
        subtask.assignee_id,
        current.assignee_id,
        project_id,
        format!("{} assigned you the subtask \"{}\".", auth.name, subtask.name),
    )
    .await?;

    tracing::info!(subtask_id = %subtask_id, user_id = %auth.user_id, "Subtask updated");

    Ok((
        with_flash(jar, "Subtask updated successfully."),
        Redirect::to(&project_path(project_id)),
    ))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(ids): Path<(Uuid, Uuid, Uuid)>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    authorize(&state, &auth, ids, SubtaskAction::Delete).await?;

    let back = project_path(ids.0);
    if !Subtask::delete(&state.db, ids.2).await? {
        return Err(ApiError::flash(&back, SUBTASK_NOT_FOUND));
    }

    tracing::info!(subtask_id = %ids.2, user_id = %auth.user_id, "Subtask deleted");

    Ok((with_flash(jar, "Subtask deleted successfully."), Redirect::to(&back)))
}
