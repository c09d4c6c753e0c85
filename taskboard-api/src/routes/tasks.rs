/// Task handlers
///
/// Admins create tasks; creators and assignees may edit them; only admins and
/// creators may delete them. Every outcome redirects back to the project page.
///
/// # Endpoints
///
/// - `POST /projects/:project_id/tasks`
/// - `GET|POST /projects/:project_id/tasks/:task_id/edit`
/// - `POST /projects/:project_id/tasks/:task_id/delete`

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
        authorization::{require_participant, AuthzError, TaskAccess, TaskAction},
        middleware::AuthContext,
    },
    models::{
        notification::NotificationKind,
        participant::{Participant, ParticipantDetail},
        task::{CreateTask, Priority, Task, UpdateTask, WorkStatus},
    },
};
use uuid::Uuid;
use validator::Validate;

const TASK_NOT_FOUND: &str = "Task not found in this project.";

/// Create and edit form for tasks
#[derive(Debug, Deserialize, Validate)]
pub struct TaskForm {
    #[validate(
        length(min = 1, message = "Task name is required."),
        custom(function = "within_name_limit", message = "Task name must be at most 200 characters.")
    )]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Empty for unassigned
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
pub struct EditTaskView {
    pub flash: Option<String>,
    pub project_id: Uuid,
    pub task: Task,
    /// Assignee choices
    pub participants: Vec<ParticipantDetail>,
    pub statuses: Vec<WorkStatus>,
    pub priorities: Vec<Priority>,
}

fn edit_path(project_id: Uuid, task_id: Uuid) -> String {
    format!("/projects/{}/tasks/{}/edit", project_id, task_id)
}

pub(crate) fn work_statuses() -> Vec<WorkStatus> {
    vec![
        WorkStatus::Pending,
        WorkStatus::InProgress,
        WorkStatus::Completed,
        WorkStatus::Blocked,
    ]
}

pub(crate) fn priorities() -> Vec<Priority> {
    vec![Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]
}

/// Creates a task (admin only)
///
/// # Endpoint
///
/// ```text
/// POST /projects/:project_id/tasks
/// name=Copy&description=&assignee_id=&due_date=2026-05-01&status=&priority=high
/// ```
///
/// Status and priority default to `pending` and `medium`.
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<TaskForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let back = project_path(project_id);

    let role = require_participant(&state.db, project_id, auth.user_id)
        .await
        .or_flash("/projects")?;

    if !role.can_create_tasks() {
        return Err(ApiError::from(AuthzError::NotAdmin).into_flash(&back));
    }

    form.name = form.name.trim().to_string();
    form.validate().or_flash(&back)?;

    let due_date = parse_due_date(&form.due_date, today(), None).or_flash(&back)?;
    check_assignee(&state.db, project_id, form.assignee_id).await.or_flash(&back)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
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
        NotificationKind::TaskAssigned,
        task.assignee_id,
        None,
        project_id,
        format!("{} assigned you the task \"{}\".", auth.name, task.name),
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %project_id, "Task created");

    Ok((with_flash(jar, "Task created successfully."), Redirect::to(&back)))
}

/// Loads a task the user may act on, flashing back to the project otherwise
async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    project_id: Uuid,
    task_id: Uuid,
    action: TaskAction,
) -> ApiResult<Task> {
    let back = project_path(project_id);

    TaskAccess::load(&state.db, project_id, task_id, auth.user_id)
        .await
        .or_flash(&back)?
        .require(auth.user_id, action)
        .or_flash(&back)?;

    Task::find_in_project(&state.db, project_id, task_id)
        .await?
        .ok_or_else(|| ApiError::flash(&back, TASK_NOT_FOUND))
}

pub async fn edit_task_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<EditTaskView>)> {
    let task = authorize(&state, &auth, project_id, task_id, TaskAction::Edit).await?;
    let participants = Participant::list_accepted(&state.db, project_id).await?;

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(EditTaskView {
            flash,
            project_id,
            task,
            participants,
            statuses: work_statuses(),
            priorities: priorities(),
        }),
    ))
}

/// Updates a task (admin, creator or assignee)
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<TaskForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let current = authorize(&state, &auth, project_id, task_id, TaskAction::Edit).await?;
    let back = edit_path(project_id, task_id);

    form.name = form.name.trim().to_string();
    form.validate().or_flash(&back)?;

    let due_date = parse_due_date(&form.due_date, today(), Some(current.due_date)).or_flash(&back)?;
    check_assignee(&state.db, project_id, form.assignee_id).await.or_flash(&back)?;

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            name: form.name,
            description: optional_text(form.description),
            assignee_id: form.assignee_id,
            due_date,
            status: form.status,
            priority: form.priority,
        },
    )
    .await?
    .ok_or_else(|| ApiError::flash(&project_path(project_id), TASK_NOT_FOUND))?;

    notify_assignment(
        &state.db,
        &auth,
        NotificationKind::TaskAssigned,
        task.assignee_id,
        current.assignee_id,
        project_id,
        format!("{} assigned you the task \"{}\".", auth.name, task.name),
    )
    .await?;

    tracing::info!(task_id = %task_id, user_id = %auth.user_id, "Task updated");

    Ok((
        with_flash(jar, "Task updated successfully."),
        Redirect::to(&project_path(project_id)),
    ))
}

/// Deletes a task and its subtasks (admin or creator)
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    authorize(&state, &auth, project_id, task_id, TaskAction::Delete).await?;

    let back = project_path(project_id);
    if !Task::delete(&state.db, task_id).await? {
        return Err(ApiError::flash(&back, TASK_NOT_FOUND));
    }

    tracing::info!(task_id = %task_id, user_id = %auth.user_id, "Task deleted");

    Ok((with_flash(jar, "Task deleted successfully."), Redirect::to(&back)))
}
