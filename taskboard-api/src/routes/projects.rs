/// Project pages
///
/// # Endpoints
///
/// - `GET /projects` - Projects the user has joined
/// - `GET /projects/new` - Create form
/// - `POST /projects` - Create a project (creator becomes admin)
/// - `GET /projects/:project_id` - Details with participants, tasks and subtasks
/// - `GET|POST /projects/:project_id/edit` - Edit (admin only)
/// - `POST /projects/:project_id/delete` - Delete (admin only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrFlash},
    flash::{take_flash, with_flash},
    routes::forms::{blank_as_default, parse_due_date, today, within_name_limit, FlashForm},
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskboard_shared::{
    auth::{
        authorization::{require_project_admin, subtask_permits, task_permits, SubtaskAction, TaskAction},
        middleware::AuthContext,
    },
    models::{
        participant::{Participant, ParticipantDetail, ProjectRole},
        project::{CreateProject, Project, ProjectStatus, ProjectSummary, UpdateProject},
        subtask::{Subtask, SubtaskDetail},
        task::{Task, TaskDetail},
    },
};
use uuid::Uuid;
use validator::Validate;

pub(crate) const PROJECT_UNAVAILABLE: &str = "Project not found or you do not have access to it.";

/// Path of a project's details page
pub fn project_path(project_id: Uuid) -> String {
    format!("/projects/{}", project_id)
}

/// Loads a project the user has joined, or flashes back to the list
pub(crate) async fn load_member_project(
    state: &AppState,
    project_id: Uuid,
    user_id: Uuid,
) -> ApiResult<ProjectSummary> {
    Project::find_for_member(&state.db, project_id, user_id)
        .await?
        .ok_or_else(|| ApiError::flash("/projects", PROJECT_UNAVAILABLE))
}

/// Project list view
#[derive(Debug, Serialize)]
pub struct ProjectsView {
    pub flash: Option<String>,
    pub projects: Vec<ProjectSummary>,
}

/// Create form view
#[derive(Debug, Serialize)]
pub struct NewProjectView {
    pub flash: Option<String>,
    /// Earliest allowed due date
    pub min_due_date: NaiveDate,
}

/// Subtask as shown on the details page
#[derive(Debug, Serialize)]
pub struct SubtaskView {
    #[serde(flatten)]
    pub subtask: SubtaskDetail,
    pub can_edit: bool,
}

/// Task with its subtasks as shown on the details page
#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: TaskDetail,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_create_subtask: bool,
    pub subtasks: Vec<SubtaskView>,
}

/// Project details view
#[derive(Debug, Serialize)]
pub struct ProjectDetailsView {
    pub flash: Option<String>,
    pub project: ProjectSummary,
    pub is_admin: bool,
    pub can_create_tasks: bool,
    /// Accepted participants, the choices for assignees
    pub participants: Vec<ParticipantDetail>,
    pub tasks: Vec<TaskView>,
}

/// Edit form view
#[derive(Debug, Serialize)]
pub struct EditProjectView {
    pub flash: Option<String>,
    pub project: ProjectSummary,
    pub statuses: Vec<ProjectStatus>,
}

/// Create project form
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectForm {
    #[validate(
        length(min = 1, message = "Project name is required."),
        custom(function = "within_name_limit", message = "Project name must be at most 200 characters.")
    )]
    pub name: String,

    #[validate(length(min = 1, message = "Project description is required."))]
    pub description: String,

    /// `YYYY-MM-DD`
    pub due_date: String,
}

/// Edit project form
#[derive(Debug, Deserialize, Validate)]
pub struct EditProjectForm {
    #[validate(
        length(min = 1, message = "Project name is required."),
        custom(function = "within_name_limit", message = "Project name must be at most 200 characters.")
    )]
    pub name: String,

    #[validate(length(min = 1, message = "Project description is required."))]
    pub description: String,

    pub due_date: String,

    #[serde(default, deserialize_with = "blank_as_default")]
    pub status: ProjectStatus,
}

/// Assembles the task tree with the viewer's permissions on each item
pub fn build_task_views(
    role: ProjectRole,
    user_id: Uuid,
    tasks: Vec<TaskDetail>,
    subtasks: Vec<SubtaskDetail>,
) -> Vec<TaskView> {
    let mut by_task: HashMap<Uuid, Vec<SubtaskDetail>> = HashMap::new();
    for subtask in subtasks {
        by_task.entry(subtask.task_id).or_default().push(subtask);
    }

    tasks
        .into_iter()
        .map(|task| {
            let subtasks = by_task
                .remove(&task.id)
                .unwrap_or_default()
                .into_iter()
                .map(|subtask| {
                    let involved = [
                        Some(subtask.creator_id),
                        subtask.assignee_id,
                        Some(task.creator_id),
                        task.assignee_id,
                    ];

                    SubtaskView {
                        can_edit: subtask_permits(role, user_id, &involved, SubtaskAction::Edit),
                        subtask,
                    }
                })
                .collect();

            let permits =
                |action| task_permits(role, user_id, task.creator_id, task.assignee_id, action);

            TaskView {
                can_edit: permits(TaskAction::Edit),
                can_delete: permits(TaskAction::Delete),
                can_create_subtask: permits(TaskAction::CreateSubtask),
                subtasks,
                task,
            }
        })
        .collect()
}

pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthContext,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ProjectsView>)> {
    let projects = Project::list_for_member(&state.db, auth.user_id).await?;

    let (jar, flash) = take_flash(jar);
    Ok((jar, Json(ProjectsView { flash, projects })))
}

pub async fn new_project_page(jar: CookieJar) -> (CookieJar, Json<NewProjectView>) {
    let (jar, flash) = take_flash(jar);
    (
        jar,
        Json(NewProjectView {
            flash,
            min_due_date: today(),
        }),
    )
}

/// Creates a project owned by the current user
///
/// # Endpoint
///
/// ```text
/// POST /projects
/// name=Launch&description=Website+launch&due_date=2026-06-30
/// ```
///
/// # Errors
///
/// Flashes back to `/projects/new` for blank fields or a past due date.
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<ProjectForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    form.name = form.name.trim().to_string();
    form.description = form.description.trim().to_string();
    form.validate().or_flash("/projects/new")?;

    let due_date = parse_due_date(&form.due_date, today(), None).or_flash("/projects/new")?;

    let project = Project::create_with_owner(
        &state.db,
        CreateProject {
            name: form.name,
            description: form.description,
            due_date,
            owner_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id, "Project created");

    Ok((
        with_flash(jar, "Project created successfully."),
        Redirect::to("/projects"),
    ))
}

/// Project details
///
/// Tasks are ordered by due date, each with its subtasks and the viewer's
/// permissions on them.
pub async fn project_details(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ProjectDetailsView>)> {
    let project = load_member_project(&state, project_id, auth.user_id).await?;

    let participants = Participant::list_accepted(&state.db, project_id).await?;
    let tasks = Task::list_by_project(&state.db, project_id).await?;
    let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let subtasks = Subtask::list_by_tasks(&state.db, &task_ids).await?;

    let tasks = build_task_views(project.role, auth.user_id, tasks, subtasks);

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(ProjectDetailsView {
            flash,
            is_admin: project.is_admin(),
            can_create_tasks: project.role.can_create_tasks(),
            project,
            participants,
            tasks,
        }),
    ))
}

pub async fn edit_project_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<EditProjectView>)> {
    require_project_admin(&state.db, project_id, auth.user_id)
        .await
        .or_flash("/projects")?;

    let project = load_member_project(&state, project_id, auth.user_id).await?;

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(EditProjectView {
            flash,
            project,
            statuses: vec![
                ProjectStatus::Active,
                ProjectStatus::OnHold,
                ProjectStatus::Completed,
                ProjectStatus::Cancelled,
            ],
        }),
    ))
}

/// Updates name, description, due date and status (admin only)
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<EditProjectForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    require_project_admin(&state.db, project_id, auth.user_id)
        .await
        .or_flash("/projects")?;

    let current = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::flash("/projects", PROJECT_UNAVAILABLE))?;

    let back = format!("/projects/{}/edit", project_id);

    form.name = form.name.trim().to_string();
    form.description = form.description.trim().to_string();
    form.validate().or_flash(&back)?;

    let due_date = parse_due_date(&form.due_date, today(), Some(current.due_date)).or_flash(&back)?;

    Project::update(
        &state.db,
        project_id,
        UpdateProject {
            name: form.name,
            description: form.description,
            due_date,
            status: form.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::flash("/projects", PROJECT_UNAVAILABLE))?;

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Project updated");

    Ok((
        with_flash(jar, "Project updated successfully."),
        Redirect::to(&project_path(project_id)),
    ))
}

/// Deletes a project with its participants, tasks and subtasks (admin only)
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    require_project_admin(&state.db, project_id, auth.user_id)
        .await
        .or_flash("/projects")?;

    if !Project::delete(&state.db, project_id).await? {
        return Err(ApiError::flash("/projects", PROJECT_UNAVAILABLE));
    }

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Project deleted");

    Ok((
        with_flash(jar, "Project deleted successfully."),
        Redirect::to("/projects"),
    ))
}
