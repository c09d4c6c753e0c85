/// Authorization helpers and permission checks
///
/// Access to every page below `/projects/:project_id` is decided here.
///
/// # Permission Model
///
/// 1. **Participation**: only accepted participants of a project can see it
/// 2. **Role**: `admin` participants manage the project and create tasks
/// 3. **Involvement**: creators and assignees of a task or subtask may work on
///    it without being admins
///
/// | Action | Allowed |
/// |---|---|
/// | task edit | admin, task creator, task assignee |
/// | task delete | admin, task creator |
/// | subtask create | admin, task assignee |
/// | subtask edit / delete | admin, subtask creator or assignee, task creator or assignee |
///
/// The facts needed for a decision are loaded with one query
/// ([`TaskAccess::load`], [`SubtaskAccess::load`]); the decision itself is a
/// pure function of those facts.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{TaskAccess, TaskAction};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, task_id: Uuid, user_id: Uuid)
/// #     -> Result<(), Box<dyn std::error::Error>> {
/// let access = TaskAccess::load(&pool, project_id, task_id, user_id).await?;
/// access.require(user_id, TaskAction::Edit)?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::participant::{Participant, ProjectRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not an accepted participant of the project
    #[error("Not a participant of project {0}")]
    NotParticipant(Uuid),

    /// Participant lacks the admin role
    #[error("Only project admins can do this")]
    NotAdmin,

    /// Participant is neither admin nor involved with the item
    #[error("Not authorized to modify this item")]
    NotAuthorized,

    /// Task or subtask does not exist under the addressed parent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Things a participant can do to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Edit,
    Delete,
    CreateSubtask,
}

/// Things a participant can do to a subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskAction {
    Edit,
    Delete,
}

/// Requires the user to be an accepted participant of the project
///
/// # Returns
///
/// The participant's role
///
/// # Errors
///
/// Returns `AuthzError::NotParticipant` for strangers, pending and rejected
/// invitees
pub async fn require_participant(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    Participant::get_role(pool, project_id, user_id)
        .await?
        .ok_or(AuthzError::NotParticipant(project_id))
}

/// Requires the user to be an accepted admin of the project
///
/// # Errors
///
/// - `AuthzError::NotParticipant` if the user is not an accepted participant
/// - `AuthzError::NotAdmin` if the user is a plain member
pub async fn require_project_admin(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    let role = require_participant(pool, project_id, user_id).await?;

    if !role.can_manage_project() {
        return Err(AuthzError::NotAdmin);
    }

    Ok(())
}

/// Decides a task action from the acting user's relationship to the task
pub fn task_permits(
    role: ProjectRole,
    user_id: Uuid,
    creator_id: Uuid,
    assignee_id: Option<Uuid>,
    action: TaskAction,
) -> bool {
    if role == ProjectRole::Admin {
        return true;
    }

    let is_creator = creator_id == user_id;
    let is_assignee = assignee_id == Some(user_id);

    match action {
        TaskAction::Edit => is_creator || is_assignee,
        TaskAction::Delete => is_creator,
        TaskAction::CreateSubtask => is_assignee,
    }
}

/// Decides a subtask action
///
/// Edit and delete share one rule: anyone involved with the subtask or its
/// parent task may do either.
pub fn subtask_permits(
    role: ProjectRole,
    user_id: Uuid,
    involved: &[Option<Uuid>],
    action: SubtaskAction,
) -> bool {
    match action {
        SubtaskAction::Edit | SubtaskAction::Delete => {
            role == ProjectRole::Admin || involved.contains(&Some(user_id))
        }
    }
}

/// Access facts for one task
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskAccess {
    pub project_id: Uuid,

    /// Acting user's role; `None` unless accepted
    pub role: Option<ProjectRole>,

    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

impl TaskAccess {
    /// Loads the facts for `task_id` under `project_id` as seen by `user_id`
    ///
    /// # Errors
    ///
    /// - `AuthzError::NotFound` if the task is not in the project
    /// - `AuthzError::DatabaseError` on query failure
    pub async fn load(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, AuthzError> {
        sqlx::query_as::<_, TaskAccess>(
            r#"
            SELECT t.project_id, pp.role, t.creator_id, t.assignee_id
            FROM tasks t
            LEFT JOIN project_participants pp
                ON pp.project_id = t.project_id AND pp.user_id = $3 AND pp.status = 'accepted'
            WHERE t.id = $2 AND t.project_id = $1
            "#,
        )
        .bind(project_id)
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthzError::NotFound("Task"))
    }

    pub fn permits(&self, user_id: Uuid, action: TaskAction) -> bool {
        self.role
            .map(|role| task_permits(role, user_id, self.creator_id, self.assignee_id, action))
            .unwrap_or(false)
    }

    /// Returns the role if the action is allowed
    ///
    /// # Errors
    ///
    /// - `AuthzError::NotParticipant` if the user is not an accepted participant
    /// - `AuthzError::NotAuthorized` if the policy refuses the action
    pub fn require(&self, user_id: Uuid, action: TaskAction) -> Result<ProjectRole, AuthzError> {
        let role = self.role.ok_or(AuthzError::NotParticipant(self.project_id))?;

        if !self.permits(user_id, action) {
            return Err(AuthzError::NotAuthorized);
        }

        Ok(role)
    }
}

/// Access facts for one subtask and its parent task
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubtaskAccess {
    pub project_id: Uuid,
    pub role: Option<ProjectRole>,
    pub task_creator_id: Uuid,
    pub task_assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

impl SubtaskAccess {
    /// Loads the facts for a subtask through its full path
    ///
    /// # Errors
    ///
    /// `AuthzError::NotFound` unless the subtask belongs to `task_id` and the
    /// task belongs to `project_id`
    pub async fn load(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, AuthzError> {
        sqlx::query_as::<_, SubtaskAccess>(
            r#"
            SELECT t.project_id, pp.role,
                   t.creator_id AS task_creator_id, t.assignee_id AS task_assignee_id,
                   s.creator_id, s.assignee_id
            FROM subtasks s
            INNER JOIN tasks t ON t.id = s.task_id
            LEFT JOIN project_participants pp
                ON pp.project_id = t.project_id AND pp.user_id = $4 AND pp.status = 'accepted'
            WHERE s.id = $3 AND s.task_id = $2 AND t.project_id = $1
            "#,
        )
        .bind(project_id)
        .bind(task_id)
        .bind(subtask_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthzError::NotFound("Subtask"))
    }

    pub fn permits(&self, user_id: Uuid, action: SubtaskAction) -> bool {
        let involved = [
            Some(self.creator_id),
            self.assignee_id,
            Some(self.task_creator_id),
            self.task_assignee_id,
        ];

        self.role
            .map(|role| subtask_permits(role, user_id, &involved, action))
            .unwrap_or(false)
    }

    /// Returns the role if the action is allowed
    ///
    /// # Errors
    ///
    /// Same as [`TaskAccess::require`]
    pub fn require(&self, user_id: Uuid, action: SubtaskAction) -> Result<ProjectRole, AuthzError> {
        let role = self.role.ok_or(AuthzError::NotParticipant(self.project_id))?;

        if !self.permits(user_id, action) {
            return Err(AuthzError::NotAuthorized);
        }

        Ok(role)
    }
}
