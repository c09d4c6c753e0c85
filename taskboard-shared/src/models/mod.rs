/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, credentials and password recovery state
/// - `project`: Projects, the root of the work hierarchy
/// - `participant`: Project membership, roles and invitations
/// - `task`: Tasks within a project, plus the shared status/priority enums
/// - `subtask`: Subtasks within a task
/// - `notification`: In-app notifications
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::Project;
/// use taskboard_shared::models::task::Task;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// for project in Project::list_for_member(&pool, user_id).await? {
///     let tasks = Task::list_by_project(&pool, project.id).await?;
///     println!("{}: {} tasks", project.name, tasks.len());
/// }
/// # Ok(())
/// # }
/// ```

pub mod notification;
pub mod participant;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
