/// Route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, registration, logout and password recovery
/// - `home`: Landing page after login
/// - `projects`: Project list, details and management
/// - `tasks`, `subtasks`: Work items inside a project
/// - `invitations`: Inviting users and answering invitations
/// - `notifications`: Notification list and badge counter
/// - `forms`: Form parsing helpers shared by the handlers

pub mod auth;
pub mod forms;
pub mod health;
pub mod home;
pub mod invitations;
pub mod notifications;
pub mod projects;
pub mod subtasks;
pub mod tasks;
