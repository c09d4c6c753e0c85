/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        security::SecurityHeadersLayer,
        session::{require_session, session_layer},
    },
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::{
    auth::login_attempts::LoginAttemptTracker,
    mail::{LogMailer, Mailer},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Failed login counter per email
    pub login_attempts: Arc<LoginAttemptTracker>,

    /// Outgoing mail
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates new application state with the logging mailer
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            login_attempts: Arc::new(LoginAttemptTracker::new()),
            mailer: Arc::new(LogMailer),
        }
    }

    /// Replaces the mailer
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                      # Health check
/// ├── GET  /                            # Login page
/// ├── POST /login, GET /logout
/// ├── GET|POST /register, /recover, /reset-password/:token
/// ├── GET  /api/notifications/count     # Badge count (0 when anonymous)
/// └── (session required)
///     ├── GET  /index
///     ├── /projects/...                 # Projects, tasks, subtasks, invites
///     ├── /notifications/...
///     └── /invitations/:project_id/{accept,reject}
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS
/// 3. Logging (tower-http TraceLayer)
/// 4. Response compression
/// 5. Session (every request)
/// 6. Login guard (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/", get(routes::auth::login_page))
        .route("/login", post(routes::auth::login))
        .route("/register", get(routes::auth::register_page).post(routes::auth::register))
        .route("/recover", get(routes::auth::recover_page).post(routes::auth::recover))
        .route(
            "/reset-password/:token",
            get(routes::auth::reset_password_page).post(routes::auth::reset_password),
        )
        .route("/logout", get(routes::auth::logout))
        .route(
            "/api/notifications/count",
            get(routes::notifications::notification_count),
        );

    let project_routes = Router::new()
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/new", get(routes::projects::new_project_page))
        .route("/projects/:project_id", get(routes::projects::project_details))
        .route(
            "/projects/:project_id/edit",
            get(routes::projects::edit_project_page).post(routes::projects::update_project),
        )
        .route("/projects/:project_id/delete", post(routes::projects::delete_project))
        .route(
            "/projects/:project_id/invite",
            get(routes::invitations::invite_page).post(routes::invitations::invite),
        );

    let task_routes = Router::new()
        .route("/projects/:project_id/tasks", post(routes::tasks::create_task))
        .route(
            "/projects/:project_id/tasks/:task_id/edit",
            get(routes::tasks::edit_task_page).post(routes::tasks::update_task),
        )
        .route(
            "/projects/:project_id/tasks/:task_id/delete",
            post(routes::tasks::delete_task),
        )
        .route(
            "/projects/:project_id/tasks/:task_id/subtasks",
            post(routes::subtasks::create_subtask),
        )
        .route(
            "/projects/:project_id/tasks/:task_id/subtasks/:subtask_id/edit",
            get(routes::subtasks::edit_subtask_page).post(routes::subtasks::update_subtask),
        )
        .route(
            "/projects/:project_id/tasks/:task_id/subtasks/:subtask_id/delete",
            post(routes::subtasks::delete_subtask),
        );

    let notification_routes = Router::new()
        .route("/notifications", get(routes::notifications::list_notifications))
        .route(
            "/notifications/:notification_id/read",
            post(routes::notifications::mark_read),
        )
        .route(
            "/invitations/:project_id/accept",
            post(routes::invitations::accept_invitation),
        )
        .route(
            "/invitations/:project_id/reject",
            post(routes::invitations::reject_invitation),
        );

    let protected_routes = Router::new()
        .route("/index", get(routes::home::index))
        .merge(project_routes)
        .merge(task_routes)
        .merge(notification_routes)
        .route_layer(axum::middleware::from_fn(require_session));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_layer,
        ))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
