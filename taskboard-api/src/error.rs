/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`. Page handlers turn expected
/// failures into a [`ApiError::Flash`] redirect with [`OrFlash::or_flash`], so
/// the user lands back on a page with a message instead of an error document.
/// Everything else maps to a JSON error body with a matching status code.
///
/// Internal errors are logged here, once, and never shown to the client.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::error::{ApiResult, OrFlash};
/// use taskboard_shared::models::project::Project;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn delete(pool: &PgPool, id: Uuid) -> ApiResult<()> {
///     Project::delete(pool, id).await.or_flash("/projects")?;
///     Ok(())
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskboard_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use taskboard_shared::mail::MailError;

use crate::flash;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Redirect (303) to `location` carrying a flash message
    Flash { location: String, message: String },
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Redirects to `location` with `message` as flash
    pub fn flash(location: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Flash {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Whether this error hides its details from the user
    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::InternalError(_))
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Flash { message: msg, .. } => msg.clone(),
            ApiError::ValidationError(details) => details
                .iter()
                .map(|d| d.message.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            ApiError::InternalError(_) => "An internal error occurred".to_string(),
        }
    }

    /// Converts an expected failure into a flash redirect to `location`
    ///
    /// Internal errors and existing flash redirects are returned unchanged.
    pub fn into_flash(self, location: &str) -> Self {
        if self.is_internal() || matches!(self, ApiError::Flash { .. }) {
            return self;
        }

        ApiError::flash(location, self.user_message())
    }
}

/// Turns expected failures into flash redirects
pub trait OrFlash<T> {
    fn or_flash(self, location: &str) -> ApiResult<T>;
}

impl<T, E> OrFlash<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn or_flash(self, location: &str) -> ApiResult<T> {
        self.map_err(|e| e.into().into_flash(location))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Flash { location, message } => {
                write!(f, "Redirect to {}: {}", location, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Flash { location, message } => {
                return flash::redirect_with_flash(&location, &message);
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict(
                            "That email address is already registered".to_string(),
                        );
                    }
                    if db_err.is_unique_violation() {
                        return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                    }
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert session errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Missing credentials".to_string()),
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::Expired => ApiError::Unauthorized("Session expired".to_string()),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotParticipant(_) => {
                ApiError::Forbidden("You do not have access to this project.".to_string())
            }
            AuthzError::NotAdmin => {
                ApiError::Forbidden("Only project admins can do that.".to_string())
            }
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("You are not allowed to modify this item.".to_string())
            }
            AuthzError::NotFound(what) => ApiError::NotFound(format!("{} not found.", what)),
            AuthzError::DatabaseError(err) => ApiError::from(err),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Session expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid session: {}", err)),
        }
    }
}

/// Convert mail errors to API errors
impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::InternalError(format!("Mail delivery failed: {}", err))
    }
}

/// Convert form validation errors to API errors
///
/// Fields are reported in name order so the joined flash text is stable.
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let details = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid.", field)),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}
