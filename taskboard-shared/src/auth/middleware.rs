/// Session authentication primitives for Axum
///
/// The API's session layer reads the session token (from the `session` cookie,
/// or an `Authorization: Bearer` header for non-browser clients), validates it
/// with [`authenticate_token`] and inserts the resulting [`AuthContext`] into
/// the request extensions. Handlers then take `AuthContext` (or
/// `Option<AuthContext>`) as an extractor.
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get};
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.name)
/// }
///
/// let app: Router = Router::new().route("/whoami", get(whoami));
/// ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};

/// Name of the cookie that carries the session token
pub const SESSION_COOKIE: &str = "session";

/// The logged-in user, added to request extensions by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Display name at login time
    pub name: String,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
        }
    }
}

/// Error type for session authentication
#[derive(Debug)]
pub enum AuthError {
    /// No session token on the request
    MissingCredentials,

    /// Authorization header present but not a Bearer token
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Session token has expired
    Expired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::Expired => (StatusCode::UNAUTHORIZED, "Session expired").into_response(),
        }
    }
}

/// Validates a session token and builds the auth context
///
/// # Errors
///
/// - `AuthError::Expired` if the session timed out
/// - `AuthError::InvalidToken` for a bad signature, issuer or format
pub fn authenticate_token(token: &str, secret: &str) -> Result<AuthContext, AuthError> {
    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::Expired,
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(AuthContext::from_claims(claims))
}

/// Reads a Bearer token from the `Authorization` header
///
/// # Returns
///
/// `Ok(None)` if there is no Authorization header at all
///
/// # Errors
///
/// Returns `AuthError::InvalidFormat` if the header uses another scheme
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not ASCII".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::{HeaderValue, Request};
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_authenticate_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "Ada".into()), SECRET).unwrap();

        let context = authenticate_token(&token, SECRET).unwrap();
        assert_eq!(context.user_id, user_id);
        assert_eq!(context.name, "Ada");
    }

    #[test]
    fn test_authenticate_expired_token() {
        let claims = Claims::with_expiration(Uuid::new_v4(), "Ada".into(), Duration::seconds(-60));
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(authenticate_token(&token, SECRET), Err(AuthError::Expired)));
    }

    #[test]
    fn test_authenticate_garbage() {
        assert!(matches!(
            authenticate_token("garbage", SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).unwrap().is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_extractor_reads_extensions() {
        let context = AuthContext {
            user_id: Uuid::new_v4(),
            name: "Ada".to_string(),
        };

        let mut request = Request::builder().uri("/").body(()).unwrap();
        request.extensions_mut().insert(context.clone());
        let (mut parts, _) = request.into_parts();

        let extracted = AuthContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, context);
    }

    #[tokio::test]
    async fn test_extractor_rejects_missing_context() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();

        let result = AuthContext::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("test".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::Expired.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
