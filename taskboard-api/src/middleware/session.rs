/// Session middleware
///
/// [`session_layer`] runs on every request. It reads the session token from
/// the `session` cookie (or an `Authorization: Bearer` header), validates it
/// and inserts an [`AuthContext`] into the request extensions. Invalid or
/// expired tokens are ignored here, so public pages keep working with a stale
/// cookie.
///
/// [`require_session`] guards the authenticated router: requests without an
/// `AuthContext` are redirected to the login page with a flash message.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use taskboard_shared::auth::middleware::{authenticate_token, bearer_token, AuthContext, SESSION_COOKIE};

use crate::{app::AppState, flash};

/// Flash shown when an anonymous user opens a protected page
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must log in to access this page.";

/// Builds the session cookie for `token`
///
/// The cookie has no `Max-Age`; the token's own `exp` bounds the session.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Removes the session cookie from the jar
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

/// Reads the raw session token from a request
fn session_token(request: &Request) -> Option<String> {
    let jar = CookieJar::from_headers(request.headers());

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    bearer_token(request.headers()).ok().flatten().map(str::to_string)
}

/// Attaches the session's `AuthContext` to the request when it is valid
pub async fn session_layer(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = session_token(&request) {
        match authenticate_token(&token, state.jwt_secret()) {
            Ok(context) => {
                request.extensions_mut().insert(context);
            }
            Err(e) => {
                tracing::debug!(error = ?e, "Ignoring invalid session token");
            }
        }
    }

    next.run(request).await
}

/// Redirects anonymous requests to the login page
pub async fn require_session(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthContext>().is_none() {
        return flash::redirect_with_flash("/", LOGIN_REQUIRED_MESSAGE);
    }

    next.run(request).await
}
