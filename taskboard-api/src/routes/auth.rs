/// Authentication pages
///
/// Login, registration, logout and the password recovery flow. Form posts
/// always answer with a `303 See Other`; failures carry a flash message back
/// to the form they came from.
///
/// # Endpoints
///
/// - `GET /` - Login page
/// - `POST /login` - Check credentials and start a session
/// - `GET|POST /register` - Create an account
/// - `GET|POST /recover` - Request a password reset email
/// - `GET|POST /reset-password/:token` - Choose a new password
/// - `GET /logout` - End the session

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrFlash},
    flash::{take_flash, with_flash},
    middleware::session::{clear_session, session_cookie},
    routes::forms::{empty_string_as_none, FlashForm},
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        jwt::{create_token, Claims},
        password::{hash_password, validate_password_strength, verify_password},
        reset_token::{
            generate_reset_token, hash_reset_token, reset_token_expiry, validate_reset_token_format,
            verify_reset_token,
        },
    },
    mail::recovery_email,
    models::user::{normalize_email, CreateUser, User},
};
use validator::Validate;

/// Number of preset avatars offered on the register page
pub const AVATAR_COUNT: u32 = 12;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";
const INVALID_RESET_LINK: &str = "The password reset link is invalid or has expired.";
const RECOVERY_SENT: &str = "If that email is registered, a recovery link has been sent.";

/// Paths of the preset avatars
pub fn avatar_choices() -> Vec<String> {
    (1..=AVATAR_COUNT).map(|i| format!("/images/{}.png", i)).collect()
}

/// Login page view
#[derive(Debug, Serialize)]
pub struct LoginView {
    pub flash: Option<String>,
}

/// Register page view
#[derive(Debug, Serialize)]
pub struct RegisterView {
    pub flash: Option<String>,
    pub avatars: Vec<String>,
}

/// Recovery page view
#[derive(Debug, Serialize)]
pub struct RecoverView {
    pub flash: Option<String>,
}

/// Reset password page view
#[derive(Debug, Serialize)]
pub struct ResetPasswordView {
    pub flash: Option<String>,
    pub token: String,
}

/// Login form
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Registration form
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,

    /// One of [`avatar_choices`], or empty for none
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub avatar_url: Option<String>,
}

/// Recovery form
#[derive(Debug, Deserialize, Validate)]
pub struct RecoverForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

/// New password form
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordForm {
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,
}

/// Login page
///
/// ```text
/// GET /
/// ```
pub async fn login_page(jar: CookieJar) -> (CookieJar, Json<LoginView>) {
    let (jar, flash) = take_flash(jar);
    (jar, Json(LoginView { flash }))
}

/// Checks credentials and starts a session
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/x-www-form-urlencoded
///
/// email=ada@example.com&password=...
/// ```
///
/// Redirects to `/index` with the `session` cookie set, or back to `/` with a
/// flash. Five failed attempts block the email for five minutes.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    FlashForm(form): FlashForm<LoginForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    form.validate().or_flash("/")?;

    let email = normalize_email(&form.email);

    if let Some(remaining) = state.login_attempts.remaining_block(&email) {
        let minutes = (remaining.num_seconds() + 59) / 60;
        return Err(ApiError::flash(
            "/",
            format!(
                "Too many failed login attempts. Try again in {} minute(s).",
                minutes.max(1)
            ),
        ));
    }

    let user = User::find_by_email(&state.db, &email).await?;

    let verified = match &user {
        Some(user) => verify_password(&form.password, &user.password_hash)?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            state.login_attempts.record_failure(&email);
            tracing::info!(email = %email, "Failed login attempt");
            return Err(ApiError::flash("/", INVALID_CREDENTIALS));
        }
    };

    state.login_attempts.record_success(&email);
    User::update_last_login(&state.db, user.id).await?;

    let claims = Claims::with_expiration(
        user.id,
        user.name.clone(),
        Duration::hours(state.config.jwt.session_ttl_hours),
    );
    let token = create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar.add(session_cookie(token, state.config.api.production));
    Ok((jar, Redirect::to("/index")))
}

/// Register page with the avatar choices
///
/// ```text
/// GET /register
/// ```
pub async fn register_page(jar: CookieJar) -> (CookieJar, Json<RegisterView>) {
    let (jar, flash) = take_flash(jar);
    (
        jar,
        Json(RegisterView {
            flash,
            avatars: avatar_choices(),
        }),
    )
}

/// Creates an account
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/x-www-form-urlencoded
///
/// name=Ada&email=ada@example.com&password=...&confirm_password=...&avatar_url=/images/3.png
/// ```
///
/// # Errors
///
/// Flashes back to `/register` when validation fails, the password is weak,
/// the avatar is unknown or the email is taken.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    FlashForm(mut form): FlashForm<RegisterForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    form.name = form.name.trim().to_string();
    form.validate().or_flash("/register")?;

    validate_password_strength(&form.password)
        .map_err(ApiError::BadRequest)
        .or_flash("/register")?;

    if let Some(avatar) = &form.avatar_url {
        if !avatar_choices().contains(avatar) {
            return Err(ApiError::flash("/register", "Choose one of the available avatars."));
        }
    }

    let password_hash = hash_password(&form.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: form.name,
            email: form.email,
            password_hash,
            avatar_url: form.avatar_url,
        },
    )
    .await
    .or_flash("/register")?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        with_flash(jar, "Registration successful. Please log in."),
        Redirect::to("/"),
    ))
}

/// Recovery page
///
/// ```text
/// GET /recover
/// ```
pub async fn recover_page(jar: CookieJar) -> (CookieJar, Json<RecoverView>) {
    let (jar, flash) = take_flash(jar);
    (jar, Json(RecoverView { flash }))
}

/// Issues a reset token and emails the link
///
/// The response is the same whether or not the email is registered.
///
/// ```text
/// POST /recover
/// email=ada@example.com
/// ```
pub async fn recover(
    State(state): State<AppState>,
    jar: CookieJar,
    FlashForm(form): FlashForm<RecoverForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    form.validate().or_flash("/recover")?;

    if let Some(user) = User::find_by_email(&state.db, &form.email).await? {
        let (token, token_hash) = generate_reset_token();
        User::set_reset_token(&state.db, user.id, &token_hash, reset_token_expiry(Utc::now())).await?;

        let email = recovery_email(&user.email, &user.name, &state.config.api.public_base_url, &token);
        if let Err(e) = state.mailer.send(email).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send recovery email");
        }
    }

    Ok((with_flash(jar, RECOVERY_SENT), Redirect::to("/")))
}

/// Loads the user owning a live reset token
async fn find_reset_user(state: &AppState, token: &str) -> ApiResult<User> {
    if !validate_reset_token_format(token) {
        return Err(ApiError::flash("/", INVALID_RESET_LINK));
    }

    let user = User::find_by_reset_token(&state.db, &hash_reset_token(token))
        .await?
        .filter(|user| {
            user.reset_token_hash
                .as_deref()
                .is_some_and(|stored| verify_reset_token(token, stored))
        });

    user.ok_or_else(|| ApiError::flash("/", INVALID_RESET_LINK))
}

/// New password page
///
/// ```text
/// GET /reset-password/:token
/// ```
///
/// Unknown, malformed or expired tokens redirect to `/` with a flash.
pub async fn reset_password_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ResetPasswordView>)> {
    find_reset_user(&state, &token).await?;

    let (jar, flash) = take_flash(jar);
    Ok((jar, Json(ResetPasswordView { flash, token })))
}

/// Stores the new password and clears the token
///
/// ```text
/// POST /reset-password/:token
/// password=...&confirm_password=...
/// ```
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    jar: CookieJar,
    FlashForm(form): FlashForm<ResetPasswordForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let user = find_reset_user(&state, &token).await?;
    let back = format!("/reset-password/{}", token);

    form.validate().or_flash(&back)?;
    validate_password_strength(&form.password)
        .map_err(ApiError::BadRequest)
        .or_flash(&back)?;

    let password_hash = hash_password(&form.password)?;

    if !User::reset_password(&state.db, &hash_reset_token(&token), &password_hash).await? {
        return Err(ApiError::flash("/", INVALID_RESET_LINK));
    }

    state.login_attempts.record_success(&user.email);
    tracing::info!(user_id = %user.id, "Password reset");

    Ok((
        with_flash(jar, "Password updated. You can now log in."),
        Redirect::to("/"),
    ))
}

/// Ends the session
///
/// ```text
/// GET /logout
/// ```
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (clear_session(jar), Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_choices() {
        let avatars = avatar_choices();

        assert_eq!(avatars.len(), 12);
        assert_eq!(avatars[0], "/images/1.png");
        assert_eq!(avatars[11], "/images/12.png");
    }

    #[test]
    fn test_register_form_validation() {
        let form = RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "Passw0rd!".into(),
            confirm_password: "Passw0rd!".into(),
            avatar_url: None,
        };
        assert!(form.validate().is_ok());

        let form = RegisterForm {
            confirm_password: "different".into(),
            email: "not-an-email".into(),
            ..form
        };
        let err = ApiError::from(form.validate().unwrap_err());
        assert_eq!(
            err.user_message(),
            "Passwords do not match. Enter a valid email address."
        );
    }

    #[test]
    fn test_login_form_requires_password() {
        let form = LoginForm {
            email: "ada@example.com".into(),
            password: String::new(),
        };

        assert!(form.validate().is_err());
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_redirects() {
        use axum::response::IntoResponse;

        let response = logout(CookieJar::new()).await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
    }
}
