/// Helpers shared by the HTML form handlers
///
/// Browsers submit every field of a form, so an untouched `<select>` or date
/// input arrives as an empty string. [`empty_string_as_none`] maps those to
/// `None` before the value is parsed.
///
/// Handlers take their body through [`FlashForm`], which turns a body that
/// does not parse into a flash redirect back to the page the form was on.

use axum::{
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
};
use chrono::{NaiveDate, Utc};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer};
use sqlx::PgPool;
use std::{fmt, str::FromStr};
use taskboard_shared::models::participant::Participant;
use uuid::Uuid;
use validator::ValidationError;

use crate::error::{ApiError, ApiResult};

/// Longest name a project, task or subtask may have, in characters
pub const MAX_NAME_CHARS: usize = 200;

/// Length check for names; emptiness is reported by a separate rule
pub fn within_name_limit(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::new("name_too_long"));
    }
    Ok(())
}

/// Flash shown when a submitted body cannot be parsed
pub const INVALID_FORM: &str = "The submitted form is invalid.";

/// `application/x-www-form-urlencoded` body that fails with a flash redirect
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashForm<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for FlashForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let back = referer_path(req.headers()).unwrap_or_else(|| "/".to_string());

        match axum::Form::<T>::from_request(req, state).await {
            Ok(axum::Form(value)) => Ok(FlashForm(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, location = %back, "Form rejected");
                Err(ApiError::flash(back, INVALID_FORM))
            }
        }
    }
}

/// Path and query of the `Referer` header, dropping scheme and host
///
/// Only the local part is kept, so the redirect never leaves the site.
fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;

    let local = match referer.split_once("://") {
        Some((_, rest)) => &rest[rest.find('/')?..],
        None => referer,
    };

    let local = local.split('#').next().unwrap_or_default();
    if local.starts_with('/') && !local.starts_with("//") {
        Some(local.to_string())
    } else {
        None
    }
}

/// Deserializes an optional form field, treating `""` as absent
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = Option::<String>::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::from_str(s).map(Some).map_err(de::Error::custom),
    }
}

/// Deserializes an enum form field, treating `""` as the default variant
pub fn blank_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Option::<String>::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(s) => T::deserialize(de::IntoDeserializer::<D::Error>::into_deserializer(s)),
    }
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parses a `YYYY-MM-DD` due date that may not lie before `today`
///
/// `unchanged` is the item's current due date on edit forms; resubmitting it
/// is accepted even once it has passed.
pub fn parse_due_date(raw: &str, today: NaiveDate, unchanged: Option<NaiveDate>) -> ApiResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Due date must be a valid date.".to_string()))?;

    if date < today && Some(date) != unchanged {
        return Err(ApiError::BadRequest(
            "Due date cannot be in the past.".to_string(),
        ));
    }

    Ok(date)
}

/// Trims a free-text field, mapping blank input to `None`
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Checks that an assignee is an accepted participant of the project
pub async fn check_assignee(pool: &PgPool, project_id: Uuid, assignee_id: Option<Uuid>) -> ApiResult<()> {
    let Some(assignee_id) = assignee_id else {
        return Ok(());
    };

    if !Participant::is_accepted(pool, project_id, assignee_id).await? {
        return Err(ApiError::BadRequest(
            "The assignee must be a participant of the project.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::Service as _;

    use taskboard_shared::models::task::{Priority, WorkStatus};

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        assignee_id: Option<Uuid>,
    }

    #[derive(Debug, Deserialize)]
    struct StatusForm {
        #[serde(default, deserialize_with = "blank_as_default")]
        status: WorkStatus,
        #[serde(default, deserialize_with = "blank_as_default")]
        priority: Priority,
    }

    fn form(json: &str) -> Result<Form, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_empty_string_is_none() {
        assert!(form(r#"{"assignee_id":""}"#).unwrap().assignee_id.is_none());
        assert!(form(r#"{"assignee_id":"  "}"#).unwrap().assignee_id.is_none());
        assert!(form("{}").unwrap().assignee_id.is_none());
    }

    #[test]
    fn test_value_is_parsed() {
        let id = Uuid::new_v4();
        let parsed = form(&format!(r#"{{"assignee_id":"{}"}}"#, id)).unwrap();
        assert_eq!(parsed.assignee_id, Some(id));

        assert!(form(r#"{"assignee_id":"nope"}"#).is_err());
    }

    #[test]
    fn test_blank_enum_uses_default() {
        let parsed: StatusForm = serde_json::from_str(r#"{"status":"","priority":"urgent"}"#).unwrap();
        assert_eq!(parsed.status, WorkStatus::Pending);
        assert_eq!(parsed.priority, Priority::Urgent);

        let parsed: StatusForm = serde_json::from_str(r#"{"status":"in_progress"}"#).unwrap();
        assert_eq!(parsed.status, WorkStatus::InProgress);
        assert_eq!(parsed.priority, Priority::Medium);

        assert!(serde_json::from_str::<StatusForm>(r#"{"status":"later"}"#).is_err());
    }

    #[test]
    fn test_due_date_rules() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        assert_eq!(parse_due_date("2026-03-10", today, None).unwrap(), today);
        assert!(parse_due_date("2026-03-09", today, None).is_err());
        assert!(parse_due_date("10/03/2026", today, None).is_err());
        assert!(parse_due_date("", today, None).is_err());

        // An overdue item can keep its date
        assert_eq!(parse_due_date("2026-03-09", today, Some(yesterday)).unwrap(), yesterday);
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  notes ".into())).as_deref(), Some("notes"));
        assert!(optional_text(Some("   ".into())).is_none());
        assert!(optional_text(None).is_none());
    }

    fn referer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_within_name_limit() {
        assert!(within_name_limit("").is_ok());
        assert!(within_name_limit(&"é".repeat(MAX_NAME_CHARS)).is_ok());
        assert!(within_name_limit(&"a".repeat(MAX_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_referer_path() {
        assert_eq!(
            referer_path(&referer("http://localhost:8080/projects/1/edit?x=1#top")).as_deref(),
            Some("/projects/1/edit?x=1")
        );
        assert_eq!(referer_path(&referer("/projects")).as_deref(), Some("/projects"));
        assert_eq!(referer_path(&referer("https://evil.example.com")), None);
        assert_eq!(referer_path(&referer("//evil.example.com/x")), None);
        assert_eq!(referer_path(&HeaderMap::new()), None);
    }

    #[derive(Debug, Deserialize)]
    struct AssignForm {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        assignee_id: Option<Uuid>,

        #[serde(default, deserialize_with = "blank_as_default")]
        status: WorkStatus,
    }

    async fn assign(FlashForm(form): FlashForm<AssignForm>) -> String {
        format!("{:?} {}", form.assignee_id, form.status.as_str())
    }

    async fn submit(body: &str, referer: Option<&str>) -> axum::response::Response {
        let mut app = Router::new().route("/assign", post(assign));

        let mut request = axum::http::Request::builder()
            .method("POST")
            .uri("/assign")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        app.call(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_flash_form_accepts_valid_body() {
        let response = submit("assignee_id=&status=blocked", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"None blocked");
    }

    #[tokio::test]
    async fn test_flash_form_redirects_back_on_bad_values() {
        for body in ["assignee_id=not-a-uuid", "status=finished"] {
            let response = submit(body, Some("http://localhost:8080/projects/7/edit")).await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", body);
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/projects/7/edit"
            );
            assert!(response.headers().get(header::SET_COOKIE).is_some());
        }
    }

    #[tokio::test]
    async fn test_flash_form_without_referer_goes_home() {
        let response = submit("assignee_id=42", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }
}
