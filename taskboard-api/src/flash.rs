/// One-shot flash messages carried in a cookie
///
/// A form handler that redirects attaches a message with [`redirect_with_flash`]
/// or [`with_flash`]; the next page view reads and clears it with
/// [`take_flash`]. Values are hex encoded so any UTF-8 text survives the
/// cookie grammar.
///
/// # Example
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use taskboard_api::flash::{take_flash, with_flash};
///
/// let jar = with_flash(CookieJar::new(), "Project created");
/// let (_, message) = take_flash(jar);
/// assert_eq!(message.as_deref(), Some("Project created"));
/// ```

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Name of the flash cookie
pub const FLASH_COOKIE: &str = "flash";

/// Builds the flash cookie for `message`
pub fn flash_cookie(message: &str) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, hex::encode(message)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Adds a flash message to the jar
pub fn with_flash(jar: CookieJar, message: &str) -> CookieJar {
    jar.add(flash_cookie(message))
}

/// Reads the pending flash message and removes it from the jar
///
/// Undecodable values are dropped silently.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    let message = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| hex::decode(cookie.value()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match message {
        Some(message) => {
            let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
            (jar, Some(message))
        }
        None if jar.get(FLASH_COOKIE).is_some() => {
            (jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/")), None)
        }
        None => (jar, None),
    }
}

/// 303 redirect to `location` carrying `message`
pub fn redirect_with_flash(location: &str, message: &str) -> Response {
    let jar = with_flash(CookieJar::new(), message);
    (jar, Redirect::to(location)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn test_round_trip_through_jar() {
        let jar = with_flash(CookieJar::new(), "Tâche créée; ok");
        let (jar, message) = take_flash(jar);

        assert_eq!(message.as_deref(), Some("Tâche créée; ok"));
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn test_empty_jar_has_no_flash() {
        let (_, message) = take_flash(CookieJar::new());
        assert!(message.is_none());
    }

    #[test]
    fn test_garbage_value_is_discarded() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "not-hex"));
        let (jar, message) = take_flash(jar);

        assert!(message.is_none());
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = flash_cookie("hi");

        assert_eq!(cookie.value(), "6869");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_redirect_with_flash() {
        let response = redirect_with_flash("/projects", "Saved");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/projects");

        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("flash=5361766564"));
    }
}
