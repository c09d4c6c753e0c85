/// Home page shown after login
///
/// ```text
/// GET /index
/// ```

use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use taskboard_shared::auth::middleware::AuthContext;

use crate::flash::take_flash;

/// Home page view
#[derive(Debug, Serialize)]
pub struct HomeView {
    pub flash: Option<String>,
    pub user: AuthContext,
}

pub async fn index(auth: AuthContext, jar: CookieJar) -> (CookieJar, Json<HomeView>) {
    let (jar, flash) = take_flash(jar);
    (jar, Json(HomeView { flash, user: auth }))
}
