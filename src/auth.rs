use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Extension, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::{CookieJar, WithRejection};
use tracing::{info, instrument, warn};

use crate::datatypes::{LoginRequest, LoginResponse, MeResponse, MessageResponse};
use crate::error::ApiError;
use crate::teachers::{Teacher, TeacherDirectory};

/// Cookie carrying the logged-in teacher's username.
///
/// The value is neither signed nor backed by a server-side session: anyone who
/// can copy the cookie can act as that teacher until the directory changes.
pub const SESSION_COOKIE: &str = "session_user";

fn session_cookie(username: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, username))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}

fn directory_from_parts(parts: &Parts) -> Result<Arc<TeacherDirectory>, ApiError> {
    parts
        .extensions
        .get::<Arc<TeacherDirectory>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("teacher directory is not set up".into()))
}

/// Resolves the session cookie against the directory.
fn current_teacher(jar: &CookieJar, directory: &TeacherDirectory) -> Option<Teacher> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| directory.authorize(cookie.value()))
}

#[async_trait]
impl<S> FromRequestParts<S> for Teacher
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let directory = directory_from_parts(parts)?;
        let jar = CookieJar::from_headers(&parts.headers);

        match current_teacher(&jar, &directory) {
            Some(teacher) => Ok(teacher),
            None => {
                if let Some(cookie) = jar.get(SESSION_COOKIE) {
                    warn!(user = cookie.value(), "session names an unknown teacher");
                }
                Err(ApiError::LoginRequired)
            }
        }
    }
}

#[instrument(skip(jar, directory, credentials), fields(username = %credentials.username.trim()))]
pub async fn login_handler(
    jar: CookieJar,
    directory: Extension<Arc<TeacherDirectory>>,
    WithRejection(Json(credentials), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> AuthResponse {
    let username = credentials.username.trim();

    match directory.verify(username, &credentials.password) {
        Some(teacher) => {
            info!("login accepted");
            AuthResponse::LoggedIn(jar.add(session_cookie(teacher.username().to_owned())), teacher)
        }
        None => {
            warn!("login rejected");
            AuthResponse::Failed(ApiError::InvalidCredentials)
        }
    }
}

#[instrument(skip(jar))]
pub async fn logout_handler(jar: CookieJar) -> AuthResponse {
    AuthResponse::LoggedOut(jar.add(removal_cookie()))
}

#[instrument(skip(jar, directory))]
pub async fn me_handler(
    jar: CookieJar,
    directory: Extension<Arc<TeacherDirectory>>,
) -> AuthResponse {
    AuthResponse::Identity(current_teacher(&jar, &directory))
}

#[derive(Debug)]
pub enum AuthResponse {
    LoggedIn(CookieJar, Teacher),
    LoggedOut(CookieJar),
    Identity(Option<Teacher>),
    Failed(ApiError),
}

impl IntoResponse for AuthResponse {
    fn into_response(self) -> Response {
        match self {
            AuthResponse::LoggedIn(jar, teacher) => (
                StatusCode::OK,
                jar,
                Json(LoginResponse {
                    message: "Login successful".into(),
                    username: teacher.username().to_owned(),
                }),
            )
                .into_response(),
            AuthResponse::LoggedOut(jar) => (
                StatusCode::OK,
                jar,
                Json(MessageResponse {
                    message: "Logged out".into(),
                }),
            )
                .into_response(),
            AuthResponse::Identity(teacher) => (
                StatusCode::OK,
                Json(MeResponse {
                    authenticated: teacher.is_some(),
                    username: teacher.map(|t| t.username().to_owned()),
                }),
            )
                .into_response(),
            AuthResponse::Failed(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::http::Request;

    fn directory() -> Arc<TeacherDirectory> {
        Arc::new(TeacherDirectory::from_pairs([("anna", "pw1")]))
    }

    async fn extract(cookie: Option<&str>, directory: Option<Arc<TeacherDirectory>>) -> Result<Teacher, ApiError> {
        let mut builder = Request::builder().uri("/activities/Chess%20Club/signup");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(directory) = directory {
            parts.extensions.insert(directory);
        }

        Teacher::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_guard_accepts_known_teacher() {
        let teacher = extract(Some("session_user=anna"), Some(directory())).await.unwrap();
        assert_eq!(teacher.username(), "anna");
    }

    #[tokio::test]
    async fn test_guard_rejects_missing_or_unknown_cookie() {
        assert_eq!(
            extract(None, Some(directory())).await,
            Err(ApiError::LoginRequired)
        );
        assert_eq!(
            extract(Some("session_user=mallory"), Some(directory())).await,
            Err(ApiError::LoginRequired)
        );
        assert_eq!(
            extract(Some("other=anna"), Some(directory())).await,
            Err(ApiError::LoginRequired)
        );
    }

    #[tokio::test]
    async fn test_guard_without_directory_is_internal() {
        let err = extract(Some("session_user=anna"), None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("anna".into());
        assert_eq!(cookie.value(), "anna");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_logout_always_clears_cookie() {
        let response = AuthResponse::LoggedOut(CookieJar::new().add(removal_cookie())).into_response();

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("session_user=;"));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
