use axum::http::StatusCode;
use axum::response::Redirect;
use tracing::instrument;

pub const FRONT_PAGE: &str = "/static/index.html";

#[instrument]
pub async fn root() -> Redirect {
    Redirect::temporary(FRONT_PAGE)
}

pub async fn status() -> StatusCode {
    StatusCode::OK
}
