use crate::datatypes::{Activity, EmailQuery, MessageResponse};
use crate::error::ApiError;
use crate::registry::ActivityRegistry;
use crate::teachers::Teacher;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip(registry))]
pub async fn list_activities(registry: Extension<Arc<ActivityRegistry>>) -> ActivitiesResponse {
    ActivitiesResponse::List(registry.list().await)
}

#[instrument(skip(registry, teacher), fields(teacher = %teacher))]
pub async fn signup(
    teacher: Teacher,
    Path(activity_name): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<EmailQuery>, ApiError>,
    registry: Extension<Arc<ActivityRegistry>>,
) -> ActivitiesResponse {
    match registry.signup(&teacher, &activity_name, &query.email).await {
        Ok(message) => ActivitiesResponse::Done(message),
        Err(err) => ActivitiesResponse::Failed(err),
    }
}

#[instrument(skip(registry, teacher), fields(teacher = %teacher))]
pub async fn unregister(
    teacher: Teacher,
    Path(activity_name): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<EmailQuery>, ApiError>,
    registry: Extension<Arc<ActivityRegistry>>,
) -> ActivitiesResponse {
    match registry.unregister(&teacher, &activity_name, &query.email).await {
        Ok(message) => ActivitiesResponse::Done(message),
        Err(err) => ActivitiesResponse::Failed(err),
    }
}

#[derive(Debug)]
pub enum ActivitiesResponse {
    List(IndexMap<String, Activity>),
    Done(String),
    Failed(ApiError),
}

impl IntoResponse for ActivitiesResponse {
    fn into_response(self) -> Response {
        match self {
            ActivitiesResponse::List(l) => (StatusCode::OK, Json(l)).into_response(),
            ActivitiesResponse::Done(message) => {
                (StatusCode::OK, Json(MessageResponse { message })).into_response()
            }
            ActivitiesResponse::Failed(err) => err.into_response(),
        }
    }
}
