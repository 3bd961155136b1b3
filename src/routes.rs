use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::registry::ActivityRegistry;
use crate::settings::Settings;
use crate::teachers::TeacherDirectory;
use crate::{activities, auth, misc};

pub fn app(
    registry: Arc<ActivityRegistry>,
    teachers: Arc<TeacherDirectory>,
    settings: &Settings,
) -> Router {
    let router = Router::new()
        .route("/", get(misc::root))
        .route("/status", get(misc::status))
        .route("/activities", get(activities::list_activities))
        .route(
            "/activities/:activity_name/signup",
            post(activities::signup),
        )
        .route(
            "/activities/:activity_name/unregister",
            delete(activities::unregister),
        )
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/me", get(auth::me_handler))
        .nest_service("/static", ServeDir::new(&settings.static_dir))
        .layer(Extension(registry))
        .layer(Extension(teachers))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");

                    info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    if settings.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
