//! Router configuration module
//!
//! User routes under `/api/v2/user`, the uploads directory as the fallback.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::error::panic_response;
use crate::handlers::user_routes;
use crate::middleware::request_logger_middleware;
use crate::openapi::ApiDoc;

/// Build the application router.
pub fn build_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.client_url);
    let timeout = Duration::from_secs(app_state.config.request_timeout);
    let uploads = ServeDir::new(&app_state.config.uploads_dir);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/docs/openapi.json", get(openapi_json))
        .nest("/api/v2/user", user_routes(app_state.clone()))
        .fallback_service(uploads)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(from_fn(request_logger_middleware))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                )),
        )
        .with_state(app_state)
}

/// Single frontend origin with credentials, so the session cookie is sent cross-site.
fn cors_layer(client_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(client_url.trim_end_matches('/')) {
        Ok(origin) => base.allow_origin(origin),
        Err(e) => {
            warn!("CLIENT_URL '{}' is not a valid origin ({}); CORS disabled", client_url, e);
            base
        }
    }
}

/// Simple health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
