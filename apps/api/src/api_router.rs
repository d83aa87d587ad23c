use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

#[cfg(test)]
mod tests;

pub use cors::CorsPolicy;

/// Builds the HTTP surface.
///
/// Layers run outermost first: tracing, request id, body limit, CORS, then API-key
/// authentication on the protected routes only.
pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/v1/trigger/jenkins",
            post(handlers::builds::trigger_jenkins_build_handler),
        )
        .route(
            "/api/v1/status/jenkins",
            get(handlers::builds::jenkins_build_status_handler),
        )
        .route("/api/v1/audit", get(handlers::audit::list_audit_log_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::root::root_handler))
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .fallback(handlers::root::not_found_handler)
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn_with_state(app_state.clone(), cors::apply_cors))
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::limit_body_size,
        ))
        .layer(from_fn(middleware::assign_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
