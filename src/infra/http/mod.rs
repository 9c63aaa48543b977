pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub(crate) use middleware::METRIC_HTTP_REQUESTS;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use axum::{Router, middleware as axum_middleware, routing::get};

/// Full HTTP surface: health probe plus the resource API, with request ids
/// and response logging applied to every route.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(api::handlers::health))
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
