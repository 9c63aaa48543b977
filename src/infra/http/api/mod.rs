pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{delete, get},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api", get(handlers::list_resource_names))
        .route(
            "/api/{resource}",
            get(handlers::list_resources).post(handlers::create_resource),
        )
        .route(
            "/api/{resource}/cache",
            delete(handlers::clear_resource_cache),
        )
        .with_state(state)
}
