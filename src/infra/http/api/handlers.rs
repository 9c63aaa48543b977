//! Resource listing handlers.

use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};
use tablero_api_types::CacheClearResponse;

use crate::application::resources::ListingQuery;
use crate::domain::resources::ResourceName;

use super::error::ApiError;
use super::state::ApiState;

/// `GET /api`
pub async fn list_resource_names(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let names = state.resources.resources().await?;
    Ok(Json(json!({ "data": names })))
}

/// `GET /api/{resource}?page=&per_page=&filter[field]=a,b&sort=-field`
pub async fn list_resources(
    State(state): State<ApiState>,
    Path(resource): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let resource = ResourceName::parse(&resource)?;
    let listing = ListingQuery::from_query_str(
        query.as_deref().unwrap_or_default(),
        state.resources.bounds(),
    );

    let page = state.resources.list(&resource, &listing).await?;
    Ok(Json(page))
}

/// `POST /api/{resource}`
pub async fn create_resource(
    State(state): State<ApiState>,
    Path(resource): Path<String>,
    Json(record): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = ResourceName::parse(&resource)?;
    let stored = state.resources.create(&resource, record).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `DELETE /api/{resource}/cache`
pub async fn clear_resource_cache(
    State(state): State<ApiState>,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = ResourceName::parse(&resource)?;
    let scope = state.resources.clear_cache(&resource)?;
    Ok(Json(CacheClearResponse {
        resource: resource.to_string(),
        scope: scope.as_str().to_string(),
    }))
}

/// `GET /health`
pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
