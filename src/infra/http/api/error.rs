use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tablero_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::application::resources::ResourceError;
use crate::domain::error::DomainError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const REPO: &str = "repo_error";
    pub const CACHE: &str = "cache_error";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "invalid input",
                Some(message),
            ),
        }
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Domain(err) => err.into(),
            ResourceError::Repo(RepoError::NotFound { resource }) => {
                Self::not_found("resource not found", Some(resource))
            }
            ResourceError::Repo(RepoError::InvalidInput { message }) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "invalid input",
                Some(message),
            ),
            ResourceError::Repo(RepoError::Persistence(message)) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "repository error",
                Some(message),
            ),
            ResourceError::Cache(err) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE,
                "cache unavailable",
                Some(err.to_string()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}
