use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::infra::error::InfraError;

/// Error message attached to a response so `log_responses` can report it.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Top-level failure of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_attaches_to_response_extensions() {
        let mut response = Response::new(axum::body::Body::empty());
        ErrorReport::from_message("tests", StatusCode::BAD_REQUEST, "bad page")
            .attach(&mut response);

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.status, StatusCode::BAD_REQUEST);
        assert_eq!(report.messages, vec!["bad page"]);
    }

    #[test]
    fn app_error_wraps_infra_errors() {
        let error = AppError::from(InfraError::configuration("bad port"));
        assert_eq!(error.to_string(), "configuration error: bad port");
    }
}
