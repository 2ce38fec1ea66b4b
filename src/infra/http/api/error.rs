use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::index::IndexError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const BACKEND_UNAVAILABLE: &str = "backend_unavailable";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
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
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    /// The index could not answer. The cause stays in the diagnostic
    /// report and is not shown to clients.
    pub fn backend_unavailable(source: &'static str, error: &IndexError) -> Self {
        let status = StatusCode::SERVICE_UNAVAILABLE;
        Self {
            report: Some(ErrorReport::from_error(source, status, error)),
            ..Self::new(
                status,
                codes::BACKEND_UNAVAILABLE,
                "Search backend unavailable",
                None,
            )
        }
    }

    /// The index refused the query as asked. Its reason is logged and the
    /// client is told to fix the request.
    pub fn rejected(source: &'static str, error: &IndexError) -> Self {
        let status = StatusCode::BAD_REQUEST;
        Self {
            report: Some(ErrorReport::from_error(source, status, error)),
            ..Self::bad_request(
                "query rejected",
                Some("a cursor only continues the sort it was issued for".to_string()),
            )
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                "infra::http::api",
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        report.attach(&mut response);
        response
    }
}
