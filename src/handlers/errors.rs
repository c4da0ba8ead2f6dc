use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::services::pipeline::PipelineError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
}

impl PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Fetch(_) | PipelineError::Parse(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Encode(_) | PipelineError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) | PipelineError::Parse(_) => "upstream_error",
            PipelineError::Encode(_) | PipelineError::Store(_) => "server_error",
        }
    }
}

pub fn error_response(status: StatusCode, error_type: &str, code: &str, message: &str) -> Response {
    let message: String = message.chars().take(1000).collect();
    error!("Error response: {} - {}", status, message);

    let body = ErrorBody {
        error: ErrorDetail {
            message,
            error_type: error_type.to_string(),
            code: code.to_string(),
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let code = format!("{}_failed", self.stage());
        error_response(
            self.status_code(),
            self.error_type(),
            &code,
            &self.to_string(),
        )
    }
}
