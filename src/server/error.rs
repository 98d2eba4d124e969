//! 接口错误：所有失败响应统一为 `{detail, code, retryable}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::StormError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub detail: String,
    pub code: &'static str,
    pub retryable: bool,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub detail: String,
    pub retryable: bool,
}

impl From<StormError> for ApiError {
    fn from(err: StormError) -> Self {
        let (status, code) = match &err {
            StormError::MissingCredential(_) | StormError::Credential { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "credential_error")
            }
            StormError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            StormError::Workspace { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "workspace_error"),
            StormError::InvalidTopic(_) => (StatusCode::BAD_REQUEST, "invalid_topic"),
            StormError::Pipeline(_) => (StatusCode::INTERNAL_SERVER_ERROR, "pipeline_error"),
        };
        Self {
            status,
            code,
            retryable: err.is_retryable(),
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("❌ {}: {}", self.code, self.detail);
        } else {
            tracing::warn!("⚠️ {}: {}", self.code, self.detail);
        }
        let body = ApiErrorBody {
            detail: self.detail,
            code: self.code,
            retryable: self.retryable,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                StormError::MissingCredential("OPENAI_API_KEY"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_error",
            ),
            (
                StormError::Credential {
                    provider: "you.com".to_string(),
                    message: "401".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_error",
            ),
            (
                StormError::upstream("openai", "429"),
                StatusCode::BAD_GATEWAY,
                "upstream_error",
            ),
            (
                StormError::InvalidTopic("..".to_string()),
                StatusCode::BAD_REQUEST,
                "invalid_topic",
            ),
            (
                StormError::Pipeline("empty article".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "pipeline_error",
            ),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn test_only_upstream_is_retryable_and_detail_is_display() {
        let api = ApiError::from(StormError::upstream("openai", "timeout"));
        assert!(api.retryable);
        assert_eq!(api.detail, "openai request failed: timeout");

        let api = ApiError::from(StormError::workspace(
            std::path::Path::new("/tmp/x"),
            std::io::Error::other("disk full"),
        ));
        assert!(!api.retryable);
        assert_eq!(api.code, "workspace_error");
        assert!(api.detail.contains("disk full"));
    }
}
