use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::db::StoreError;
use crate::services::NarrativeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("At most {0} diary entries per day")]
    DiaryLimit(i64),

    #[error("Rate limited")]
    RateLimited,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Narrative error: {0}")]
    Narrative(#[from] NarrativeError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg.clone())
            }
            AppError::DiaryLimit(_) => {
                (StatusCode::TOO_MANY_REQUESTS, "diary_limit", self.to_string())
            }
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited", self.to_string()),
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "Record store unavailable".into(),
                )
            }
            AppError::Narrative(e) => {
                tracing::warn!(error = %e, "Narrative generation failed");
                match e {
                    NarrativeError::NotConfigured => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "not_configured",
                        e.to_string(),
                    ),
                    NarrativeError::Parse(_) | NarrativeError::MissingContent => {
                        (StatusCode::BAD_GATEWAY, "upstream_parse", e.to_string())
                    }
                    NarrativeError::Transport(_) | NarrativeError::Status { .. } => {
                        (StatusCode::BAD_GATEWAY, "upstream", e.to_string())
                    }
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
                "kind": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrative_failures_map_to_distinct_kinds() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let (status, kind, _) = AppError::from(NarrativeError::Parse(parse)).parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(kind, "upstream_parse");

        let (status, kind, message) = AppError::from(NarrativeError::Status {
            status: 500,
            message: "boom".into(),
        })
        .parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(kind, "upstream");
        assert!(message.contains("boom"));

        let (status, _, _) = AppError::from(NarrativeError::NotConfigured).parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn store_errors_hide_details() {
        let (status, kind, message) =
            AppError::from(StoreError::Unavailable("connection refused".into())).parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(kind, "store_unavailable");
        assert!(!message.contains("refused"));
    }

    #[test]
    fn diary_limit_is_too_many_requests() {
        let (status, kind, message) = AppError::DiaryLimit(3).parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(kind, "diary_limit");
        assert_eq!(message, "At most 3 diary entries per day");
    }
}
