use std::env;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use db::services::error::ServiceError;
use db::PgStore;
use engine::{EngineError, RunLocks, SystemClock};
use llm::LlmClient;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub llm: Arc<LlmClient>,
    pub locks: Arc<RunLocks>,
    pub clock: SystemClock,
}

/// Service configuration, read from the environment in `main`.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            llm_api_key: env::var("LLM_API_KEY")?,
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        })
    }
}

/// The acting user, taken from the `X-User-Id` header. Session
/// management lives in front of this service; here the id is trusted
/// as-is and only scopes queries.
pub struct UserId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("X-User-Id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(UserId)
            .ok_or(ApiError::Unauthenticated)
    }
}

// Custom error type for the API surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Missing or malformed X-User-Id header")]
    Unauthenticated,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Database error")]
    Database(#[from] ServiceError),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::Engine(EngineError::NotFound)
    }
}

// Convert `ApiError` into an HTTP response. Internal detail (SQL
// errors, upstream bodies) stays in the logs, not the response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Missing or malformed X-User-Id header".to_string(),
            ),
            ApiError::Engine(EngineError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Engine(EngineError::EmptySelection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "No emails matched the workflow filter".to_string(),
            ),
            ApiError::Engine(EngineError::NotConfigured) => (
                StatusCode::CONFLICT,
                "No labels are defined; create labels before classifying".to_string(),
            ),
            ApiError::Engine(EngineError::Upstream(_)) => (
                StatusCode::BAD_GATEWAY,
                "The language model is unavailable.".to_string(),
            ),
            ApiError::Engine(EngineError::Storage(_)) | ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected database error occurred.".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn engine_errors_map_to_the_documented_statuses() {
        assert_eq!(
            status_of(ApiError::Engine(EngineError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Engine(EngineError::EmptySelection)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ApiError::Engine(EngineError::NotConfigured)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Engine(EngineError::Upstream("down".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ApiError::Engine(EngineError::Storage("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_and_identity_errors_map_to_4xx() {
        assert_eq!(
            status_of(ApiError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ApiError::Unauthenticated), StatusCode::UNAUTHORIZED);
    }
}
