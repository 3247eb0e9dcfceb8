// error.rs
use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

/// Transport-level failure talking to the poll store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Poll,
    Option,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Poll => f.write_str("Poll"),
            Entity::Option => f.write_str("Option"),
        }
    }
}

/// Outcome of a poll operation that did not succeed.
///
/// Everything except `StoreUnavailable` is an expected result the caller branches on.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("You have already voted on this poll")]
    DuplicateVote,

    #[error("Option does not belong to this poll")]
    InvalidAssociation,

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl PollError {
    pub fn status(&self) -> StatusCode {
        match self {
            PollError::Validation(_) | PollError::InvalidAssociation => StatusCode::BAD_REQUEST,
            PollError::NotFound(_) => StatusCode::NOT_FOUND,
            PollError::DuplicateVote => StatusCode::CONFLICT,
            PollError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for PollError {
    fn from(rejection: JsonRejection) -> Self {
        PollError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            PollError::StoreUnavailable(e) => {
                error!("Poll store failure: {e}");
                "Failed to reach the poll store".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Failures that stop the service from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot open poll store: {0}")]
    Store(#[from] StoreError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_map_to_distinct_statuses() {
        assert_eq!(
            PollError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PollError::NotFound(Entity::Poll).status(), StatusCode::NOT_FOUND);
        assert_eq!(PollError::DuplicateVote.status(), StatusCode::CONFLICT);
        assert_eq!(PollError::InvalidAssociation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PollError::from(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(PollError::NotFound(Entity::Poll).to_string(), "Poll not found");
        assert_eq!(PollError::NotFound(Entity::Option).to_string(), "Option not found");
    }
}
