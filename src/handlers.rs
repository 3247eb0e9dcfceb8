// handlers.rs
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::PollError;
use crate::fingerprint::VoterFingerprint;
use crate::models::{CreatePollRequest, VoteRequest};
use crate::poll;
use crate::store::PollStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PollStore>,
}

impl AppState {
    pub fn with_store(store: Arc<dyn PollStore>) -> Self {
        Self { store }
    }
}

/// JSON body extractor whose rejections use the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(PollError))]
pub struct ApiJson<T>(pub T);

/// Service banner
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Polling API",
        "endpoints": {
            "health": "/health",
            "polls": "/polls",
            "poll": "/polls/{id}",
            "results": "/polls/{id}/results",
            "vote": "/polls/{id}/vote"
        }
    }))
}

pub async fn health() -> &'static str {
    "API running"
}

/// List all active polls
pub async fn list_polls(State(state): State<AppState>) -> Result<impl IntoResponse, PollError> {
    let polls = poll::list_active_polls(state.store.as_ref()).await?;
    Ok(Json(polls))
}

/// Get one poll with its options
pub async fn get_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let poll = poll::get_poll_with_options(state.store.as_ref(), &id).await?;
    Ok(Json(poll))
}

pub async fn create_poll(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreatePollRequest>,
) -> Result<impl IntoResponse, PollError> {
    let poll =
        poll::create_poll_with_options(state.store.as_ref(), &request.question, &request.options)
            .await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Cast the caller's vote
pub async fn vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    voter: VoterFingerprint,
    ApiJson(request): ApiJson<VoteRequest>,
) -> Result<impl IntoResponse, PollError> {
    let option_id = request
        .option_id
        .ok_or_else(|| PollError::Validation("Option ID is required".into()))?;

    let poll =
        poll::register_vote(state.store.as_ref(), &id, &option_id.as_raw(), voter.as_str())
            .await?;
    Ok(Json(poll))
}

/// Vote counts and percentages
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let results = poll::compute_results(state.store.as_ref(), &id).await?;
    Ok(Json(results))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let poll = poll::delete_poll(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "message": "Poll deleted successfully", "poll": poll })))
}

/// Recount a poll's counters from its vote records
pub async fn reconcile_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let poll = poll::reconcile_poll(state.store.as_ref(), &id).await?;
    Ok(Json(poll))
}
