//! Briefing endpoints
//!
//! `POST /api/briefing` is a stateless relay: it renders the system prompt
//! from the posted task snapshot, forwards the transcript upstream and
//! streams the generated text back as `text/plain`.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use onething_ai_adapters::ChatMessage;
use onething_core::briefing::{build_system_prompt, BriefingRequest, Message, Role};
use onething_core::DailyReview;
use serde::Deserialize;

pub const NO_TASKS_ERROR: &str = "No tasks provided";
pub const RELAY_FAILED_ERROR: &str = "Failed to process briefing";

fn to_chat_message(message: &Message) -> ChatMessage {
    match message.role {
        Role::User => ChatMessage::user(message.content.clone()),
        Role::Assistant => ChatMessage::assistant(message.content.clone()),
    }
}

pub async fn relay_briefing(State(state): State<AppState>, body: Bytes) -> Response {
    let request: BriefingRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Briefing API error: invalid request body: {}", e);
            return ApiError::internal(RELAY_FAILED_ERROR).into_response();
        }
    };

    if request.tasks.is_empty() {
        return ApiError::bad_request(NO_TASKS_ERROR).into_response();
    }

    let system = build_system_prompt(&request.tasks);
    let messages: Vec<ChatMessage> = request.messages.iter().map(to_chat_message).collect();
    tracing::debug!(
        "Relaying briefing turn: messages={}, tasks={}",
        messages.len(),
        request.tasks.len()
    );

    let mut stream = match state.provider.stream_text(&system, &messages).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Briefing API error: {:#}", e);
            return ApiError::internal(RELAY_FAILED_ERROR).into_response();
        }
    };

    // Wait for the first fragment so an upstream failure can still become a
    // 500 before any body bytes are committed.
    let first = match stream.next().await {
        Some(Ok(text)) => Some(text),
        Some(Err(e)) => {
            tracing::error!("Briefing API error: {:#}", e);
            return ApiError::internal(RELAY_FAILED_ERROR).into_response();
        }
        None => None,
    };

    let rest = stream.map(|item| {
        item.map_err(|e| {
            tracing::error!("Briefing stream aborted: {:#}", e);
            std::io::Error::other(e.to_string())
        })
    });
    let body = futures::stream::iter(first.map(Ok)).chain(rest);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBriefingRequest {
    pub task_id: String,
    pub goal: String,
}

pub async fn complete_briefing(
    State(state): State<AppState>,
    payload: Result<Json<CompleteBriefingRequest>, JsonRejection>,
) -> Result<Json<DailyReview>, ApiError> {
    let Json(request) = payload?;
    let review = state
        .store
        .complete_briefing(&request.task_id, request.goal.trim())
        .await?;
    Ok(Json(review))
}

pub async fn todays_briefing(State(state): State<AppState>) -> Json<Option<DailyReview>> {
    Json(state.store.get_todays_briefing().await)
}
