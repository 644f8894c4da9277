use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use huddle_services::events::MessageView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleReactionRequest {
    pub emoji: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleReactionResponse {
    pub added: bool,
    pub message: MessageView,
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
    Json(body): Json<EditMessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let message = state
        .engine
        .edit_message(auth.user_id, message_id, body.content)
        .await?;
    Ok(Json(message))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_message(auth.user_id, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
    Json(body): Json<ToggleReactionRequest>,
) -> Result<Json<ToggleReactionResponse>, ApiError> {
    let (added, message) = state
        .engine
        .toggle_reaction(auth.user_id, message_id, body.emoji)
        .await?;
    Ok(Json(ToggleReactionResponse { added, message }))
}
