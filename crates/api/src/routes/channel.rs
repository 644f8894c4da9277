use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use huddle_services::events::{ChannelView, MessageView};
use huddle_services::repo::{PaginatedResult, PaginationParams};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<Json<ChannelView>, ApiError> {
    let channel = state.engine.join_channel(auth.user_id, channel_id).await?;
    Ok(Json(channel))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.engine.leave_channel(auth.user_id, channel_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<PaginatedResult<MessageView>>, ApiError> {
    let params = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query
            .per_page
            .unwrap_or(state.settings.engine.history_per_page),
    };
    let page = state
        .engine
        .channel_history(auth.user_id, channel_id, &params)
        .await?;
    Ok(Json(page))
}

pub async fn post_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<Uuid>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let message = state
        .engine
        .post_message(auth.user_id, channel_id, body.content, body.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
