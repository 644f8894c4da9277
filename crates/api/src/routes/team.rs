use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use huddle_db::models::{Team, TeamRole};
use huddle_services::events::ChannelView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub team: Team,
    pub channels: Vec<ChannelView>,
}

#[derive(Debug, Deserialize)]
pub struct JoinTeamRequest {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct TeamMemberResponse {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub is_online: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMemberResponse>,
}

#[derive(Debug, Serialize)]
pub struct InviteCodeResponse {
    pub invite_code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreateTeamResponse>), ApiError> {
    let (team, channels) = state
        .engine
        .create_team(auth.user_id, body.name, body.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse {
            team,
            channels: channels.into_iter().map(ChannelView::from).collect(),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Team>>, ApiError> {
    let teams = state.teams.find_user_teams(auth.user_id).await?;
    Ok(Json(teams))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamDetailResponse>, ApiError> {
    if !state.authorizer.is_team_member(auth.user_id, team_id).await? {
        return Err(ApiError::Forbidden("Not a member of this team".to_string()));
    }

    let team = state.teams.find_by_id(team_id).await?;
    let members = state
        .teams
        .members_with_users(team_id)
        .await?
        .into_iter()
        .map(|(member, user)| TeamMemberResponse {
            user_id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            role: member.role,
            joined_at: member.joined_at,
            is_online: user.is_online,
            last_seen_at: user.last_seen_at,
        })
        .collect();

    Ok(Json(TeamDetailResponse { team, members }))
}

pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<JoinTeamRequest>,
) -> Result<Json<Team>, ApiError> {
    let team = state
        .engine
        .join_team_by_invite(auth.user_id, &body.invite_code)
        .await?;
    Ok(Json(team))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.engine.leave_team(auth.user_id, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn regenerate_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<InviteCodeResponse>, ApiError> {
    let invite_code = state.engine.regenerate_invite(auth.user_id, team_id).await?;
    Ok(Json(InviteCodeResponse { invite_code }))
}

pub async fn create_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelView>), ApiError> {
    let channel = state
        .engine
        .create_channel(
            auth.user_id,
            team_id,
            body.name,
            body.description,
            body.is_private,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn list_channels(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<ChannelView>>, ApiError> {
    if !state.authorizer.is_team_member(auth.user_id, team_id).await? {
        return Err(ApiError::Forbidden("Not a member of this team".to_string()));
    }
    let channels = state.channels.find_visible(team_id, auth.user_id).await?;
    Ok(Json(
        channels.into_iter().map(ChannelView::from).collect(),
    ))
}
