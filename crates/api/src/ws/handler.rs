use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use huddle_services::auth::TokenKind;
use huddle_services::engine::EngineError;
use huddle_services::events::{ClientCommand, ErrorCode, ServerEvent};
use huddle_services::registry::RoomKey;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let claims = match state.auth.verify(&params.token, TokenKind::Access) {
        Ok(c) => c,
        Err(_) => {
            return Response::builder()
                .status(401)
                .body("Unauthorized".into())
                .unwrap();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, claims.sub))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (connection_id, mut buffer) = state.registry.open_connection(user_id);
    info!(%user_id, %connection_id, "WebSocket connected");

    if let Err(e) = state.presence.connect(user_id).await {
        warn!(%user_id, %e, "Failed to record presence");
    }

    let (mut sink, mut stream) = socket.split();

    // Writer task: drains this connection's send buffer onto the socket in
    // enqueue order. Ends when the buffer's sender side is dropped at
    // close_connection, or when the socket write fails.
    let writer = tokio::spawn(async move {
        while let Some(text) = buffer.recv().await {
            if sink.send(Message::text(text)).await.is_err() {
                break;
            }
        }
    });

    state.registry.send_to(
        &connection_id,
        &ServerEvent::Connected {
            user_id,
            connection_id: connection_id.clone(),
        },
    );

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_command(&state, user_id, &connection_id, &text).await;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(%user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Teardown order matters: room subscriptions go first (no further
    // deliveries target this connection), presence flips last.
    state.registry.close_connection(&connection_id);
    if let Err(e) = state.presence.disconnect(user_id).await {
        warn!(%user_id, %e, "Failed to record disconnect");
    }
    let _ = writer.await;

    info!(%user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_command(
    state: &AppState,
    user_id: Uuid,
    connection_id: &str,
    text: &str,
) {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            state.registry.send_to(
                connection_id,
                &ServerEvent::OperationError {
                    code: ErrorCode::Validation,
                    message: format!("Malformed command: {e}"),
                },
            );
            return;
        }
    };

    debug!(%user_id, %connection_id, ?command, "WS command received");

    match command {
        ClientCommand::JoinTeamRooms { team_ids } => {
            for team_id in team_ids {
                match state.authorizer.is_team_member(user_id, team_id).await {
                    Ok(true) => state.registry.join_room(connection_id, RoomKey::Team(team_id)),
                    Ok(false) => send_error(state, connection_id, &EngineError::AccessDenied),
                    Err(e) => send_error(state, connection_id, &e.into()),
                }
            }
        }
        ClientCommand::JoinChannel { channel_id } => {
            match state.authorizer.can_join_channel(user_id, channel_id).await {
                Ok(true) => state
                    .registry
                    .join_room(connection_id, RoomKey::Channel(channel_id)),
                Ok(false) => send_error(state, connection_id, &EngineError::AccessDenied),
                Err(e) => send_error(state, connection_id, &e.into()),
            }
        }
        ClientCommand::LeaveChannel { channel_id } => {
            state
                .registry
                .leave_room(connection_id, RoomKey::Channel(channel_id));
        }
        ClientCommand::SendMessage {
            channel_id,
            content,
            parent_id,
        } => {
            if let Err(e) = state
                .engine
                .post_message(user_id, channel_id, content, parent_id)
                .await
            {
                send_error(state, connection_id, &e);
            }
        }
        ClientCommand::EditMessage {
            message_id,
            content,
        } => {
            if let Err(e) = state.engine.edit_message(user_id, message_id, content).await {
                send_error(state, connection_id, &e);
            }
        }
        ClientCommand::DeleteMessage { message_id } => {
            if let Err(e) = state.engine.delete_message(user_id, message_id).await {
                send_error(state, connection_id, &e);
            }
        }
        ClientCommand::Typing {
            channel_id,
            is_typing,
        } => {
            if let Err(e) = state
                .engine
                .typing(connection_id, user_id, channel_id, is_typing)
                .await
            {
                send_error(state, connection_id, &e);
            }
        }
        ClientCommand::Ping => {
            state.registry.send_to(connection_id, &ServerEvent::Pong);
        }
    }
}

fn send_error(state: &AppState, connection_id: &str, err: &EngineError) {
    state.registry.send_to(
        connection_id,
        &ServerEvent::OperationError {
            code: err.code(),
            message: err.to_string(),
        },
    );
}
