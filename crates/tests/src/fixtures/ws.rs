use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use super::test_app::TestApp;

/// A WebSocket test client speaking the typed command/event protocol.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub connection_id: String,
}

impl WsClient {
    /// Connects and consumes the initial `connected` frame.
    pub async fn connect(app: &TestApp, token: &str) -> Self {
        let (stream, _) = connect_async(app.ws_url(token).as_str())
            .await
            .expect("WS connect failed");
        let mut client = Self {
            stream,
            connection_id: String::new(),
        };
        let connected = client.recv().await;
        assert_eq!(connected["type"], "connected");
        client.connection_id = connected["data"]["connection_id"]
            .as_str()
            .unwrap()
            .to_string();
        client
    }

    pub async fn send(&mut self, command: Value) {
        self.stream
            .send(Message::text(command.to_string()))
            .await
            .expect("WS send failed");
    }

    /// Next JSON frame, bounded so a missing event fails fast.
    pub async fn recv(&mut self) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(5), self.stream.next())
            .await
            .expect("Timed out waiting for WS frame")
            .expect("WS stream closed")
            .expect("WS read failed");
        let text = frame.into_text().expect("Non-text WS frame");
        serde_json::from_str(&text).expect("Invalid JSON frame")
    }

    /// Next frame, asserted to be of the given type.
    pub async fn recv_type(&mut self, expected: &str) -> Value {
        let frame = self.recv().await;
        assert_eq!(frame["type"], expected, "unexpected frame: {frame}");
        frame
    }

    /// Asserts nothing arrives within the window.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(frame))) = tokio::time::timeout(window, self.stream.next()).await {
            panic!("Expected no frame, got: {frame:?}");
        }
    }

    /// Subscribes to a channel room and waits for the round trip: commands on
    /// one connection are processed in order, so the pong reply means the
    /// join has been applied.
    pub async fn join_channel(&mut self, channel_id: &str) {
        self.send(serde_json::json!({
            "type": "join-channel",
            "data": { "channel_id": channel_id },
        }))
        .await;
        self.send(serde_json::json!({ "type": "ping" })).await;
        self.recv_type("pong").await;
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
