//! WebSocket endpoint: upgrade, token handshake, then hand off to the hub.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::time;

use courier_common::auth;
use courier_common::UserId;

use crate::hub::socket;
use crate::EdgeState;

/// How long a freshly opened socket has to present its bearer token.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

// Close codes (4000-range for application-level).
const CLOSE_AUTH_FAILED: u16 = 4001;
const CLOSE_AUTH_TIMEOUT: u16 = 4002;

pub fn router() -> Router<EdgeState> {
    Router::new().route("/", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<EdgeState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(mut socket: WebSocket, state: EdgeState) {
    let user_id = match authenticate(&mut socket, &state).await {
        Some(user_id) => user_id,
        None => return,
    };

    socket::run(state.hub.clone(), user_id, socket).await;
}

/// Require the client's first text frame — the raw bearer token, not JSON —
/// within [`AUTH_TIMEOUT`]. Failure or timeout closes the socket with a
/// close frame and yields `None`.
async fn authenticate(socket: &mut WebSocket, state: &EdgeState) -> Option<UserId> {
    let token = match time::timeout(AUTH_TIMEOUT, first_text_frame(socket)).await {
        Ok(Some(token)) => token,
        Ok(None) => return None, // client went away before authenticating
        Err(_) => {
            let _ = send_close(socket, CLOSE_AUTH_TIMEOUT, "Handshake timeout").await;
            return None;
        }
    };

    let verified = auth::verify(&token, state.config.jwt_secret.as_bytes())
        .and_then(|claims| claims.user_id());

    match verified {
        Ok(user_id) => Some(user_id),
        Err(err) => {
            tracing::warn!(%err, "rejecting socket: token verification failed");
            let _ = send_close(socket, CLOSE_AUTH_FAILED, "Authentication failed").await;
            None
        }
    }
}

async fn first_text_frame(socket: &mut WebSocket) -> Option<String> {
    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => return Some(text.to_string()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

async fn send_close(socket: &mut WebSocket, code: u16, reason: &str) -> Result<(), axum::Error> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        })))
        .await
}
