//! `WS /ws`: receive `{"value", "multiplier"}`, reply `{"result"}`, repeat.
//!
//! The first malformed frame closes the connection. So do an idle client
//! (past `server.ws_idle_timeout_secs`) and server shutdown.

use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::time::error::Elapsed;
use tokio_util::sync::CancellationToken;
use wavecalc_common::ComputeRequest;

use crate::state::SharedState;

/// Close reasons are limited to 123 bytes by the protocol.
const MAX_CLOSE_REASON: usize = 120;

pub(crate) const SHUTDOWN_REASON: &str = "server shutting down";

#[derive(Debug, PartialEq)]
enum LoopExit {
    ClientClosed,
    Disconnected,
    SendFailed,
    Malformed(String),
    Idle,
    Shutdown,
}

pub async fn compute_ws(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    let idle = state.ws_idle_timeout();
    let shutdown = state.shutdown.clone();
    ws.on_upgrade(move |socket| compute_loop(socket, idle, shutdown))
}

async fn compute_loop(mut socket: WebSocket, idle: Option<Duration>, shutdown: CancellationToken) {
    tracing::debug!("compute socket opened");

    let exit = loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break LoopExit::Shutdown,
            received = recv_within(&mut socket, idle) => received,
        };

        let message = match received {
            Err(_) => break LoopExit::Idle,
            Ok(None) | Ok(Some(Err(_))) => break LoopExit::Disconnected,
            Ok(Some(Ok(message))) => message,
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break LoopExit::ClientClosed,
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Binary(_) => break LoopExit::Malformed("binary frames are not supported".into()),
        };

        let response = match ComputeRequest::from_json(text.as_str()).and_then(|req| req.compute()) {
            Ok(response) => response,
            Err(err) => break LoopExit::Malformed(err.to_string()),
        };

        let payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(err) => break LoopExit::Malformed(err.to_string()),
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            break LoopExit::SendFailed;
        }
    };

    let close = match &exit {
        LoopExit::Malformed(reason) => {
            tracing::warn!(%reason, "closing compute socket on malformed frame");
            Some((close_code::INVALID, truncate(reason)))
        }
        LoopExit::Idle => Some((close_code::POLICY, "idle timeout".to_string())),
        LoopExit::Shutdown => Some((close_code::AWAY, SHUTDOWN_REASON.to_string())),
        LoopExit::ClientClosed | LoopExit::Disconnected | LoopExit::SendFailed => None,
    };
    if let Some((code, reason)) = close {
        send_close(&mut socket, code, reason).await;
    }

    tracing::debug!(?exit, "compute socket closed");
}

/// Best effort: the peer may already be gone.
pub(crate) async fn send_close(socket: &mut WebSocket, code: u16, reason: String) {
    let frame = CloseFrame { code, reason: reason.into() };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn recv_within(
    socket: &mut WebSocket,
    idle: Option<Duration>,
) -> Result<Option<Result<Message, axum::Error>>, Elapsed> {
    match idle {
        Some(limit) => tokio::time::timeout(limit, socket.recv()).await,
        None => Ok(socket.recv().await),
    }
}

fn truncate(reason: &str) -> String {
    if reason.len() <= MAX_CLOSE_REASON {
        return reason.to_string();
    }
    let mut end = MAX_CLOSE_REASON;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    reason[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(100);
        let cut = truncate(&long);
        assert!(cut.len() <= MAX_CLOSE_REASON);
        assert!(cut.chars().all(|c| c == 'é'));
        assert_eq!(truncate("short"), "short");
    }
}
