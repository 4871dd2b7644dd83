//! Autoloaded reactive sessions.
//!
//! Each app is mounted under its own path with three routes:
//!   - `GET  /{app}`             initial HTML fragment of a fresh component
//!   - `GET  /{app}/autoload.js` script that mounts the session into a page
//!   - `WS   /{app}/ws`          one component per connection
//!
//! The client sends `{"param": name, "value": number}`; the server replies
//! with a [`SessionFrame`] after opening and after every update. A bad update
//! is reported in the frame and the session stays open.

use axum::extract::ws::{close_code, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Extension;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wavecalc_config::Config;
use wavecalc_reactive::{Component, ErrorRecord, MultiplyPipeline, ParamError, ParamSnapshot, SineWave};

use crate::error::ApiError;
use crate::handlers::ws::{send_close, SHUTDOWN_REASON};
use crate::state::SharedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Pipeline,
    SineWave,
}

impl AppKind {
    pub fn build(self, config: &Config) -> Result<Box<dyn Component>, ParamError> {
        let component: Box<dyn Component> = match self {
            AppKind::Pipeline => Box::new(MultiplyPipeline::new(&config.panel)?),
            AppKind::SineWave => Box::new(SineWave::new(&config.wave)?),
        };
        Ok(component)
    }
}

/// Route-scoped description of the mounted app.
#[derive(Debug, Clone)]
pub struct SessionApp {
    pub kind: AppKind,
    /// Mount path, e.g. `/panel-test`.
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ParamUpdate {
    pub param: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct SessionFrame {
    pub html: String,
    pub params: ParamSnapshot,
    /// Why the last update was refused, if it was.
    pub error: Option<String>,
    /// Failure of the last recomputation, if any.
    pub compute_error: Option<ErrorRecord>,
}

impl SessionFrame {
    pub fn of(component: &dyn Component, error: Option<String>) -> Self {
        Self {
            html: component.render_html(),
            params: component.params().snapshot(),
            error,
            compute_error: component.errors().current(),
        }
    }
}

/// Apply one raw client frame. Returns the refusal reason, if any.
pub fn apply_update(component: &mut dyn Component, raw: &str) -> Option<String> {
    let update: ParamUpdate = match serde_json::from_str(raw) {
        Ok(update) => update,
        Err(err) => return Some(format!("invalid update: {err}")),
    };
    match component.set_param(&update.param, update.value) {
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    }
}

pub async fn fragment(
    State(state): State<SharedState>,
    Extension(app): Extension<SessionApp>,
) -> Result<Html<String>, ApiError> {
    let component = app.kind.build(&state.config)?;
    Ok(Html(component.render_html()))
}

pub async fn autoload(Extension(app): Extension<SessionApp>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        AUTOLOAD_JS.replace("__WS_PATH__", &format!("{}/ws", app.path)),
    )
}

pub async fn session_ws(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Extension(app): Extension<SessionApp>,
) -> Result<impl IntoResponse, ApiError> {
    let component = app.kind.build(&state.config)?;
    let shutdown = state.shutdown.clone();
    Ok(ws.on_upgrade(move |socket| run_session(socket, component, shutdown)))
}

async fn run_session(mut socket: WebSocket, mut component: Box<dyn Component>, shutdown: CancellationToken) {
    let id = Uuid::new_v4();
    tracing::debug!(%id, app = component.name(), "session opened");

    let opening = SessionFrame::of(component.as_ref(), None);
    if send_frame(&mut socket, &opening).await.is_err() {
        return;
    }

    let shutting_down = loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break true,
            received = socket.recv() => received,
        };
        let text = match received {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break false,
            Some(Ok(_)) => continue,
        };

        let error = apply_update(component.as_mut(), text.as_str());
        if let Some(reason) = &error {
            tracing::warn!(%id, %reason, "session update refused");
        }
        let frame = SessionFrame::of(component.as_ref(), error);
        if send_frame(&mut socket, &frame).await.is_err() {
            break false;
        }
    };

    if shutting_down {
        send_close(&mut socket, close_code::AWAY, SHUTDOWN_REASON.to_string()).await;
    }
    tracing::debug!(%id, shutting_down, "session closed");
}

async fn send_frame(socket: &mut WebSocket, frame: &SessionFrame) -> Result<(), ()> {
    let payload = serde_json::to_string(frame).map_err(|_| ())?;
    socket.send(Message::Text(payload.into())).await.map_err(|_| ())
}

const AUTOLOAD_JS: &str = r#"(function () {
  var script = document.currentScript;
  var target = document.createElement("div");
  target.className = "wavecalc-session";
  script.parentNode.insertBefore(target, script.nextSibling);

  var origin = new URL(script.src, window.location.href);
  var scheme = origin.protocol === "https:" ? "wss://" : "ws://";
  var socket = new WebSocket(scheme + origin.host + "__WS_PATH__");

  socket.onmessage = function (event) {
    var frame = JSON.parse(event.data);
    target.innerHTML = frame.html;
    if (frame.error) { console.warn("wavecalc:", frame.error); }
  };

  target.addEventListener("change", function (event) {
    var param = event.target.getAttribute("data-param");
    if (!param) { return; }
    var value = parseFloat(event.target.value);
    if (isNaN(value)) { return; }
    socket.send(JSON.stringify({ param: param, value: value }));
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Box<dyn Component> {
        AppKind::Pipeline.build(&Config::default()).unwrap()
    }

    #[test]
    fn test_update_recomputes() {
        let mut component = pipeline();
        assert_eq!(apply_update(component.as_mut(), r#"{"param": "value", "value": 3}"#), None);
        assert_eq!(apply_update(component.as_mut(), r#"{"param": "multiplier", "value": 4}"#), None);
        let frame = SessionFrame::of(component.as_ref(), None);
        assert_eq!(frame.params.get("value"), Some(3.0));
        assert!(frame.html.contains(r#"<div class="widget static-text">12</div>"#));
        assert!(frame.compute_error.is_none());
    }

    #[test]
    fn test_bad_updates_are_reported() {
        let mut component = pipeline();
        let err = apply_update(component.as_mut(), "{").unwrap();
        assert!(err.starts_with("invalid update"));
        let err = apply_update(component.as_mut(), r#"{"param": "phase", "value": 1}"#).unwrap();
        assert!(err.contains("Unknown parameter"));
    }

    #[test]
    fn test_sine_wave_session_clamps() {
        let mut component = AppKind::SineWave.build(&Config::default()).unwrap();
        assert_eq!(apply_update(component.as_mut(), r#"{"param": "amplitude", "value": 10}"#), None);
        assert_eq!(component.params().get("amplitude").unwrap(), 2.0);
    }

    #[test]
    fn test_frame_serializes_params_as_map() {
        let component = pipeline();
        let json = serde_json::to_value(SessionFrame::of(component.as_ref(), None)).unwrap();
        assert_eq!(json["params"]["multiplier"], 1.0);
        assert!(json["error"].is_null());
    }
}
