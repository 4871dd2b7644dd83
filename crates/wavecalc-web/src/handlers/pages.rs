//! Page routes: the API smoke test and the page embedding the server-rendered
//! pipeline.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;
use wavecalc_reactive::widgets::escape;

use crate::state::SharedState;

/// `GET /test/`
pub async fn test_view() -> Json<Value> {
    Json(json!({ "message": "API is working!" }))
}

/// `GET /panel/`: an HTML page whose script tag pulls in the autoloaded
/// pipeline session from this same server.
pub async fn panel_view(State(state): State<SharedState>, headers: HeaderMap) -> Html<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.server.bind.to_string());
    let src = format!("http://{}/{}/autoload.js", host, state.config.panel.app_name);
    Html(render_panel_page(&state.config.panel.title, &server_document(&src)))
}

/// Script tag that loads a session into an element created next to it.
pub fn server_document(autoload_url: &str) -> String {
    let element_id = Uuid::new_v4();
    format!(
        r#"<script id="{}" src="{}" data-autoload-element="{}"></script>"#,
        element_id,
        escape(autoload_url),
        element_id,
    )
}

fn render_panel_page(title: &str, script: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{}</title>
    <style>
        .template-body {{ display: flex; gap: 1.5rem; }}
        .sidebar .widget {{ display: block; margin-bottom: 0.75rem; }}
        .row {{ display: flex; gap: 1rem; }}
        .alert-danger {{ color: #842029; background: #f8d7da; padding: 0.5rem 1rem; }}
    </style>
</head>
<body>
{}
</body>
</html>"#, escape(title), script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_document_points_at_autoload() {
        let tag = server_document("http://localhost:8000/panel-test/autoload.js");
        assert!(tag.starts_with("<script id=\""));
        assert!(tag.contains(r#"src="http://localhost:8000/panel-test/autoload.js""#));
    }

    #[test]
    fn test_server_document_escapes_url() {
        let tag = server_document(r#"http://evil"><b>/x"#);
        assert!(!tag.contains("<b>"));
    }
}
