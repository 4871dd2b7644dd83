//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::compute::{compute, health};
use crate::handlers::pages::{panel_view, test_view};
use crate::handlers::session::{autoload, fragment, session_ws, AppKind, SessionApp};
use crate::handlers::ws::compute_ws;
use crate::state::{AppState, SharedState};

/// Mount path of the sine wave session.
pub const WAVE_APP_PATH: &str = "/wave-test";

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);
    let panel_path = format!("/{}", shared.config.panel.app_name);

    // Compute service: the only routes exposed cross-origin.
    let compute_api = Router::new()
        .route("/compute", post(compute))
        .route("/ws",      get(compute_ws))
        .route("/health",  get(health))
        .layer(cors_layer(&shared.config.server.cors_origins));

    Router::new()
        .merge(compute_api)

        // Pages
        .route("/test/",  get(test_view))
        .route("/panel/", get(panel_view))

        // Autoloaded sessions
        .nest(&panel_path,  session_routes(AppKind::Pipeline, &panel_path))
        .nest(WAVE_APP_PATH, session_routes(AppKind::SineWave, WAVE_APP_PATH))

        // Middleware
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn session_routes(kind: AppKind, path: &str) -> Router<SharedState> {
    Router::new()
        .route("/",            get(fragment))
        .route("/autoload.js", get(autoload))
        .route("/ws",          get(session_ws))
        .layer(Extension(SessionApp { kind, path: path.to_string() }))
}

/// Listed origins only, with credentials. Methods and headers mirror the
/// preflight request since wildcards cannot be combined with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
