//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wavecalc_config::Config;

/// Shared state injected into every Axum handler. Holds nothing mutable:
/// compute requests are stateless and each reactive session owns its own
/// component.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    /// Cancelled on shutdown; every WebSocket loop watches it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config, shutdown: CancellationToken::new() }
    }

    pub fn ws_idle_timeout(&self) -> Option<Duration> {
        match self.config.server.ws_idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

pub type SharedState = Arc<AppState>;
