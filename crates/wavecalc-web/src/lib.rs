//! wavecalc-web: HTTP and WebSocket front end for wavecalc.
//! Serves:
//!   - the stateless compute API (`POST /compute`, `WS /ws`)
//!   - the page routes (`/test/`, `/panel/`)
//!   - autoloaded reactive sessions for the multiply pipeline and sine wave

pub mod error;
pub mod router;
pub mod handlers;
pub mod state;
