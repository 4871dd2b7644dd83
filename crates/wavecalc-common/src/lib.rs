//! wavecalc-common: Shared types, errors, and the stateless compute core.

pub mod error;
pub mod compute;

// Re-export commonly used types
pub use compute::{multiply, ComputeRequest, ComputeResponse};
pub use error::{Result, WavecalcError};
