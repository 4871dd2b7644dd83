//! The multiplication shared by the HTTP endpoint, the WebSocket loop and
//! the server-rendered pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WavecalcError};

/// Request body for `POST /compute` and each `/ws` frame.
/// Both fields are required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub value: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeResponse {
    pub result: f64,
}

impl ComputeRequest {
    pub fn compute(&self) -> Result<ComputeResponse> {
        multiply(self.value, self.multiplier).map(|result| ComputeResponse { result })
    }

    /// Parse a raw JSON frame. Missing fields or wrong types are errors.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// `value * multiplier`, refusing non-finite inputs and overflowed products.
pub fn multiply(value: f64, multiplier: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(WavecalcError::NonFinite { field: "value", value });
    }
    if !multiplier.is_finite() {
        return Err(WavecalcError::NonFinite { field: "multiplier", value: multiplier });
    }
    let result = value * multiplier;
    if !result.is_finite() {
        return Err(WavecalcError::Overflow { value, multiplier });
    }
    Ok(result)
}
