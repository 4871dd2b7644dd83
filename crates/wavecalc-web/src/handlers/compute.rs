//! Stateless multiply endpoint.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{json, Value};
use wavecalc_common::{ComputeRequest, ComputeResponse};

use crate::error::ApiError;

/// `POST /compute`: `{"value", "multiplier"}` → `{"result"}`.
/// Any body that does not match the schema is a 422 before multiplying.
pub async fn compute(
    payload: Result<Json<ComputeRequest>, JsonRejection>,
) -> Result<Json<ComputeResponse>, ApiError> {
    let Json(request) = payload?;
    let response = request.compute()?;
    tracing::debug!(value = request.value, multiplier = request.multiplier, result = response.result, "computed");
    Ok(Json(response))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
