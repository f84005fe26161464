//! Remote intake endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::errors::AppError;
use crate::models::{IntakePayload, IntakeResponse};
use crate::AppState;

/// POST /api/orden - Record an order in the ledger and mail the client.
pub async fn receive_order(
    State(state): State<AppState>,
    payload: Result<Json<IntakePayload>, JsonRejection>,
) -> Result<Json<IntakeResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(Json(state.intake.process(&payload).await?))
}

/// Any other method on /api/orden.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
