//! Form API endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::form::FormState;
use crate::models::{HistoryEntry, OrderFields};
use crate::render::RenderWarning;
use crate::submission::TransmissionOutcome;
use crate::AppState;

/// Result of `POST /api/form/submit`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub order_number: String,
    pub file_name: String,
    /// Where the rendered document can be downloaded
    pub document_url: String,
    pub transmission: TransmissionOutcome,
    pub warnings: Vec<RenderWarning>,
    pub history_entry: HistoryEntry,
}

pub fn document_url(order_number: &str) -> String {
    format!("/api/orders/{}/pdf", order_number)
}

async fn open_form(state: &AppState) -> Result<FormState, AppError> {
    FormState::open(state.store.as_ref(), state.orchestrator.settings()).await
}

/// GET /api/form - Current form, opening one on first use.
pub async fn get_form(State(state): State<AppState>) -> ApiResult<FormState> {
    let mut current = state.form.lock().await;
    if current.is_none() {
        *current = Some(open_form(&state).await?);
    }

    match current.as_ref() {
        Some(form) => success(form.clone()),
        None => Err(AppError::Internal("Form could not be opened".to_string())),
    }
}

/// PUT /api/form - Replace the editable fields of the current draft.
pub async fn update_form(
    State(state): State<AppState>,
    Json(fields): Json<OrderFields>,
) -> ApiResult<FormState> {
    let mut current = state.form.lock().await;
    if current.is_none() {
        *current = Some(open_form(&state).await?);
    }

    match current.as_mut() {
        Some(form) => {
            form.update(fields)?;
            success(form.clone())
        }
        None => Err(AppError::Internal("Form could not be opened".to_string())),
    }
}

/// POST /api/form/new - Discard the current form and open a new one.
pub async fn new_form(State(state): State<AppState>) -> ApiResult<FormState> {
    let form = open_form(&state).await?;
    let mut current = state.form.lock().await;
    if let Some(previous) = current.as_ref() {
        tracing::debug!("Discarding form {}", previous.draft.order_number);
    }
    *current = Some(form.clone());
    success(form)
}

/// POST /api/form/submit - Submit the current draft.
pub async fn submit_form(State(state): State<AppState>) -> ApiResult<SubmitResponse> {
    let draft = {
        let mut current = state.form.lock().await;
        current
            .as_mut()
            .ok_or_else(|| AppError::Conflict("No order is open".to_string()))?
            .begin_submit()?
    };

    // The lock is released while submitting; a concurrent submit sees `Submitting`.
    let result = state.orchestrator.submit(&draft).await;

    {
        let mut current = state.form.lock().await;
        if let Some(form) = current.as_mut() {
            if form.draft.order_number == draft.order_number {
                form.finish_submit(result.is_ok());
            }
        }
    }

    let result = result?;
    success(SubmitResponse {
        document_url: document_url(&result.order_number),
        order_number: result.order_number,
        file_name: result.file_name,
        transmission: result.transmission,
        warnings: result.warnings,
        history_entry: result.history_entry,
    })
}
