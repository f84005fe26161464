//! History API endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::{success, ApiResult};
use crate::assets;
use crate::errors::AppError;
use crate::history;
use crate::models::HistoryEntry;
use crate::AppState;

/// GET /api/history - Submitted orders, newest first.
pub async fn list_history(State(state): State<AppState>) -> ApiResult<Vec<HistoryEntry>> {
    success(history::list(state.store.as_ref()).await?)
}

/// GET /api/orders/{orderNumber}/pdf - Download the document kept for an order.
pub async fn download_document(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("No document for order {}", order_number));

    let entries = history::list(state.store.as_ref()).await?;
    let key = entries
        .into_iter()
        .find(|entry| entry.order_number == order_number)
        .and_then(|entry| entry.document_ref)
        .ok_or_else(not_found)?;

    let bytes = assets::load_document(state.store.as_ref(), &key)
        .await?
        .ok_or_else(not_found)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", order_number),
            ),
        ],
        bytes,
    )
        .into_response())
}
