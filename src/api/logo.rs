//! Logo API endpoint.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::assets;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoRequest {
    pub data_url: String,
}

/// PUT /api/logo - Cache the logo printed on new documents.
pub async fn put_logo(
    State(state): State<AppState>,
    Json(request): Json<LogoRequest>,
) -> ApiResult<()> {
    assets::cache_logo(state.store.as_ref(), &request.data_url).await?;
    tracing::info!("Logo updated");
    success(())
}
