//! `data:` URI helpers for images and documents carried inside JSON.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::errors::AppError;

/// Media type of rendered documents.
pub const PDF_MIME: &str = "application/pdf";

/// Encode `bytes` as `data:{mime};base64,...`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, B64.encode(bytes))
}

/// Decode a base64 `data:` URI into its media type and bytes.
///
/// Parameters between the media type and `;base64` (such as `filename=`) are
/// ignored.
pub fn decode(url: &str) -> Result<(String, Vec<u8>), AppError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| AppError::BadRequest("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::BadRequest("data URI has no payload".to_string()))?;

    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default().to_string();
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(AppError::BadRequest(
            "only base64 data URIs are supported".to_string(),
        ));
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = B64
        .decode(cleaned.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("invalid base64 payload: {}", e)))?;

    Ok((mime, bytes))
}
