//! Cached logo and rendered documents kept in the local store.

use std::path::Path;

use crate::data_url;
use crate::db::LocalStore;
use crate::errors::AppError;

/// Store key of the uploaded logo (a data URI).
pub const LOGO_KEY: &str = "lfp_logo";

const DOCUMENT_KEY_PREFIX: &str = "lfp_doc:";

pub fn document_key(order_number: &str) -> String {
    format!("{}{}", DOCUMENT_KEY_PREFIX, order_number)
}

/// Replace the cached logo. Only `image/*` data URIs are accepted.
pub async fn cache_logo(store: &dyn LocalStore, url: &str) -> Result<(), AppError> {
    let (mime, bytes) = data_url::decode(url)?;
    if !mime.starts_with("image/") || bytes.is_empty() {
        return Err(AppError::Validation(format!(
            "Logo must be an image, got {:?}",
            mime
        )));
    }
    store.set(LOGO_KEY, url.trim()).await
}

pub async fn cached_logo(store: &dyn LocalStore) -> Result<Option<String>, AppError> {
    store.get(LOGO_KEY).await
}

/// Read a logo file into a data URI; the media type follows the extension.
pub async fn load_logo_file(path: &Path) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::Configuration(format!("Cannot read logo {}: {}", path.display(), e))
    })?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    };
    Ok(data_url::encode(mime, &bytes))
}

/// Keep the rendered document of an order.
pub async fn store_document(
    store: &dyn LocalStore,
    order_number: &str,
    pdf_data_url: &str,
) -> Result<String, AppError> {
    let key = document_key(order_number);
    store.set(&key, pdf_data_url).await?;
    Ok(key)
}

/// Raw PDF bytes stored under `key`, if any.
pub async fn load_document(store: &dyn LocalStore, key: &str) -> Result<Option<Vec<u8>>, AppError> {
    match store.get(key).await? {
        Some(url) => {
            let (_, bytes) = data_url::decode(&url)
                .map_err(|e| AppError::Database(format!("Stored document {} is corrupt: {}", key, e)))?;
            Ok(Some(bytes))
        }
        None => Ok(None),
    }
}
