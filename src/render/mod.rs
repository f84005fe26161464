//! Work-order document renderer.
//!
//! Rendering is deterministic for identical drafts and image bytes. Images are
//! best-effort: one that cannot be decoded is left out and reported as a
//! [`RenderWarning`] instead of failing the document.

pub(crate) mod images;
pub mod layout;
mod metrics;
mod pdf;

pub use layout::Layout;

use serde::Serialize;

use crate::config::BusinessProfile;
use crate::data_url;
use crate::errors::AppError;
use crate::models::OrderDraft;

/// An image that was requested but left out of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "camelCase")]
pub enum RenderWarning {
    LogoSkipped(String),
    PhotoSkipped(String),
}

/// A rendered document, ready to download or transmit.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// `{orderNumber}.pdf`
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// The same bytes as a `data:application/pdf;base64,` URI
    pub data_url: String,
    pub layout: Layout,
    pub warnings: Vec<RenderWarning>,
}

/// Produces the work-order document for a draft.
pub trait DocumentRenderer: Send + Sync {
    /// `logo` is a data URI; the photo comes from the draft.
    fn render(&self, draft: &OrderDraft, logo: Option<&str>)
        -> Result<RenderedDocument, AppError>;
}

/// A4 PDF renderer using the shop's fixed template.
pub struct PdfRenderer {
    business: BusinessProfile,
}

impl PdfRenderer {
    pub fn new(business: BusinessProfile) -> Self {
        Self { business }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(
        &self,
        draft: &OrderDraft,
        logo: Option<&str>,
    ) -> Result<RenderedDocument, AppError> {
        let mut embedded = Vec::new();
        let mut warnings = Vec::new();

        let logo_index = logo.and_then(|url| match images::decode_data_url(url) {
            Ok(image) => {
                embedded.push(image);
                Some(embedded.len() - 1)
            }
            Err(reason) => {
                tracing::warn!("Rendering {} without logo: {}", draft.order_number, reason);
                warnings.push(RenderWarning::LogoSkipped(reason));
                None
            }
        });

        let photo_index = draft
            .fields
            .photo
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .and_then(|url| match images::decode_data_url(url) {
                Ok(image) => {
                    embedded.push(image);
                    Some(embedded.len() - 1)
                }
                Err(reason) => {
                    tracing::warn!("Rendering {} without photo: {}", draft.order_number, reason);
                    warnings.push(RenderWarning::PhotoSkipped(reason));
                    None
                }
            });

        let layout = layout::build(draft, &self.business, logo_index, photo_index);
        let bytes = pdf::write(&layout, &embedded)?;

        tracing::debug!(
            "Rendered {} ({} pages, {} images, {} bytes)",
            draft.order_number,
            layout.pages.len(),
            layout.image_count(),
            bytes.len()
        );

        Ok(RenderedDocument {
            file_name: draft.file_name(),
            data_url: data_url::encode(data_url::PDF_MIME, &bytes),
            bytes,
            layout,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::images::tests::png_data_url;
    use crate::render::layout::tests::{minimal_draft, value_after};
    use crate::render::layout::PLACEHOLDER;

    fn renderer() -> PdfRenderer {
        PdfRenderer::new(BusinessProfile::default())
    }

    #[test]
    fn test_render_without_images() {
        let doc = renderer().render(&minimal_draft(), None).unwrap();

        assert_eq!(doc.file_name, "ORD-0100.pdf");
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.layout.image_count(), 0);
        let (mime, bytes) = data_url::decode(&doc.data_url).unwrap();
        assert_eq!(mime, "application/pdf");
        assert_eq!(bytes, doc.bytes);
        assert_eq!(value_after(&doc.layout, "Teléfono:"), PLACEHOLDER);
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut draft = minimal_draft();
        draft.fields.photo = Some(png_data_url(4, 4, [200, 10, 10, 255]));
        let logo = png_data_url(8, 3, [0, 0, 0, 255]);

        let first = renderer().render(&draft, Some(&logo)).unwrap();
        let second = renderer().render(&draft, Some(&logo)).unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.layout.image_count(), 2);
    }

    #[test]
    fn test_bad_images_are_skipped_with_warnings() {
        let mut draft = minimal_draft();
        draft.fields.photo = Some("data:image/jpeg;base64,AAAA".to_string());

        let doc = renderer()
            .render(&draft, Some("data:image/png;base64,bm9wZQ=="))
            .unwrap();

        assert_eq!(doc.layout.image_count(), 0);
        assert_eq!(doc.warnings.len(), 2);
        assert!(matches!(doc.warnings[0], RenderWarning::LogoSkipped(_)));
        assert!(matches!(doc.warnings[1], RenderWarning::PhotoSkipped(_)));
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_warning_wire_shape() {
        let json = serde_json::to_value(RenderWarning::PhotoSkipped("bad".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "photoSkipped", "reason": "bad" }));
    }
}
