//! Submission orchestrator: validate, render, record, transmit.
//!
//! Validation failures stop everything before any side effect. Once the
//! document is rendered, the order is kept locally and only then transmitted:
//! a failed or timed-out transmission is logged and reported but never undoes
//! the history entry. A rendering failure or a failed history write is fatal,
//! so nothing is sent.

mod transport;

pub use transport::*;

use std::sync::Arc;
use std::time::Duration;

use crate::assets;
use crate::db::LocalStore;
use crate::errors::AppError;
use crate::form::FormSettings;
use crate::history;
use crate::models::{HistoryEntry, IntakePayload, OrderDraft};
use crate::render::{DocumentRenderer, RenderWarning};

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub order_number: String,
    pub file_name: String,
    pub pdf: Vec<u8>,
    pub transmission: TransmissionOutcome,
    pub warnings: Vec<RenderWarning>,
    pub history_entry: HistoryEntry,
}

pub struct Orchestrator {
    store: Arc<dyn LocalStore>,
    renderer: Arc<dyn DocumentRenderer>,
    transport: Option<Arc<dyn IntakeTransport>>,
    settings: FormSettings,
    default_logo: Option<String>,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn LocalStore>,
        renderer: Arc<dyn DocumentRenderer>,
        transport: Option<Arc<dyn IntakeTransport>>,
        settings: FormSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            renderer,
            transport,
            settings,
            default_logo: None,
            timeout,
        }
    }

    /// Logo printed when none has been uploaded.
    pub fn with_default_logo(mut self, logo: Option<String>) -> Self {
        self.default_logo = logo;
        self
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Run one submission of `draft`.
    pub async fn submit(&self, draft: &OrderDraft) -> Result<SubmissionResult, AppError> {
        self.settings.validate(&draft.fields)?;

        let logo = self.logo().await;
        let document = self.renderer.render(draft, logo.as_deref())?;

        // The order is on record before it leaves the desk.
        let document_ref =
            match assets::store_document(self.store.as_ref(), &draft.order_number, &document.data_url)
                .await
            {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!("Could not keep document of {}: {}", draft.order_number, e);
                    None
                }
            };

        let entry = HistoryEntry::from_draft(draft, document_ref);
        history::record(self.store.as_ref(), &entry).await?;

        let payload = IntakePayload::from_draft(draft, &document.file_name, &document.data_url);
        let transmission = self.transmit(&payload).await;

        tracing::info!(
            "Submitted {} ({:?}, {} warnings)",
            draft.order_number,
            transmission,
            document.warnings.len()
        );

        Ok(SubmissionResult {
            order_number: draft.order_number.clone(),
            file_name: document.file_name,
            pdf: document.bytes,
            transmission,
            warnings: document.warnings,
            history_entry: entry,
        })
    }

    /// Uploaded logo, else the configured one. Store errors only cost the logo.
    async fn logo(&self) -> Option<String> {
        match assets::cached_logo(self.store.as_ref()).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => self.default_logo.clone(),
            Err(e) => {
                tracing::warn!("Could not read cached logo: {}", e);
                self.default_logo.clone()
            }
        }
    }

    /// One attempt, bounded by the configured timeout. Never fails the submission.
    async fn transmit(&self, payload: &IntakePayload) -> TransmissionOutcome {
        let Some(transport) = &self.transport else {
            return TransmissionOutcome::Disabled;
        };

        match tokio::time::timeout(self.timeout, transport.send(payload)).await {
            Ok(Ok(http_status)) => TransmissionOutcome::Delivered { http_status },
            Ok(Err(e)) => {
                tracing::warn!("Transmission of {} failed: {}", payload.order_number, e);
                TransmissionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                tracing::warn!(
                    "Transmission of {} timed out after {:?}",
                    payload.order_number,
                    self.timeout
                );
                TransmissionOutcome::Failed {
                    reason: format!("timed out after {}s", self.timeout.as_secs()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusinessProfile;
    use crate::db::MemoryStore;
    use crate::form::RequiredFields;
    use crate::render::layout::tests::minimal_draft;
    use crate::render::{PdfRenderer, RenderedDocument};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingRenderer {
        calls: AtomicUsize,
        fail: bool,
        inner: PdfRenderer,
    }

    impl CountingRenderer {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
                inner: PdfRenderer::new(BusinessProfile::default()),
            }
        }
    }

    impl DocumentRenderer for CountingRenderer {
        fn render(
            &self,
            draft: &OrderDraft,
            logo: Option<&str>,
        ) -> Result<RenderedDocument, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Render("no fonts".to_string()));
            }
            self.inner.render(draft, logo)
        }
    }

    enum Behavior {
        Accept,
        Reject,
        Hang,
    }

    struct RecordingTransport {
        behavior: Behavior,
        sent: Mutex<Vec<IntakePayload>>,
    }

    impl RecordingTransport {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<IntakePayload> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IntakeTransport for RecordingTransport {
        async fn send(&self, payload: &IntakePayload) -> Result<u16, AppError> {
            self.sent.lock().unwrap().push(payload.clone());
            match self.behavior {
                Behavior::Accept => Ok(200),
                Behavior::Reject => Err(AppError::Transport(
                    "intake endpoint answered 500: boom".to_string(),
                )),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(200)
                }
            }
        }
    }

    /// Store that accepts everything except list appends.
    struct FailingAppendStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl LocalStore for FailingAppendStore {
        async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            self.inner.set(key, value).await
        }

        async fn append(&self, _key: &str, _item: serde_json::Value) -> Result<(), AppError> {
            Err(AppError::Database("disk I/O error".to_string()))
        }
    }

    fn settings() -> FormSettings {
        FormSettings {
            required: RequiredFields::default(),
            locations: vec!["Núñez".to_string(), "Vicente López".to_string()],
            utc_offset_minutes: -180,
        }
    }

    fn complete_draft() -> OrderDraft {
        let mut draft = minimal_draft();
        draft.fields.branch = "Núñez".to_string();
        draft
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        renderer: Arc<CountingRenderer>,
        transport: Arc<RecordingTransport>,
        orchestrator: Orchestrator,
    }

    fn fixture(render_fails: bool, behavior: Behavior) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let renderer = Arc::new(CountingRenderer::new(render_fails));
        let transport = Arc::new(RecordingTransport::new(behavior));
        let orchestrator = Orchestrator::new(
            store.clone(),
            renderer.clone(),
            Some(transport.clone()),
            settings(),
            Duration::from_millis(200),
        );
        Fixture {
            store,
            renderer,
            transport,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_missing_email_has_no_side_effects() {
        let f = fixture(false, Behavior::Accept);
        let mut draft = complete_draft();
        draft.fields.client.email.clear();

        let err = f.orchestrator.submit(&draft).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("Email"));
        assert_eq!(f.renderer.calls.load(Ordering::SeqCst), 0);
        assert!(f.transport.sent().is_empty());
        assert!(history::list(f.store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let f = fixture(false, Behavior::Accept);
        let draft = complete_draft();

        let result = f.orchestrator.submit(&draft).await.unwrap();

        assert_eq!(result.order_number, "ORD-0100");
        assert_eq!(result.file_name, "ORD-0100.pdf");
        assert_eq!(
            result.transmission,
            TransmissionOutcome::Delivered { http_status: 200 }
        );

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].order_number, "ORD-0100");
        assert!(!sent[0].test);
        assert_eq!(sent[0].file_name.as_deref(), Some("ORD-0100.pdf"));
        let (_, transmitted) =
            crate::data_url::decode(sent[0].pdf_data_url.as_deref().unwrap()).unwrap();
        assert_eq!(transmitted, result.pdf);

        let entries = history::list(f.store.as_ref()).await.unwrap();
        assert_eq!(entries, vec![result.history_entry.clone()]);
        assert_eq!(entries[0].client_name, "Juan Pérez");
        assert_eq!(entries[0].device_summary, "Celular Samsung A10");

        let key = entries[0].document_ref.as_deref().unwrap();
        let kept = assets::load_document(f.store.as_ref(), key).await.unwrap();
        assert_eq!(kept, Some(result.pdf));
    }

    #[tokio::test]
    async fn test_transmission_failure_still_records_history() {
        let f = fixture(false, Behavior::Reject);

        let result = f.orchestrator.submit(&complete_draft()).await.unwrap();

        assert!(matches!(
            result.transmission,
            TransmissionOutcome::Failed { ref reason } if reason.contains("500")
        ));
        assert_eq!(history::list(f.store.as_ref()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transmission_timeout_still_records_history() {
        let f = fixture(false, Behavior::Hang);

        let result = f.orchestrator.submit(&complete_draft()).await.unwrap();

        assert!(matches!(
            result.transmission,
            TransmissionOutcome::Failed { .. }
        ));
        assert_eq!(history::list(f.store.as_ref()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_stops_submission() {
        let f = fixture(true, Behavior::Accept);

        let err = f.orchestrator.submit(&complete_draft()).await.unwrap_err();

        assert!(matches!(err, AppError::Render(_)));
        assert_eq!(f.renderer.calls.load(Ordering::SeqCst), 1);
        assert!(f.transport.sent().is_empty());
        assert!(history::list(f.store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_sends_nothing() {
        let transport = Arc::new(RecordingTransport::new(Behavior::Accept));
        let orchestrator = Orchestrator::new(
            Arc::new(FailingAppendStore {
                inner: MemoryStore::new(),
            }),
            Arc::new(PdfRenderer::new(BusinessProfile::default())),
            Some(transport.clone()),
            settings(),
            Duration::from_secs(1),
        );

        for _ in 0..2 {
            let err = orchestrator.submit(&complete_draft()).await.unwrap_err();
            assert!(matches!(err, AppError::Database(_)));
        }
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_transport() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Orchestrator::new(
            store.clone(),
            Arc::new(PdfRenderer::new(BusinessProfile::default())),
            None,
            settings(),
            Duration::from_secs(1),
        );

        let result = orchestrator.submit(&complete_draft()).await.unwrap();

        assert_eq!(result.transmission, TransmissionOutcome::Disabled);
        assert_eq!(history::list(store.as_ref()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_uploaded_logo_wins_over_default() {
        use crate::render::images::tests::png_data_url;

        let f = fixture(false, Behavior::Accept);
        let orchestrator = f
            .orchestrator
            .with_default_logo(Some("data:image/png;base64,bm9wZQ==".to_string()));

        // The broken default logo is reported as skipped.
        let first = orchestrator.submit(&complete_draft()).await.unwrap();
        assert!(matches!(first.warnings[..], [RenderWarning::LogoSkipped(_)]));

        assets::cache_logo(f.store.as_ref(), &png_data_url(4, 2, [0, 0, 0, 255]))
            .await
            .unwrap();
        let second = orchestrator.submit(&complete_draft()).await.unwrap();
        assert!(second.warnings.is_empty());
    }
}
