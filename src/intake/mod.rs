//! Remote intake: record an order in the spreadsheet ledger and mail the client.
//!
//! The ledger is mandatory; without it the request fails and nothing happens.
//! Mail is optional and its failures never undo an appended row.

mod mail;
mod sheets;

pub use mail::*;
pub use sheets::*;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::config::BusinessProfile;
use crate::errors::AppError;
use crate::models::{IntakePayload, IntakeResponse, MailOutcome, SkipReason};

pub struct IntakeService {
    ledger: Option<Arc<dyn SheetLedger>>,
    mailer: Option<Arc<dyn Mailer>>,
    business: BusinessProfile,
    copy_to: Option<String>,
}

impl IntakeService {
    pub fn new(
        ledger: Option<Arc<dyn SheetLedger>>,
        mailer: Option<Arc<dyn Mailer>>,
        business: BusinessProfile,
        copy_to: Option<String>,
    ) -> Self {
        Self {
            ledger,
            mailer,
            business,
            copy_to,
        }
    }

    /// Append the ledger row, then try to mail the receipt.
    pub async fn process(&self, payload: &IntakePayload) -> Result<IntakeResponse, AppError> {
        payload.validate()?;

        let ledger = self.ledger.as_ref().ok_or_else(|| {
            AppError::Configuration(
                "Missing Google service account or sheet settings".to_string(),
            )
        })?;

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        ledger.append_row(payload.ledger_row(&timestamp)).await?;

        let mail = self.deliver_receipt(payload).await;
        tracing::info!(
            order = %payload.order_number,
            test = payload.test,
            "Intake recorded, mail: {:?}",
            mail
        );

        Ok(IntakeResponse::appended(&mail))
    }

    async fn deliver_receipt(&self, payload: &IntakePayload) -> MailOutcome {
        let Some(mailer) = &self.mailer else {
            return MailOutcome::NotConfigured;
        };
        if payload.test {
            return MailOutcome::Skipped(SkipReason::TestSubmission);
        }
        if payload.client.email.trim().is_empty() {
            return MailOutcome::Skipped(SkipReason::NoClientEmail);
        }

        let receipt = ReceiptMail::for_order(payload, &self.business, self.copy_to.as_deref());
        match mailer.send(&receipt).await {
            Ok(()) => MailOutcome::Sent,
            Err(e) => {
                tracing::warn!("Receipt for {} not mailed: {}", payload.order_number, e);
                MailOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Ledger that keeps rows in memory.
    #[derive(Default)]
    pub(crate) struct RecordingLedger {
        pub rows: Mutex<Vec<Vec<String>>>,
        pub fail: bool,
    }

    #[async_trait]
    impl SheetLedger for RecordingLedger {
        async fn append_row(&self, row: Vec<String>) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Sheets("append failed (403): denied".to_string()));
            }
            self.rows.lock().unwrap().push(row);
            Ok(())
        }
    }

    /// Mailer that keeps receipts in memory.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<ReceiptMail>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &ReceiptMail) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Mail("SMTP error: connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn payload(test: bool) -> IntakePayload {
        serde_json::from_value(json!({
            "orderNumber": "ORD-0100",
            "fecha": "05/03/2025",
            "hora": "09:15",
            "branch": "Núñez",
            "client": { "name": "Juan Pérez", "dni": "30111222", "email": "juan@example.com" },
            "device": { "type": "Celular", "brand": "Samsung", "model": "A10" },
            "fail": "No enciende",
            "stateIn": "Pantalla rota",
            "budget": "5000",
            "pdfDataUrl": "data:application/pdf;base64,JVBERi0xLjU=",
            "fileName": "ORD-0100.pdf",
            "test": test
        }))
        .unwrap()
    }

    fn service(
        ledger: Option<Arc<RecordingLedger>>,
        mailer: Option<Arc<RecordingMailer>>,
    ) -> IntakeService {
        IntakeService::new(
            ledger.map(|l| l as Arc<dyn SheetLedger>),
            mailer.map(|m| m as Arc<dyn Mailer>),
            BusinessProfile::default(),
            Some("copia@example.com".to_string()),
        )
    }

    #[tokio::test]
    async fn test_row_appended_and_receipt_sent() {
        let ledger = Arc::new(RecordingLedger::default());
        let mailer = Arc::new(RecordingMailer::default());

        let response = service(Some(ledger.clone()), Some(mailer.clone()))
            .process(&payload(false))
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.sheet, "ROW_APPENDED");
        assert_eq!(response.mail.sent, Some(true));

        let rows = ledger.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&rows[0][0]).is_ok());
        assert_eq!(
            rows[0][1..],
            [
                "ORD-0100",
                "05/03/2025",
                "09:15",
                "Juan Pérez",
                "juan@example.com",
                "Celular Samsung A10",
                "Núñez",
                "",
                "Pantalla rota",
                "No enciende",
                "5000",
            ]
        );

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "juan@example.com");
        assert_eq!(sent[0].cc.as_deref(), Some("copia@example.com"));
        assert_eq!(
            sent[0].attachment,
            Some(("ORD-0100.pdf".to_string(), b"%PDF-1.5".to_vec()))
        );
    }

    #[tokio::test]
    async fn test_test_submission_is_not_mailed() {
        let ledger = Arc::new(RecordingLedger::default());
        let mailer = Arc::new(RecordingMailer::default());

        let response = service(Some(ledger.clone()), Some(mailer.clone()))
            .process(&payload(true))
            .await
            .unwrap();

        assert!(response.mail.skipped);
        assert_eq!(response.mail.reason.as_deref(), Some("test submission"));
        assert_eq!(ledger.rows.lock().unwrap().len(), 1);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_client_email_is_skipped() {
        let ledger = Arc::new(RecordingLedger::default());
        let mailer = Arc::new(RecordingMailer::default());
        let mut payload = payload(false);
        payload.client.email = " ".to_string();

        let response = service(Some(ledger.clone()), Some(mailer.clone()))
            .process(&payload)
            .await
            .unwrap();

        assert!(response.mail.skipped);
        assert_eq!(response.mail.reason.as_deref(), Some("no client email"));
        assert_eq!(ledger.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_mail_still_appends() {
        let ledger = Arc::new(RecordingLedger::default());

        for test in [false, true] {
            let response = service(Some(ledger.clone()), None)
                .process(&payload(test))
                .await
                .unwrap();
            assert_eq!(response.mail.sent, Some(false));
            assert_eq!(response.mail.reason.as_deref(), Some("SMTP not configured"));
        }
        assert_eq!(ledger.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_row() {
        let ledger = Arc::new(RecordingLedger::default());
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });

        let response = service(Some(ledger.clone()), Some(mailer))
            .process(&payload(false))
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.mail.sent, Some(false));
        assert!(response.mail.error.unwrap().contains("connection refused"));
        assert_eq!(ledger.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ledger_fails_without_mailing() {
        let mailer = Arc::new(RecordingMailer::default());

        let result = service(None, Some(mailer.clone()))
            .process(&payload(false))
            .await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_failure_fails_without_mailing() {
        let ledger = Arc::new(RecordingLedger {
            fail: true,
            ..Default::default()
        });
        let mailer = Arc::new(RecordingMailer::default());

        let result = service(Some(ledger), Some(mailer.clone()))
            .process(&payload(false))
            .await;

        assert!(matches!(result, Err(AppError::Sheets(_))));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
