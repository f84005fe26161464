//! Intake endpoint contract: request payload, spreadsheet row and response envelope.

use serde::{Deserialize, Serialize};

use super::{ClientInfo, DeviceInfo, OrderDraft};
use crate::errors::AppError;

/// Body accepted by `POST /api/orden`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntakePayload {
    pub order_number: String,
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub hora: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub device: DeviceInfo,
    #[serde(default)]
    pub fail: String,
    #[serde(default)]
    pub state_in: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub tech: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Test submissions are recorded but never mailed
    #[serde(default)]
    pub test: bool,
}

impl IntakePayload {
    /// Build the transmission body for a rendered draft.
    pub fn from_draft(draft: &OrderDraft, file_name: &str, pdf_data_url: &str) -> Self {
        let fields = &draft.fields;
        Self {
            order_number: draft.order_number.clone(),
            fecha: draft.date.clone(),
            hora: draft.time.clone(),
            branch: fields.branch.clone(),
            client: fields.client.clone(),
            device: fields.device.clone(),
            fail: fields.failure_description.clone(),
            state_in: fields.intake_condition.clone(),
            budget: fields.estimated_budget.clone(),
            tech: fields.technician.clone(),
            pdf_data_url: Some(pdf_data_url.to_string()),
            file_name: Some(file_name.to_string()),
            test: false,
        }
    }

    /// Boundary checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.order_number.trim().is_empty() {
            return Err(AppError::BadRequest("orderNumber is required".to_string()));
        }
        Ok(())
    }

    /// Ledger row in its fixed column order (A..L).
    pub fn ledger_row(&self, timestamp: &str) -> Vec<String> {
        vec![
            timestamp.to_string(),
            self.order_number.clone(),
            self.fecha.clone(),
            self.hora.clone(),
            self.client.name.clone(),
            self.client.email.clone(),
            self.device.summary(),
            self.branch.clone(),
            self.tech.clone(),
            self.state_in.clone(),
            self.fail.clone(),
            self.budget.clone(),
        ]
    }
}

/// Why a configured mailer did not send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TestSubmission,
    NoClientEmail,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::TestSubmission => "test submission",
            SkipReason::NoClientEmail => "no client email",
        }
    }
}

/// Result of the mail step of an intake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailOutcome {
    Sent,
    Skipped(SkipReason),
    NotConfigured,
    Failed(String),
}

impl MailOutcome {
    pub fn report(&self) -> MailReport {
        match self {
            MailOutcome::Sent => MailReport {
                sent: Some(true),
                ..Default::default()
            },
            MailOutcome::Skipped(reason) => MailReport {
                skipped: true,
                reason: Some(reason.as_str().to_string()),
                ..Default::default()
            },
            MailOutcome::NotConfigured => MailReport {
                sent: Some(false),
                reason: Some("SMTP not configured".to_string()),
                ..Default::default()
            },
            MailOutcome::Failed(error) => MailReport {
                sent: Some(false),
                error: Some(error.clone()),
                ..Default::default()
            },
        }
    }
}

/// Wire form of [`MailOutcome`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MailReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ledger value reported once the row append succeeded.
pub const ROW_APPENDED: &str = "ROW_APPENDED";

/// Success envelope of the intake endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeResponse {
    pub ok: bool,
    pub sheet: String,
    pub mail: MailReport,
}

impl IntakeResponse {
    pub fn appended(mail: &MailOutcome) -> Self {
        Self {
            ok: true,
            sheet: ROW_APPENDED.to_string(),
            mail: mail.report(),
        }
    }
}
