//! Delivery of finished orders to the intake endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::IntakePayload;

/// What happened to the one transmission attempt of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TransmissionOutcome {
    /// The endpoint answered with a success status
    #[serde(rename_all = "camelCase")]
    Delivered { http_status: u16 },
    /// Timeout, network error or error status; the order was kept locally anyway
    Failed { reason: String },
    /// No intake URL configured
    Disabled,
}

/// Sends an [`IntakePayload`] to the intake endpoint.
#[async_trait]
pub trait IntakeTransport: Send + Sync {
    /// Returns the HTTP status of a successful delivery.
    async fn send(&self, payload: &IntakePayload) -> Result<u16, AppError>;
}

/// JSON-over-HTTP transport.
pub struct HttpIntakeTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpIntakeTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl IntakeTransport for HttpIntakeTransport {
    async fn send(&self, payload: &IntakePayload) -> Result<u16, AppError> {
        let resp = self.http.post(&self.url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "intake endpoint answered {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_wire_shape() {
        assert_eq!(
            serde_json::to_value(TransmissionOutcome::Delivered { http_status: 200 }).unwrap(),
            json!({ "outcome": "delivered", "httpStatus": 200 })
        );
        assert_eq!(
            serde_json::to_value(TransmissionOutcome::Failed {
                reason: "timeout".into()
            })
            .unwrap(),
            json!({ "outcome": "failed", "reason": "timeout" })
        );
        assert_eq!(
            serde_json::to_value(TransmissionOutcome::Disabled).unwrap(),
            json!({ "outcome": "disabled" })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Port 9 (discard) is never served in the test environment.
        let transport =
            HttpIntakeTransport::new("http://127.0.0.1:9/api/orden", Duration::from_secs(2))
                .unwrap();
        let payload: IntakePayload =
            serde_json::from_value(json!({ "orderNumber": "ORD-0100" })).unwrap();

        assert!(matches!(
            transport.send(&payload).await,
            Err(AppError::Transport(_))
        ));
    }
}
