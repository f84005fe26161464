//! History entry model: what the desk keeps about each submitted order.

use serde::{Deserialize, Serialize};

use super::OrderDraft;

/// Reduced projection of a submitted order, listed newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub order_number: String,
    pub date: String,
    pub time: String,
    pub client_name: String,
    pub device_summary: String,
    pub branch: String,
    /// Store key of the rendered document, when it was kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
}

impl HistoryEntry {
    pub fn from_draft(draft: &OrderDraft, document_ref: Option<String>) -> Self {
        Self {
            order_number: draft.order_number.clone(),
            date: draft.date.clone(),
            time: draft.time.clone(),
            client_name: draft.fields.client.name.clone(),
            device_summary: draft.fields.device.summary(),
            branch: draft.fields.branch.clone(),
            document_ref,
        }
    }
}
