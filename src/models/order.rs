//! Order draft model: the values captured by the intake form.

use serde::{Deserialize, Serialize};

/// Kind of device brought in for repair.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeviceType {
    #[default]
    Celular,
    Tablet,
    Notebook,
    PC,
    Otro,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Celular => "Celular",
            DeviceType::Tablet => "Tablet",
            DeviceType::Notebook => "Notebook",
            DeviceType::PC => "PC",
            DeviceType::Otro => "Otro",
        }
    }
}

/// Client contact data.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ClientInfo {
    #[serde(default)]
    pub name: String,
    /// National identity document number
    #[serde(default, rename = "dni")]
    pub national_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Device data; everything except the type is free text.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    #[serde(default, rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    /// Serial number or IMEI
    #[serde(default, rename = "sn")]
    pub serial: String,
    /// Unlock code or PIN left by the client
    #[serde(default, rename = "pass")]
    pub passcode: String,
}

impl DeviceInfo {
    /// "type brand model" with blank parts omitted.
    pub fn summary(&self) -> String {
        [self.device_type.as_str(), &self.brand, &self.model]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Editable part of a draft, replaced wholesale by the form.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderFields {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub device: DeviceInfo,
    #[serde(default, rename = "fail")]
    pub failure_description: String,
    #[serde(default, rename = "stateIn")]
    pub intake_condition: String,
    /// Free-text amount, never parsed
    #[serde(default, rename = "budget")]
    pub estimated_budget: String,
    #[serde(default, rename = "tech")]
    pub technician: String,
    /// Device photo as a data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// An order being filled in: number and timestamp are fixed when the form opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub order_number: String,
    /// Display date, dd/mm/yyyy
    #[serde(rename = "fecha")]
    pub date: String,
    /// Display time, HH:MM
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(flatten)]
    pub fields: OrderFields,
}

impl OrderDraft {
    pub fn new(order_number: String, date: String, time: String) -> Self {
        Self {
            order_number,
            date,
            time,
            fields: OrderFields::default(),
        }
    }

    /// Suggested download name for the rendered document.
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.order_number)
    }
}
