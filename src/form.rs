//! The in-progress order held by the desk, and the rules for submitting it.
//!
//! A form is opened with a freshly reserved order number and stamped with the
//! shop-local date and time. It moves `Editing -> Submitting -> Done`; a failed
//! submission goes back to `Editing` keeping its number.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::db::LocalStore;
use crate::errors::AppError;
use crate::models::{OrderDraft, OrderFields};
use crate::sequence;

/// A draft field that can be made mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequiredField {
    Email,
    Dni,
    Name,
    Phone,
    Fail,
    StateIn,
    Branch,
    Tech,
    Budget,
}

impl RequiredField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "email" => Some(RequiredField::Email),
            "dni" => Some(RequiredField::Dni),
            "name" => Some(RequiredField::Name),
            "phone" => Some(RequiredField::Phone),
            "fail" => Some(RequiredField::Fail),
            "stateIn" => Some(RequiredField::StateIn),
            "branch" => Some(RequiredField::Branch),
            "tech" => Some(RequiredField::Tech),
            "budget" => Some(RequiredField::Budget),
            _ => None,
        }
    }

    /// Label shown to the person filling the form.
    pub fn label(&self) -> &'static str {
        match self {
            RequiredField::Email => "Email",
            RequiredField::Dni => "DNI",
            RequiredField::Name => "Nombre y Apellido",
            RequiredField::Phone => "Teléfono",
            RequiredField::Fail => "Falla",
            RequiredField::StateIn => "Estado al ingresar",
            RequiredField::Branch => "Sucursal",
            RequiredField::Tech => "Técnico",
            RequiredField::Budget => "Presupuesto",
        }
    }

    fn value<'a>(&self, fields: &'a OrderFields) -> &'a str {
        match self {
            RequiredField::Email => &fields.client.email,
            RequiredField::Dni => &fields.client.national_id,
            RequiredField::Name => &fields.client.name,
            RequiredField::Phone => &fields.client.phone,
            RequiredField::Fail => &fields.failure_description,
            RequiredField::StateIn => &fields.intake_condition,
            RequiredField::Branch => &fields.branch,
            RequiredField::Tech => &fields.technician,
            RequiredField::Budget => &fields.estimated_budget,
        }
    }
}

/// The set of mandatory fields, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields(Vec<RequiredField>);

impl Default for RequiredFields {
    fn default() -> Self {
        Self(vec![
            RequiredField::Email,
            RequiredField::Dni,
            RequiredField::Fail,
            RequiredField::StateIn,
            RequiredField::Branch,
        ])
    }
}

impl RequiredFields {
    pub fn new(mut fields: Vec<RequiredField>) -> Self {
        fields.sort();
        fields.dedup();
        Self(fields)
    }

    /// Parse a comma-separated list such as `email,dni,fail`.
    pub fn parse(list: &str) -> Result<Self, AppError> {
        let fields = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                RequiredField::from_name(name).ok_or_else(|| {
                    AppError::Configuration(format!("Unknown required field: {}", name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(fields))
    }

    pub fn contains(&self, field: RequiredField) -> bool {
        self.0.contains(&field)
    }

    /// Fields of `fields` that are required but blank.
    pub fn missing(&self, fields: &OrderFields) -> Vec<RequiredField> {
        self.0
            .iter()
            .copied()
            .filter(|field| field.value(fields).trim().is_empty())
            .collect()
    }
}

/// Everything the form needs from configuration.
#[derive(Debug, Clone)]
pub struct FormSettings {
    pub required: RequiredFields,
    pub locations: Vec<String>,
    pub utc_offset_minutes: i32,
}

impl FormSettings {
    /// Reject a draft before any side effect happens.
    pub fn validate(&self, fields: &OrderFields) -> Result<(), AppError> {
        let missing = self.required.missing(fields);
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(RequiredField::label).collect();
            return Err(AppError::Validation(format!(
                "Completá los campos obligatorios: {}",
                labels.join(", ")
            )));
        }

        let branch = fields.branch.trim();
        if !branch.is_empty() && !self.locations.iter().any(|loc| loc == branch) {
            return Err(AppError::Validation(format!(
                "Sucursal desconocida: {}",
                branch
            )));
        }

        Ok(())
    }

    fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Shop-local `(dd/mm/yyyy, HH:MM)` for `now`.
    pub fn stamp(&self, now: DateTime<Utc>) -> (String, String) {
        let local = now.with_timezone(&self.offset());
        (
            local.format("%d/%m/%Y").to_string(),
            local.format("%H:%M").to_string(),
        )
    }
}

/// Where the current form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Editing,
    Submitting,
    Done,
}

/// The current draft and its status.
#[derive(Debug, Clone, Serialize)]
pub struct FormState {
    pub draft: OrderDraft,
    pub status: FormStatus,
}

impl FormState {
    /// Open a new form, consuming one order number.
    pub async fn open(store: &dyn LocalStore, settings: &FormSettings) -> Result<Self, AppError> {
        let order_number = sequence::next_order_number(store).await?;
        let (date, time) = settings.stamp(Utc::now());

        let mut draft = OrderDraft::new(order_number, date, time);
        // Without a branch requirement the first location is preselected.
        if !settings.required.contains(RequiredField::Branch) {
            if let Some(first) = settings.locations.first() {
                draft.fields.branch = first.clone();
            }
        }

        tracing::debug!("Opened form {}", draft.order_number);
        Ok(Self {
            draft,
            status: FormStatus::Editing,
        })
    }

    /// Replace the editable fields.
    pub fn update(&mut self, fields: OrderFields) -> Result<(), AppError> {
        match self.status {
            FormStatus::Editing => {
                self.draft.fields = fields;
                Ok(())
            }
            FormStatus::Submitting => Err(AppError::Conflict(
                "Order is being submitted".to_string(),
            )),
            FormStatus::Done => Err(AppError::Conflict(format!(
                "Order {} was already submitted",
                self.draft.order_number
            ))),
        }
    }

    /// Move to `Submitting` and hand out the draft to submit.
    pub fn begin_submit(&mut self) -> Result<OrderDraft, AppError> {
        match self.status {
            FormStatus::Editing => {
                self.status = FormStatus::Submitting;
                Ok(self.draft.clone())
            }
            FormStatus::Submitting => Err(AppError::Conflict(
                "Order is already being submitted".to_string(),
            )),
            FormStatus::Done => Err(AppError::Conflict(format!(
                "Order {} was already submitted",
                self.draft.order_number
            ))),
        }
    }

    /// Settle a submission started with [`FormState::begin_submit`].
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.status = if succeeded {
            FormStatus::Done
        } else {
            FormStatus::Editing
        };
    }
}
