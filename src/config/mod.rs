//! Configuration module for the intake service.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Spreadsheet and SMTP settings only exist when every one of their values is set.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;
use crate::form::RequiredFields;

/// Default OAuth token endpoint for service-account grants.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Largest accepted distance from UTC, in minutes.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 23 * 60 + 59;

/// Default base URL of the spreadsheet values API.
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Where the desk posts finished orders; `None` disables transmission
    pub intake_url: Option<String>,
    /// Upper bound for one transmission attempt
    pub intake_timeout: Duration,
    /// Largest accepted request body (drafts carry photos and PDFs)
    pub max_body_bytes: usize,
    /// Fields a draft must carry before it can be submitted
    pub required_fields: RequiredFields,
    /// Shop-local offset from UTC, used for printed dates and times
    pub utc_offset_minutes: i32,
    /// Logo used when none has been uploaded
    pub logo_path: Option<PathBuf>,
    pub business: BusinessProfile,
    pub sheets: Option<SheetsConfig>,
    pub smtp: Option<SmtpConfig>,
    /// Optional copy recipient for client mails
    pub copy_to: Option<String>,
}

/// Identity printed on documents and mails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessProfile {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    /// Mail signature line, e.g. "Lucas Rongo – Técnico responsable"
    pub signature: String,
    pub locations: Vec<String>,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "Lott Fix & Parts".to_string(),
            phone: "11-2602-1568".to_string(),
            email: "lucasrongo@gmail.com".to_string(),
            website: "www.lott.com.ar".to_string(),
            signature: "Lucas Rongo – Técnico responsable".to_string(),
            locations: vec!["Núñez".to_string(), "Vicente López".to_string()],
        }
    }
}

/// Service-account credentials and ledger target.
#[derive(Clone)]
pub struct SheetsConfig {
    pub service_account_email: String,
    pub private_key: String,
    pub sheet_id: String,
    pub sheet_name: String,
    pub token_uri: String,
    pub api_base: String,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("service_account_email", &self.service_account_email)
            .field("sheet_id", &self.sheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("token_uri", &self.token_uri)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// SMTP transport settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Configuration(format!("Invalid BIND_ADDR: {}", e)))?;

        let db_path = env::var("DB_PATH")
            .unwrap_or_else(|_| "./data/intake.sqlite".to_string())
            .into();

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        // Unset means "this process"; an explicit empty value disables transmission.
        let intake_url = match env::var("INTAKE_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => Some(format!("http://{}/api/orden", bind_addr)),
        };

        let intake_timeout = Duration::from_secs(parse_or("INTAKE_TIMEOUT_SECS", 15)?);
        let max_body_bytes = parse_or("MAX_BODY_BYTES", 25 * 1024 * 1024)?;
        let utc_offset_minutes = parse_or("UTC_OFFSET_MINUTES", -180)?;
        if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&utc_offset_minutes) {
            return Err(AppError::Configuration(format!(
                "Invalid UTC_OFFSET_MINUTES: {} is outside ±{}",
                utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
            )));
        }

        let required_fields = match non_empty("REQUIRED_FIELDS") {
            Some(list) => RequiredFields::parse(&list)?,
            None => RequiredFields::default(),
        };

        let logo_path = non_empty("LOGO_PATH").map(PathBuf::from);

        let defaults = BusinessProfile::default();
        let business = BusinessProfile {
            name: non_empty("BUSINESS_NAME").unwrap_or(defaults.name),
            phone: non_empty("BUSINESS_PHONE").unwrap_or(defaults.phone),
            email: non_empty("BUSINESS_EMAIL").unwrap_or(defaults.email),
            website: non_empty("BUSINESS_WEBSITE").unwrap_or(defaults.website),
            signature: non_empty("BUSINESS_SIGNATURE").unwrap_or(defaults.signature),
            locations: non_empty("BUSINESS_LOCATIONS")
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.locations),
        };

        Ok(Self {
            bind_addr,
            db_path,
            log_level,
            intake_url,
            intake_timeout,
            max_body_bytes,
            required_fields,
            utc_offset_minutes,
            logo_path,
            business,
            sheets: SheetsConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            copy_to: non_empty("COPY_TO"),
        })
    }
}

impl SheetsConfig {
    /// Present only when account, key, sheet id and sheet name are all set.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            service_account_email: non_empty("GOOGLE_SERVICE_ACCOUNT_EMAIL")?,
            private_key: non_empty("GOOGLE_PRIVATE_KEY")?,
            sheet_id: non_empty("SHEET_ID")?,
            sheet_name: non_empty("SHEET_NAME")?,
            token_uri: non_empty("GOOGLE_TOKEN_URI")
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            api_base: non_empty("SHEETS_API_BASE")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
        })
    }
}

impl SmtpConfig {
    /// Present only when host, port, user, password and sender are all set.
    pub fn from_env() -> Option<Self> {
        let port = non_empty("SMTP_PORT")?;
        let port = match port.trim().parse() {
            Ok(port) => port,
            Err(_) => {
                tracing::warn!("Ignoring SMTP settings: SMTP_PORT {:?} is not a port", port);
                return None;
            }
        };

        Some(Self {
            host: non_empty("SMTP_HOST")?,
            port,
            user: non_empty("SMTP_USER")?,
            password: non_empty("SMTP_PASS")?,
            from: non_empty("FROM_EMAIL")?,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Configuration(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
