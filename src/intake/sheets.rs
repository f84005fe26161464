//! Spreadsheet ledger: one appended row per accepted order.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::SheetsConfig;
use crate::errors::AppError;

/// OAuth scope granting read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Lifetime requested for service-account assertions (the maximum allowed).
const ASSERTION_TTL_SECS: i64 = 3600;

/// Appends rows to the remote ledger.
#[async_trait]
pub trait SheetLedger: Send + Sync {
    async fn append_row(&self, row: Vec<String>) -> Result<(), AppError>;
}

/// Keys pasted into environment variables often carry literal `\n` sequences.
pub fn normalize_private_key(raw: &str) -> String {
    raw.trim().trim_matches('"').replace("\\n", "\n")
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct CachedToken {
    access_token: String,
    /// Absolute expiry timestamp (seconds since epoch).
    expires_at: i64,
}

#[derive(Serialize)]
struct ValueRange<'a> {
    values: [&'a [String]; 1],
}

/// Google Sheets ledger authenticated with a service account.
pub struct GoogleSheetsLedger {
    http: reqwest::Client,
    config: SheetsConfig,
    key: EncodingKey,
    cached: RwLock<Option<CachedToken>>,
}

impl GoogleSheetsLedger {
    pub fn new(config: SheetsConfig) -> Result<Self, AppError> {
        let pem = normalize_private_key(&config.private_key);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            config,
            key,
            cached: RwLock::new(None),
        })
    }

    fn assertion(&self, now: i64) -> Result<String, AppError> {
        let claims = AssertionClaims {
            iss: self.config.service_account_email.clone(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            aud: self.config.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.key)?)
    }

    async fn exchange_token(&self) -> Result<CachedToken, AppError> {
        let now = chrono::Utc::now().timestamp();
        let assertion = self.assertion(now)?;

        let resp = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Sheets(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Sheets(format!("token response: {}", e)))?;

        // Expire a minute early so a token never dies mid-request.
        let expires_at = now + token.expires_in.unwrap_or(ASSERTION_TTL_SECS) - 60;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }

    async fn access_token(&self) -> Result<String, AppError> {
        {
            let guard = self.cached.read().await;
            if let Some(ref cached) = *guard {
                if chrono::Utc::now().timestamp() < cached.expires_at {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut guard = self.cached.write().await;
        if let Some(ref cached) = *guard {
            if chrono::Utc::now().timestamp() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.exchange_token().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    fn append_url(&self) -> Result<reqwest::Url, AppError> {
        let invalid =
            |detail: String| AppError::Configuration(format!("Invalid SHEETS_API_BASE: {}", detail));

        let range = format!("{}!A:Z:append", self.config.sheet_name);
        let mut url = reqwest::Url::parse(&self.config.api_base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(self.config.api_base.clone()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.sheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }
}

#[async_trait]
impl SheetLedger for GoogleSheetsLedger {
    async fn append_row(&self, row: Vec<String>) -> Result<(), AppError> {
        let token = self.access_token().await?;
        let url = self.append_url()?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&ValueRange {
                values: [row.as_slice()],
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Sheets(format!(
                "append to {} failed ({}): {}",
                self.config.sheet_name, status, body
            )));
        }

        tracing::debug!("Appended ledger row to {}", self.config.sheet_name);
        Ok(())
    }
}
