use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::{BodyEncoding, ServiceConfig};
use crate::error::SubmitError;
use crate::submission::{SheetRow, SubmissionRecord, validator};

/// Outcome of one transport attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub message: Option<String>,
    /// Decoded server payload, or the fallback object when it was not JSON.
    pub raw: Option<Value>,
    pub http_status: u16,
}

/// Anything that can deliver a record somewhere.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, record: &SubmissionRecord) -> Result<SubmissionResult, SubmitError>;
}

/// Posts survey rows to the spreadsheet script, directly or through the relay.
pub struct SheetsClient {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl SheetsClient {
    pub fn new(config: ServiceConfig) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SubmitError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Post `{"test": true}` and report whatever comes back.
    pub async fn test_connection(&self) -> Result<Value, SubmitError> {
        let url = self.endpoint()?;
        let resp = self
            .client
            .post(url.clone())
            .json(&json!({ "test": true }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        Ok(decode_payload(status, &text))
    }

    fn endpoint(&self) -> Result<&reqwest::Url, SubmitError> {
        self.config.endpoint().ok_or_else(|| {
            SubmitError::Configuration("Remote endpoint URL is not configured".to_string())
        })
    }
}

#[async_trait]
impl Submitter for SheetsClient {
    async fn submit(&self, record: &SubmissionRecord) -> Result<SubmissionResult, SubmitError> {
        let url = self.endpoint()?;
        validator::validate(record, self.config.required_fields())?;

        let mut row = SheetRow::from_record(record, Utc::now());
        tracing::debug!("Sending row to {url}: {:?}", row.cells());
        if let Some(secret) = self.config.secret() {
            row = row.with_extra("secret", secret);
        }

        let req = self.client.post(url.clone());
        let req = match self.config.encoding {
            BodyEncoding::Json => req.json(&row.to_json()),
            BodyEncoding::Form => req.form(row.cells()),
        };

        let resp = req.send().await.map_err(|e| {
            tracing::error!("Request to remote endpoint failed: {e}");
            SubmitError::from(e)
        })?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;

        let result = interpret_response(status, &text)?;
        tracing::info!("Submission accepted by remote endpoint ({status})");
        Ok(result)
    }
}

/// Decode a response body, falling back to a wrapper around the raw text.
pub fn decode_payload(status: u16, text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| {
        tracing::warn!("Remote endpoint response is not JSON: {text}");
        let ok = (200..300).contains(&status);
        json!({
            "status": if ok { "ok" } else { "error" },
            "raw": text,
            "httpStatus": status,
        })
    })
}

/// Turn an HTTP status and body into a result or a `Transport` error.
pub fn interpret_response(status: u16, text: &str) -> Result<SubmissionResult, SubmitError> {
    let payload = decode_payload(status, text);
    // The script answers with `message`; the relay's own errors use `error`.
    let server_message = ["message", "error"]
        .iter()
        .find_map(|key| payload.get(key).and_then(|m| m.as_str()))
        .map(|s| s.to_string());

    if !(200..300).contains(&status) {
        tracing::error!("Remote endpoint returned HTTP {status}: {payload}");
        return Err(SubmitError::Transport {
            message: server_message.unwrap_or_else(|| format!("HTTP error: {status}")),
            status: Some(status),
            raw: Some(payload),
        });
    }

    let reported_error = payload
        .get("status")
        .and_then(|s| s.as_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("error"));

    if reported_error {
        tracing::error!("Remote endpoint reported an error: {payload}");
        return Err(SubmitError::Transport {
            message: server_message
                .unwrap_or_else(|| "Remote endpoint reported an error".to_string()),
            status: Some(status),
            raw: Some(payload),
        });
    }

    Ok(SubmissionResult {
        success: true,
        message: server_message,
        raw: Some(payload),
        http_status: status,
    })
}
