use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::HyperMailError;
use crate::utils::truncation::truncate_body;
use super::client::BackendClient;
use super::types::{
    CompaniesResponse, Company, CompanyProfile, GenerateEmailRequest, GeneratedEmail,
    OutgoingEmail, SendReceipt,
};

pub const FIND_COMPANIES_PATH: &str = "/api/emailGenerator/generate/";
pub const GENERATE_EMAIL_PATH: &str = "/api/prompts/generate_email/";
pub const SEND_EMAIL_PATH: &str = "/api/emailGenerator/send_email/";

/// reqwest client for the email backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HyperMailError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(HyperMailError::Config("backend base_url is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HyperMailError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, HyperMailError> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");

        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            warn!(
                url = %url,
                status = status.as_u16(),
                body = %truncate_body(&text),
                "Backend returned an error status"
            );
            return Err(HyperMailError::Network(format!(
                "{} returned HTTP {}",
                path,
                status.as_u16()
            )));
        }
        Ok(text)
    }
}

fn parse_companies(body: &str) -> Result<Vec<Company>, HyperMailError> {
    if body.trim().is_empty() {
        return Err(HyperMailError::MalformedResponse("empty company list response".into()));
    }
    let parsed: CompaniesResponse = serde_json::from_str(body)
        .map_err(|e| HyperMailError::MalformedResponse(format!("company list: {}", e)))?;
    Ok(parsed.companies)
}

/// Accepts `{"email": "..."}` or a bare JSON string.
fn parse_generated_email(body: &str) -> Result<GeneratedEmail, HyperMailError> {
    if body.trim().is_empty() {
        return Err(HyperMailError::MalformedResponse("empty email response".into()));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| HyperMailError::MalformedResponse(format!("generated email: {}", e)))?;
    let email = match value {
        Value::String(text) => text,
        Value::Object(ref map) => match map.get("email") {
            Some(Value::String(text)) => text.clone(),
            _ => {
                return Err(HyperMailError::MalformedResponse(
                    "generated email: missing string field `email`".into(),
                ))
            }
        },
        _ => {
            return Err(HyperMailError::MalformedResponse(
                "generated email: unexpected JSON shape".into(),
            ))
        }
    };
    if email.trim().is_empty() {
        return Err(HyperMailError::MalformedResponse("generated email is empty".into()));
    }
    Ok(GeneratedEmail { email })
}

/// Any acknowledgment is fine; non-JSON text is kept as a string.
fn parse_receipt(body: &str) -> SendReceipt {
    let trimmed = body.trim();
    let raw = if trimmed.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
    };
    SendReceipt { raw }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn find_companies(&self, profile: &CompanyProfile) -> Result<Vec<Company>, HyperMailError> {
        let body = self.post_json(FIND_COMPANIES_PATH, profile).await?;
        let companies = parse_companies(&body)?;
        debug!(count = companies.len(), "Companies received");
        Ok(companies)
    }

    async fn generate_email(&self, company_name: &str) -> Result<GeneratedEmail, HyperMailError> {
        let request = GenerateEmailRequest { company_name };
        let body = self.post_json(GENERATE_EMAIL_PATH, &request).await?;
        parse_generated_email(&body)
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<SendReceipt, HyperMailError> {
        let body = self.post_json(SEND_EMAIL_PATH, email).await?;
        Ok(parse_receipt(&body))
    }

    fn backend_name(&self) -> &str {
        "http"
    }
}
