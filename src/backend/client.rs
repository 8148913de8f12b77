use async_trait::async_trait;
use crate::errors::HyperMailError;
use super::types::{Company, CompanyProfile, GeneratedEmail, OutgoingEmail, SendReceipt};

/// The external service that does the real work.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Companies matching a target profile
    async fn find_companies(&self, profile: &CompanyProfile) -> Result<Vec<Company>, HyperMailError>;

    /// AI-written outreach email for one company
    async fn generate_email(&self, company_name: &str) -> Result<GeneratedEmail, HyperMailError>;

    /// Deliver an edited email
    async fn send_email(&self, email: &OutgoingEmail) -> Result<SendReceipt, HyperMailError>;

    /// Backend identifier for logging
    fn backend_name(&self) -> &str;
}
