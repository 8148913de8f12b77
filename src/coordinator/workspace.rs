use serde::Serialize;
use crate::backend::{Company, OutgoingEmail};
use crate::config::SenderConfig;
use crate::errors::HyperMailError;

pub const EMAIL_PLACEHOLDER: &str =
    "This is a placeholder for the generated email. Generate an email by entering a company name above.";
pub const MISSING_COMPANY_MESSAGE: &str = "Please enter a company name";

/// Everything the user is composing, plus the last search results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DraftWorkspace {
    pub company_name: String,
    pub to: String,
    pub cc: String,
    pub subject: String,
    pub body: String,
    pub generated_email: Option<String>,
    pub error: Option<String>,
    pub companies: Vec<Company>,
    pub is_loading: bool,
}

impl DraftWorkspace {
    pub fn with_sender_defaults(sender: Option<&SenderConfig>) -> Self {
        let mut workspace = Self::default();
        workspace.apply_sender_defaults(sender);
        workspace
    }

    fn apply_sender_defaults(&mut self, sender: Option<&SenderConfig>) {
        if let Some(sender) = sender {
            self.cc = sender.cc.clone().unwrap_or_default();
            self.subject = sender.subject.clone().unwrap_or_default();
        }
    }

    /// Body text to show; the placeholder until something was written.
    pub fn display_body(&self) -> &str {
        if self.body.trim().is_empty() {
            EMAIL_PLACEHOLDER
        } else {
            &self.body
        }
    }

    pub fn store_generated(&mut self, email: &str) {
        self.generated_email = Some(email.to_string());
        self.body = email.to_string();
        self.error = None;
    }

    /// Reset the draft, keeping the company list and sender defaults.
    pub fn clear_draft(&mut self, sender: Option<&SenderConfig>) {
        let companies = std::mem::take(&mut self.companies);
        *self = Self {
            companies,
            ..Self::default()
        };
        self.apply_sender_defaults(sender);
    }

    /// Validate the draft and build the payload for the send endpoint.
    pub fn to_outgoing(&self) -> Result<OutgoingEmail, HyperMailError> {
        let to = self.to.trim();
        if to.is_empty() {
            return Err(HyperMailError::MissingInput("Please enter a recipient address".into()));
        }
        if !to.contains('@') {
            return Err(HyperMailError::MissingInput(format!(
                "'{}' is not a valid email address",
                to
            )));
        }
        if self.subject.trim().is_empty() {
            return Err(HyperMailError::MissingInput("Please enter a subject".into()));
        }
        if self.body.trim().is_empty() {
            return Err(HyperMailError::MissingInput("Please write or generate an email body".into()));
        }
        Ok(OutgoingEmail {
            to_email: to.to_string(),
            subject: self.subject.trim().to_string(),
            cc_email: self.cc.trim().to_string(),
            message: self.body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> DraftWorkspace {
        DraftWorkspace {
            to: " ceo@acme.io ".into(),
            subject: "Sponsorship".into(),
            body: "Dear Acme".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_placeholder_until_body_written() {
        let mut ws = DraftWorkspace::default();
        assert_eq!(ws.display_body(), EMAIL_PLACEHOLDER);
        ws.store_generated("Hello Acme");
        assert_eq!(ws.display_body(), "Hello Acme");
        assert_eq!(ws.generated_email.as_deref(), Some("Hello Acme"));
    }

    #[test]
    fn test_sender_defaults_prefill() {
        let sender = SenderConfig {
            cc: Some("team@hyperloop.org".into()),
            subject: Some("Partnership".into()),
        };
        let ws = DraftWorkspace::with_sender_defaults(Some(&sender));
        assert_eq!(ws.cc, "team@hyperloop.org");
        assert_eq!(ws.subject, "Partnership");
    }

    #[test]
    fn test_outgoing_trims_fields() {
        let out = ready().to_outgoing().unwrap();
        assert_eq!(out.to_email, "ceo@acme.io");
        assert_eq!(out.cc_email, "");
        assert_eq!(out.message, "Dear Acme");
    }

    #[test]
    fn test_outgoing_validation() {
        let mut ws = ready();
        ws.to = "not-an-address".into();
        assert!(matches!(ws.to_outgoing(), Err(HyperMailError::MissingInput(_))));

        let mut ws = ready();
        ws.subject = " ".into();
        assert!(ws.to_outgoing().is_err());

        let mut ws = ready();
        ws.body.clear();
        assert!(ws.to_outgoing().is_err());
    }

    #[test]
    fn test_clear_keeps_companies() {
        let mut ws = ready();
        ws.companies.push(Company { name: "Acme".into(), ..Default::default() });
        ws.error = Some("boom".into());
        ws.clear_draft(None);
        assert_eq!(ws.companies.len(), 1);
        assert!(ws.to.is_empty());
        assert!(ws.error.is_none());
    }
}
