use serde::{Deserialize, Serialize};

/// Target company profile used to search for prospects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub industry: String,
    pub size: String,
    pub sector: String,
    pub location: String,
    pub vibe: String,
    #[serde(default)]
    pub details: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            industry: "Technology".to_string(),
            size: "Medium".to_string(),
            sector: "Software".to_string(),
            location: "California".to_string(),
            vibe: "Professional".to_string(),
            details: String::new(),
        }
    }
}

impl CompanyProfile {
    /// Fill blank fields from the defaults.
    pub fn with_defaults(self) -> Self {
        let defaults = Self::default();
        let pick = |value: String, fallback: String| {
            if value.trim().is_empty() { fallback } else { value }
        };
        Self {
            industry: pick(self.industry, defaults.industry),
            size: pick(self.size, defaults.size),
            sector: pick(self.sector, defaults.sector),
            location: pick(self.location, defaults.location),
            vibe: pick(self.vibe, defaults.vibe),
            details: self.details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_values: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompaniesResponse {
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GenerateEmailRequest<'a> {
    pub company_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedEmail {
    pub email: String,
}

/// Outgoing message as posted to the send endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to_email: String,
    pub subject: String,
    pub cc_email: String,
    pub message: String,
}

/// Delivery acknowledgment; its shape is up to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub raw: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_defaults_fill_blanks() {
        let profile = CompanyProfile {
            industry: "Mining".into(),
            size: String::new(),
            sector: "  ".into(),
            location: "Denver".into(),
            vibe: String::new(),
            details: "mention the pod".into(),
        }
        .with_defaults();
        assert_eq!(profile.industry, "Mining");
        assert_eq!(profile.size, "Medium");
        assert_eq!(profile.sector, "Software");
        assert_eq!(profile.vibe, "Professional");
        assert_eq!(profile.details, "mention the pod");
    }

    #[test]
    fn test_profile_serializes_all_fields() {
        let value = serde_json::to_value(CompanyProfile::default()).unwrap();
        for key in ["industry", "size", "sector", "location", "vibe", "details"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_company_tolerates_missing_and_extra_fields() {
        let company: Company = serde_json::from_value(json!({
            "name": "Boring Co",
            "website": "https://example.com",
            "key_values": ["safety", "speed"],
            "founded": 2016
        }))
        .unwrap();
        assert_eq!(company.name, "Boring Co");
        assert!(company.email.is_empty());
        assert_eq!(company.website.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_outgoing_email_wire_names() {
        let email = OutgoingEmail {
            to_email: "a@b.com".into(),
            subject: "Hi".into(),
            cc_email: String::new(),
            message: "Body".into(),
        };
        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["to_email"], "a@b.com");
        assert_eq!(value["cc_email"], "");
        assert_eq!(value["message"], "Body");
    }
}
