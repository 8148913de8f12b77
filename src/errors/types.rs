use thiserror::Error;

#[derive(Debug, Error)]
pub enum HyperMailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A backend call failed; `message` is what the user sees.
    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: Box<HyperMailError>,
    },
}

impl HyperMailError {
    /// Put a generic user-visible message in front of a backend failure.
    /// Errors that are already fit to show are returned unchanged.
    pub fn request_failed(message: &str, source: HyperMailError) -> Self {
        if source.classify().user_facing {
            source
        } else {
            HyperMailError::Request {
                message: message.to_string(),
                source: Box::new(source),
            }
        }
    }
}

impl From<reqwest::Error> for HyperMailError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HyperMailError::Timeout(e.to_string())
        } else if e.is_decode() {
            HyperMailError::MalformedResponse(e.to_string())
        } else {
            HyperMailError::Network(e.to_string())
        }
    }
}
