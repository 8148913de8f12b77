use super::types::HyperMailError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Whether the raw message can be shown to the user as-is. Backend failures
    /// are replaced by a generic message instead.
    pub user_facing: bool,
    pub exit_code: i32,
}

impl HyperMailError {
    /// Classify this error to determine how it is surfaced.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            HyperMailError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                user_facing: true,
                exit_code: 2,
            },
            HyperMailError::MissingInput(_) => ErrorClassification {
                error_type: "MissingInputError",
                user_facing: true,
                exit_code: 3,
            },
            HyperMailError::InvalidSelection(_) => ErrorClassification {
                error_type: "InvalidSelectionError",
                user_facing: true,
                exit_code: 3,
            },

            // Transport-class failures share one generic surface
            HyperMailError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                user_facing: false,
                exit_code: 4,
            },
            HyperMailError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                user_facing: false,
                exit_code: 4,
            },
            HyperMailError::MalformedResponse(_) => ErrorClassification {
                error_type: "MalformedResponseError",
                user_facing: false,
                exit_code: 4,
            },

            HyperMailError::Io(_) => ErrorClassification {
                error_type: "IoError",
                user_facing: true,
                exit_code: 1,
            },
            HyperMailError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                user_facing: false,
                exit_code: 1,
            },
            HyperMailError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                user_facing: true,
                exit_code: 2,
            },
            HyperMailError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                user_facing: false,
                exit_code: 1,
            },
            HyperMailError::Request { source, .. } => ErrorClassification {
                user_facing: true,
                ..source.classify()
            },
        }
    }

    /// Message to show the user, falling back to `generic` for errors whose
    /// detail belongs in the log rather than on screen.
    pub fn user_message(&self, generic: &str) -> String {
        if self.classify().user_facing {
            self.to_string()
        } else {
            generic.to_string()
        }
    }
}
