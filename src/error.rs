use thiserror::Error;

/// Failures talking to the test backend.
///
/// Variants carry rendered messages rather than the transport error so that
/// results can travel through the event channel and be shown to the student.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response from the server: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Transport failures and 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Malformed(_) => false,
        }
    }

    /// Short, student-facing description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Unable to reach the server. Please check your connection.".to_string()
            }
            ApiError::Status { status: 401, .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ApiError::Status { status: 403, .. } => {
                "You don't have permission to perform this action.".to_string()
            }
            ApiError::Status { status: 404, .. } => "The test could not be found.".to_string(),
            ApiError::Status { status: 429, .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            ApiError::Status { status, .. } if *status >= 500 => {
                "Something went wrong on our end. Please try again later.".to_string()
            }
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Malformed(_) => "Invalid test data received.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert!(ApiError::Status { status: 502, message: "bad gateway".into() }.is_retryable());
        assert!(!ApiError::Status { status: 400, message: "bad".into() }.is_retryable());
        assert!(!ApiError::Malformed("missing test".into()).is_retryable());
    }

    #[test]
    fn user_message_prefers_status_specific_text() {
        let err = ApiError::Status { status: 404, message: "nope".into() };
        assert_eq!(err.user_message(), "The test could not be found.");

        let err = ApiError::Status { status: 422, message: "Test already submitted".into() };
        assert_eq!(err.user_message(), "Test already submitted");
    }
}
