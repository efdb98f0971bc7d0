use serde_json::json;
use thiserror::Error;

/// Application-level error type.
///
/// `Config` is fatal to the call that raised it and is never retried. Pagination itself
/// has no other failure mode; `Internal` only comes out of the worker pool.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid layout configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for building a configuration error from any message.
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config(message.into())
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// JSON error body, `{"error": {"code": ..., "message": ...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        let message = match self {
            AppError::Config(msg) => msg.clone(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal error occurred".to_string()
            }
        };

        json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_code_and_message() {
        let err = AppError::config("font_size must be > 0");
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert_eq!(
            err.to_string(),
            "Invalid layout configuration: font_size must be > 0"
        );
    }

    #[test]
    fn test_config_error_json_body_keeps_message() {
        let body = AppError::config("width must be > 0").to_json();
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
        assert_eq!(body["error"]["message"], "width must be > 0");
    }

    #[test]
    fn test_internal_error_json_body_hides_details() {
        let err = AppError::from(anyhow::anyhow!("worker panicked: secret detail"));
        let body = err.to_json();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(
            !body["error"]["message"]
                .as_str()
                .unwrap_or_default()
                .contains("secret"),
            "internal details must not leak into the error body"
        );
    }
}
