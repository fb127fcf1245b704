//! Error types for the Assurance AI domain.
//!
//! One enum per failure domain, folded into [`Error`] with `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Model provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Schema store: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Malformed event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt needs {needed} tokens before any event but the limit is {limit}")]
    OverBudget { needed: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the external completion and embedding services.
///
/// The orchestrator contains these to the extension being validated; they
/// never abort a whole run.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Model endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Throttled by the model endpoint, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model endpoint rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("No model endpoint configured: {0}")]
    NotConfigured(String),

    #[error("No answer within {0}")]
    Timeout(String),

    #[error("Model endpoint unreachable: {0}")]
    Network(String),

    #[error("Could not embed text: {0}")]
    Embedding(String),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema source {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Schema '{name}' is not valid JSON: {reason}")]
    Parse { name: String, reason: String },

    #[error("Schema '{name}' is missing required field `{field}`")]
    MissingField { name: String, field: String },

    #[error("No schema documents were loaded")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_failure_carries_status() {
        let err = Error::from(ProviderError::Api {
            status: 503,
            message: "deployment overloaded".into(),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("Model provider failed:"));
        assert!(msg.contains("503"));
        assert!(msg.contains("deployment overloaded"));
    }

    #[test]
    fn schema_error_names_the_field() {
        let err = Error::Schema(SchemaError::MissingField {
            name: "analytics.json".into(),
            field: "properties.payload.properties.ACPExtensionEventType.const".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("analytics.json"));
        assert!(msg.contains("ACPExtensionEventType"));
    }

    #[test]
    fn over_budget_reports_both_sizes() {
        let err = Error::OverBudget { needed: 3100, limit: 2048 };
        assert_eq!(
            err.to_string(),
            "Prompt needs 3100 tokens before any event but the limit is 2048"
        );
    }

    #[test]
    fn malformed_json_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("[{").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
