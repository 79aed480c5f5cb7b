//! Error taxonomy for the desk and its scoring backend.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Classification of a failed call to the scoring service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// No response within the allotted time.
    #[error("request timed out")]
    Timeout,
    /// The request left but nothing came back (refused, reset, DNS).
    #[error("scoring service unreachable: {0}")]
    Unreachable(String),
    /// The service answered with an error status.
    #[error("scoring service rejected the request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// A success status whose body does not match the contract.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Timeout => "timeout",
            TransportError::Unreachable(_) => "unreachable",
            TransportError::Rejected { .. } => "rejected",
            TransportError::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() {
            TransportError::Malformed(err.to_string())
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }
}

/// Fields that blocked a submission before it reached the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl ValidationFailure {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing fields: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            parts.push(format!("out of range: {}", self.invalid.join(", ")));
        }
        if parts.is_empty() {
            f.write_str("form incomplete")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

/// User-facing failures of the desk. None of them is fatal; retrying the
/// triggering action is always allowed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeskError {
    #[error("feature schema unavailable: {0}")]
    SchemaUnavailable(String),
    #[error("sample data unavailable: {0}")]
    SampleUnavailable(String),
    #[error("model performance unavailable: {0}")]
    PerformanceUnavailable(String),
    #[error("please complete the form ({0})")]
    Validation(ValidationFailure),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("the scoring service took longer than {}s to answer, please try again", .0.as_secs())]
    Timeout(Duration),
    #[error("could not reach the scoring service, is the backend running? ({0})")]
    Unreachable(String),
    #[error("{detail}")]
    RemoteRejected { status: Option<u16>, detail: String },
    #[error("scoring service sent an unexpected response: {0}")]
    MalformedResponse(String),
    #[error("a submission is already in progress")]
    AlreadyInProgress,
    #[error("submission cancelled")]
    Cancelled,
    #[error("the form is not ready yet, the feature schema has not loaded")]
    NotReady,
}

impl DeskError {
    /// Short stable code for logs and API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            DeskError::SchemaUnavailable(_) => "schema_unavailable",
            DeskError::SampleUnavailable(_) => "sample_unavailable",
            DeskError::PerformanceUnavailable(_) => "performance_unavailable",
            DeskError::Validation(_) => "validation_error",
            DeskError::UnknownField(_) => "unknown_field",
            DeskError::Timeout(_) => "timeout",
            DeskError::Unreachable(_) => "unreachable",
            DeskError::RemoteRejected { .. } => "remote_rejected",
            DeskError::MalformedResponse(_) => "malformed_response",
            DeskError::AlreadyInProgress => "already_in_progress",
            DeskError::Cancelled => "cancelled",
            DeskError::NotReady => "not_ready",
        }
    }

    /// Map a failed prediction call onto the submission taxonomy.
    pub(crate) fn from_prediction(err: TransportError, timeout: Duration) -> Self {
        match err {
            TransportError::Timeout => DeskError::Timeout(timeout),
            TransportError::Unreachable(reason) => DeskError::Unreachable(reason),
            TransportError::Rejected { status, detail } => DeskError::RemoteRejected {
                status: Some(status),
                detail,
            },
            TransportError::Malformed(reason) => DeskError::MalformedResponse(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failures_read_differently() {
        let timeout = DeskError::from_prediction(TransportError::Timeout, Duration::from_secs(30));
        let unreachable =
            DeskError::from_prediction(TransportError::Unreachable("refused".into()), Duration::ZERO);
        let rejected = DeskError::from_prediction(
            TransportError::Rejected {
                status: 400,
                detail: "Eksik alanlar: age".into(),
            },
            Duration::ZERO,
        );

        assert!(timeout.to_string().contains("30s"));
        assert!(unreachable.to_string().contains("could not reach"));
        assert_eq!(rejected.to_string(), "Eksik alanlar: age");
        assert_eq!(rejected.code(), "remote_rejected");
    }

    #[test]
    fn validation_message_lists_fields() {
        let failure = ValidationFailure {
            missing: vec!["housing".into()],
            invalid: vec!["age".into()],
        };
        let message = DeskError::Validation(failure).to_string();
        assert!(message.contains("missing fields: housing"));
        assert!(message.contains("out of range: age"));
    }
}
