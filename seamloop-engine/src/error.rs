//! Pipeline error taxonomy
//!
//! Every stage fails fast into [`PipelineError`]. Each variant maps to a
//! stable machine-readable code; the HTTP layer chooses the status.

use seamloop_core::dto::render::InvalidRequest;
use seamloop_core::planner::PlannerError;
use std::time::Duration;
use thiserror::Error;

use crate::fetcher::FetchError;
use crate::media::EncodeError;
use crate::process::truncate_tail;
use crate::prober::ProbeError;

/// Default bound on the `details` text
pub const DETAILS_LIMIT: usize = 2000;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("planner invariant violated: {0}")]
    Planner(#[from] PlannerError),

    #[error("encode failed with exit code {exit_code:?}")]
    EncodeFailed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("encode exceeded {0:?}")]
    EncodeTimeout(Duration),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EncodeError> for PipelineError {
    fn from(error: EncodeError) -> Self {
        match error {
            EncodeError::Failed {
                exit_code,
                diagnostics,
            } => Self::EncodeFailed {
                exit_code,
                diagnostics,
            },
            EncodeError::TimedOut { after } => Self::EncodeTimeout(after),
            EncodeError::Spawn(message) => Self::EncodeFailed {
                exit_code: None,
                diagnostics: message,
            },
            other @ EncodeError::MissingInput(_) => Self::Internal(other.to_string()),
        }
    }
}

impl From<InvalidRequest> for PipelineError {
    fn from(error: InvalidRequest) -> Self {
        Self::Validation(error.0)
    }
}

impl PipelineError {
    /// Stable code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Fetch(_) => "fetch_failed",
            Self::Probe(_) => "probe_failed",
            Self::Planner(_) => "planner_invariant",
            Self::EncodeFailed { .. } => "encode_failed",
            Self::EncodeTimeout(_) => "encode_timeout",
            Self::Delivery(_) => "delivery_failed",
            Self::Workspace(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Human-readable detail, at most `limit` bytes
    ///
    /// Encoder failures report the tail of the engine's diagnostics, which is
    /// where the cause is printed.
    pub fn details(&self, limit: usize) -> String {
        let text = match self {
            Self::EncodeFailed { diagnostics, .. } if !diagnostics.trim().is_empty() => {
                diagnostics.trim().to_string()
            }
            Self::Probe(ProbeError::Failed { diagnostics, .. })
                if !diagnostics.trim().is_empty() =>
            {
                diagnostics.trim().to_string()
            }
            other => other.to_string(),
        };

        truncate_tail(&text, limit).to_string()
    }

    /// Whether the caller may reasonably retry with adjusted parameters
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EncodeTimeout(_)
                | Self::Fetch(FetchError::Timeout { .. })
                | Self::Fetch(FetchError::Transport(_))
        )
    }

    /// Whether the failure was caused by the request rather than the service
    pub fn is_client_fault(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Fetch(e) => e.is_malformed_url(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            PipelineError::Validation("x".into()).code(),
            "validation_error"
        );
        assert_eq!(
            PipelineError::from(PlannerError::InvalidClipDuration(0.0)).code(),
            "planner_invariant"
        );
        assert_eq!(
            PipelineError::from(ProbeError::NotPositive(0.0)).code(),
            "probe_failed"
        );
        assert_eq!(
            PipelineError::EncodeTimeout(Duration::from_secs(1)).code(),
            "encode_timeout"
        );
        assert_eq!(
            PipelineError::Workspace(std::io::Error::other("disk")).code(),
            "internal_error"
        );
    }

    #[test]
    fn test_encode_errors_map_distinctly() {
        let failed = PipelineError::from(EncodeError::Failed {
            exit_code: Some(1),
            diagnostics: "Invalid data found".into(),
        });
        assert_eq!(failed.code(), "encode_failed");
        assert!(!failed.is_retryable());

        let timeout = PipelineError::from(EncodeError::TimedOut {
            after: Duration::from_secs(300),
        });
        assert_eq!(timeout.code(), "encode_timeout");
        assert!(timeout.is_retryable());
    }

    #[test]
    fn test_details_are_bounded_diagnostic_tail() {
        let diagnostics = format!("{}END", "x".repeat(5000));
        let error = PipelineError::EncodeFailed {
            exit_code: Some(1),
            diagnostics,
        };

        let details = error.details(100);
        assert_eq!(details.len(), 100);
        assert!(details.ends_with("END"));
    }

    #[test]
    fn test_details_fall_back_to_message() {
        let error = PipelineError::EncodeFailed {
            exit_code: Some(1),
            diagnostics: "  ".into(),
        };
        assert_eq!(error.details(DETAILS_LIMIT), "encode failed with exit code Some(1)");
    }

    #[test]
    fn test_client_fault() {
        let malformed = PipelineError::from(FetchError::InvalidUrl {
            url: "nope".into(),
            reason: "relative URL without a base".into(),
        });
        assert!(malformed.is_client_fault());

        let unreachable = PipelineError::from(FetchError::Timeout {
            url: "https://x/a.mp4".into(),
        });
        assert!(!unreachable.is_client_fault());
        assert!(PipelineError::from(InvalidRequest("bad".into())).is_client_fault());
    }
}
