//! Error response body

use serde::{Deserialize, Serialize};

/// Body of every failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `encode_timeout`
    pub error: String,
    /// Short human-readable detail, possibly truncated
    pub details: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}
