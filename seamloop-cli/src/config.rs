//! Configuration module
//!
//! Handles CLI configuration shared by every command.

use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the render service
    pub server_url: String,

    /// Request timeout; `None` waits for the render however long it takes
    pub timeout: Option<Duration>,
}
