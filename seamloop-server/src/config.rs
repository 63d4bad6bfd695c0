//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: String,

    /// Externally reachable base URL, used in render descriptors
    pub public_url: String,

    /// Directory published renders are moved into
    pub renders_dir: PathBuf,

    /// How long a published render stays downloadable
    pub render_retention: Duration,

    /// How often expired renders are swept
    pub sweep_interval: Duration,
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// - SEAMLOOP_BIND_ADDR (default 0.0.0.0:8080)
    /// - SEAMLOOP_PUBLIC_URL (default http://localhost:8080)
    /// - SEAMLOOP_RENDERS_DIR
    /// - SEAMLOOP_RENDER_RETENTION, SEAMLOOP_SWEEP_INTERVAL (seconds)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: env_string("SEAMLOOP_BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_url: env_string("SEAMLOOP_PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_url),
            renders_dir: env_string("SEAMLOOP_RENDERS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.renders_dir),
            render_retention: env_secs("SEAMLOOP_RENDER_RETENTION")
                .unwrap_or(defaults.render_retention),
            sweep_interval: env_secs("SEAMLOOP_SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("invalid bind_addr {:?}: {}", self.bind_addr, e))?;

        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            anyhow::bail!("public_url must be an http(s) URL");
        }

        if self.render_retention.is_zero() {
            anyhow::bail!("render_retention must be greater than 0");
        }

        if self.sweep_interval.is_zero() {
            anyhow::bail!("sweep_interval must be greater than 0");
        }

        Ok(())
    }

    /// Download URL of a published render
    pub fn render_url(&self, file_name: &str) -> String {
        format!(
            "{}/renders/{}",
            self.public_url.trim_end_matches('/'),
            file_name
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            renders_dir: std::env::temp_dir().join("seamloop-renders"),
            render_retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_string(key)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.render_retention, Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();

        config.bind_addr = "localhost".to_string();
        assert!(config.validate().is_err());
        config.bind_addr = "127.0.0.1:9000".to_string();

        config.public_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
        config.public_url = "https://renders.example.com".to_string();

        config.sweep_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.sweep_interval = Duration::from_secs(5);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_render_url() {
        let mut config = ServerConfig::default();
        config.public_url = "https://renders.example.com/".to_string();
        assert_eq!(
            config.render_url("abc.mp4"),
            "https://renders.example.com/renders/abc.mp4"
        );
    }
}
