//! Gateway configuration from the environment. Every knob has a default, so
//! a bare `cloudgate` starts and serves against the in-memory backends.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use cloudgate_common::{GatewayError, NameGuard, Result};

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_AWS_REGION: &str = "us-west-2";
pub const DEFAULT_NAME_PREFIX: &str = "t3-";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
    /// Fallback GCP service-account key file, used when a request carries no
    /// credentials of its own.
    pub gcp_credentials: Option<PathBuf>,
    /// Region applied to AWS requests that omit one. Empty string disables
    /// the default, making `region` mandatory per request.
    pub aws_region: Option<String>,
    pub name_prefix: String,
    pub provider_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.parse().unwrap_or_else(|_| {
                // The literal above always parses.
                SocketAddr::from(([0, 0, 0, 0], 8080))
            }),
            gcp_credentials: None,
            aws_region: Some(DEFAULT_AWS_REGION.to_string()),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(listen) = var("CLOUDGATE_LISTEN") {
            config.listen = listen.parse().map_err(|_| {
                GatewayError::Config(format!("CLOUDGATE_LISTEN '{listen}' is not a socket address"))
            })?;
        }

        config.gcp_credentials = var("CLOUDGATE_GCP_CREDENTIALS")
            .or_else(|| var("GOOGLE_APPLICATION_CREDENTIALS"))
            .map(PathBuf::from);

        if let Some(region) = var("CLOUDGATE_AWS_REGION") {
            config.aws_region = if region.is_empty() { None } else { Some(region) };
        }

        if let Some(prefix) = var("CLOUDGATE_NAME_PREFIX") {
            config.name_prefix = prefix;
        }

        if let Some(secs) = var("CLOUDGATE_PROVIDER_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                GatewayError::Config(format!(
                    "CLOUDGATE_PROVIDER_TIMEOUT_SECS '{secs}' is not a number of seconds"
                ))
            })?;
            if secs == 0 {
                return Err(GatewayError::Config(
                    "CLOUDGATE_PROVIDER_TIMEOUT_SECS must be at least 1".into(),
                ));
            }
            config.provider_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// An empty prefix turns enforcement off.
    pub fn name_guard(&self) -> NameGuard {
        NameGuard::new(self.name_prefix.as_str())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.aws_region.as_deref(), Some("us-west-2"));
        assert_eq!(config.name_prefix, "t3-");
        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert!(config.gcp_credentials.is_none());
    }

    #[test]
    fn default_guard_enforces_the_prefix() {
        let guard = GatewayConfig::default().name_guard();
        assert!(guard.matches("t3-web"));
        assert!(!guard.matches("web"));
    }
}
