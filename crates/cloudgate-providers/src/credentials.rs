//! GCP credential resolution with an explicit order: inline key material in
//! the request, then a file path from the request, then the configured
//! default path. Credential contents never reach logs or error messages.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use cloudgate_common::{GatewayError, Result};

/// The subset of a service-account key file the gateway needs.
#[derive(Debug, Clone, Deserialize)]
pub struct GcpCredentials {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    default_path: Option<PathBuf>,
}

impl CredentialResolver {
    pub fn new(default_path: Option<PathBuf>) -> Self {
        Self { default_path }
    }

    pub fn resolve(&self, supplied: Option<&str>) -> Result<GcpCredentials> {
        if let Some(raw) = supplied {
            // Inline key material is passed through as-is, never written to disk.
            if raw.trim_start().starts_with('{') {
                return parse(raw);
            }
            return read_file(Path::new(raw));
        }
        match &self.default_path {
            Some(path) => read_file(path),
            None => Err(GatewayError::Authentication(
                "no credentials supplied and no default credentials file configured".into(),
            )),
        }
    }
}

fn read_file(path: &Path) -> Result<GcpCredentials> {
    debug!(path = %path.display(), "loading GCP credentials file");
    let raw = std::fs::read_to_string(path).map_err(|err| {
        GatewayError::Authentication(format!(
            "cannot read credentials file {}: {err}",
            path.display()
        ))
    })?;
    parse(&raw)
}

fn parse(raw: &str) -> Result<GcpCredentials> {
    let creds: GcpCredentials = serde_json::from_str(raw)
        .map_err(|_| GatewayError::Authentication("malformed credentials JSON".into()))?;
    if creds.project_id.is_empty() {
        return Err(GatewayError::Authentication(
            "credentials are missing a project_id".into(),
        ));
    }
    Ok(creds)
}
