use thiserror::Error;

use crate::types::CloudProvider;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{provider} provider error: {message}")]
    Provider {
        provider: CloudProvider,
        message: String,
    },

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal Error: {0}")]
    Internal(String),
}

// Define the primary Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn provider(provider: CloudProvider, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    /// Taxonomy name carried in the `error` field of JSON failure bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation",
            Self::Authentication(_) => "Authentication",
            Self::NotFound(_) => "NotFound",
            Self::Provider { .. } => "Provider",
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => "Internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_taxonomy() {
        assert_eq!(GatewayError::Validation("x".into()).kind(), "Validation");
        assert_eq!(GatewayError::NotFound("x".into()).kind(), "NotFound");
        assert_eq!(
            GatewayError::provider(CloudProvider::Aws, "boom").kind(),
            "Provider"
        );
        assert_eq!(GatewayError::Config("x".into()).kind(), "Internal");
    }

    #[test]
    fn provider_error_names_the_provider() {
        let err = GatewayError::provider(CloudProvider::Gcp, "quota exceeded");
        assert_eq!(err.to_string(), "gcp provider error: quota exceeded");
    }
}
