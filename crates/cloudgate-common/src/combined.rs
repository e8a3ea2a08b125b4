//! Envelope types for the combined `/all/*` operations: one logical request
//! fanned out to both providers, each outcome captured independently.

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::types::{AwsDeleteArgs, GcpDeleteArgs};

/// One logical request addressed to either or both providers. An absent
/// section means that provider is skipped, not an error. Missing fields
/// deserialize to `None` without requiring `G: Default` / `A: Default`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedRequest<G, A> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<G>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<A>,
}

/// Combined delete carries an explicit confirmation flag: the operation is
/// destructive on two providers at once and is rejected without it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedDeleteRequest {
    #[serde(default)]
    pub confirm: bool,
    #[serde(default)]
    pub gcp: Option<GcpDeleteArgs>,
    #[serde(default)]
    pub aws: Option<AwsDeleteArgs>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotError {
    pub kind: String,
    pub message: String,
}

impl From<&GatewayError> for SlotError {
    fn from(err: &GatewayError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Per-provider outcome inside a combined result.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SlotError>,
}

impl<T> ProviderOutcome<T> {
    pub fn from_result(res: Result<T>) -> Self {
        match res {
            Ok(value) => Self {
                success: true,
                result: Some(value),
                error: None,
            },
            Err(err) => Self {
                success: false,
                result: None,
                error: Some(SlotError::from(&err)),
            },
        }
    }
}

/// Never fails wholesale: a slot is absent when its input section was absent,
/// and each present slot reports its own success or error.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedResult<G, A> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<ProviderOutcome<G>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<ProviderOutcome<A>>,
}

impl<G, A> CombinedResult<G, A> {
    pub fn all_succeeded(&self) -> bool {
        self.gcp.as_ref().map_or(true, |o| o.success)
            && self.aws.as_ref().map_or(true, |o| o.success)
    }

    /// True when one attempted provider succeeded and another failed.
    pub fn is_partial(&self) -> bool {
        let outcomes: Vec<bool> = self
            .gcp
            .as_ref()
            .map(|o| o.success)
            .into_iter()
            .chain(self.aws.as_ref().map(|o| o.success))
            .collect();
        outcomes.iter().any(|ok| *ok) && outcomes.iter().any(|ok| !*ok)
    }
}
