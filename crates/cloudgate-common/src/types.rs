use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Gcp,
    Aws,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gcp => write!(f, "gcp"),
            Self::Aws => write!(f, "aws"),
        }
    }
}

/// A remote instance as observed through a provider. The record is owned by
/// the cloud provider; the gateway only reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub name: String,
    pub provider: CloudProvider,
    pub state: String,
    pub machine_type: String,
    /// Zone for GCP, region for AWS.
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTypeRecord {
    pub name: String,
    pub vcpus: u32,
    pub memory_gb: f64,
}

/// Result of a create call. The password is present only when password auth
/// was configured for the instance; it is reported exactly once and never
/// persisted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedInstance {
    #[serde(flatten)]
    pub record: InstanceRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Instance names (GCP) or ids (AWS) that were terminated.
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

// --- GCP request shapes ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpInstanceSpec {
    /// Credentials file path or inline key material; falls back to the
    /// configured default when absent.
    #[serde(default)]
    pub credentials: Option<String>,
    pub zone: String,
    pub name: String,
    pub machine_type: String,
    #[serde(default)]
    pub ssh_key: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GcpListArgs {
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpFindArgs {
    #[serde(default)]
    pub credentials: Option<String>,
    pub zone: String,
    #[serde(default = "one")]
    pub cpus: u32,
    #[serde(default = "one", alias = "ram")]
    pub ram_gb: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpDeleteArgs {
    #[serde(default)]
    pub credentials: Option<String>,
    pub name: String,
    /// Omitted zone triggers a cross-zone search.
    #[serde(default)]
    pub zone: Option<String>,
}

// --- AWS request shapes ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsInstanceSpec {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub key_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsListArgs {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsFindArgs {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsDeleteArgs {
    #[serde(default)]
    pub region: Option<String>,
    /// Preferred, unambiguous selector.
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsTypeFilter {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "one")]
    pub min_vcpus: u32,
    #[serde(default = "one_gb")]
    pub min_memory_gb: f64,
}

impl Default for AwsTypeFilter {
    fn default() -> Self {
        Self {
            region: None,
            min_vcpus: 1,
            min_memory_gb: 1.0,
        }
    }
}

fn one() -> u32 {
    1
}

fn one_gb() -> f64 {
    1.0
}
