//! GCP adapter: generic lifecycle operations over a minimal compute surface.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use cloudgate_common::{
    CloudProvider, CreatedInstance, DeletionReport, GatewayError, GcpDeleteArgs, GcpFindArgs,
    GcpInstanceSpec, GcpListArgs, InstanceRecord, InstanceTypeRecord, Result,
};

use crate::credentials::CredentialResolver;
use crate::password;

pub const DEFAULT_SOURCE_IMAGE: &str = "projects/debian-cloud/global/images/family/debian-11";
pub const DEFAULT_BOOT_DISK_GB: u64 = 10;

/// Raw compute surface the adapter drives. The in-memory backend implements
/// this for local development; an SDK-backed client would implement the same
/// trait.
#[async_trait]
pub trait GcpComputeApi: Send + Sync {
    async fn list_zones(&self, project: &str) -> Result<Vec<String>>;
    async fn list_instances(&self, project: &str, zone: &str) -> Result<Vec<GcpInstance>>;
    async fn get_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<Option<GcpInstance>>;
    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        config: GcpLaunchConfig,
    ) -> Result<GcpInstance>;
    async fn delete_instance(&self, project: &str, zone: &str, name: &str) -> Result<()>;
    async fn list_machine_types(&self, project: &str, zone: &str) -> Result<Vec<GcpMachineType>>;
}

#[derive(Debug, Clone)]
pub struct GcpInstance {
    pub id: String,
    pub name: String,
    pub zone: String,
    pub machine_type: String,
    pub status: String,
    pub internal_ip: Option<String>,
    pub nat_ip: Option<String>,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl GcpInstance {
    fn into_record(self) -> InstanceRecord {
        InstanceRecord {
            id: self.id,
            name: self.name,
            provider: CloudProvider::Gcp,
            state: self.status,
            machine_type: self.machine_type,
            zone: self.zone,
            public_ip: self.nat_ip,
            private_ip: self.internal_ip,
            created_at: self.creation_timestamp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GcpLaunchConfig {
    pub name: String,
    pub machine_type: String,
    pub source_image: String,
    pub boot_disk_gb: u64,
    pub ssh_key: Option<String>,
    pub startup_script: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GcpMachineType {
    pub name: String,
    pub guest_cpus: u32,
    pub memory_mb: u64,
}

pub struct GcpAdapter {
    api: Arc<dyn GcpComputeApi>,
    credentials: CredentialResolver,
}

impl GcpAdapter {
    pub fn new(api: Arc<dyn GcpComputeApi>, credentials: CredentialResolver) -> Self {
        Self { api, credentials }
    }

    /// Lists instances in one zone, or across every zone when none is given.
    /// An unknown state filter yields an empty list, not an error.
    pub async fn list(&self, args: &GcpListArgs) -> Result<Vec<InstanceRecord>> {
        let creds = self.credentials.resolve(args.credentials.as_deref())?;
        let project = creds.project_id;

        let mut instances = Vec::new();
        match &args.zone {
            Some(zone) => instances.extend(self.api.list_instances(&project, zone).await?),
            None => {
                for zone in self.api.list_zones(&project).await? {
                    match self.api.list_instances(&project, &zone).await {
                        Ok(found) => instances.extend(found),
                        // Some zones may be unavailable; keep going.
                        Err(err) => warn!(%zone, error = %err, "skipping zone"),
                    }
                }
            }
        }

        let records = instances.into_iter().map(GcpInstance::into_record);
        Ok(match args.state.as_deref() {
            Some(state) => records
                .filter(|r| r.state.eq_ignore_ascii_case(state))
                .collect(),
            None => records.collect(),
        })
    }

    /// Machine types in the zone with at least the requested vCPUs and RAM.
    pub async fn find_machine_types(&self, args: &GcpFindArgs) -> Result<Vec<InstanceTypeRecord>> {
        let creds = self.credentials.resolve(args.credentials.as_deref())?;
        let types = self
            .api
            .list_machine_types(&creds.project_id, &args.zone)
            .await?;
        Ok(types
            .into_iter()
            .filter(|t| t.guest_cpus >= args.cpus && t.memory_mb >= u64::from(args.ram_gb) * 1024)
            .map(|t| InstanceTypeRecord {
                name: t.name,
                vcpus: t.guest_cpus,
                memory_gb: t.memory_mb as f64 / 1024.0,
            })
            .collect())
    }

    /// Creates an instance with the stock Debian boot disk and default
    /// network. Without an SSH key a password is configured via startup
    /// script and returned exactly once.
    pub async fn create(&self, spec: &GcpInstanceSpec) -> Result<CreatedInstance> {
        let creds = self.credentials.resolve(spec.credentials.as_deref())?;
        let project = creds.project_id;

        let mut password = None;
        let mut startup_script = None;
        if spec.ssh_key.is_none() {
            let pw = spec.password.clone().unwrap_or_else(password::generate);
            startup_script = Some(password::gcp_startup_script(&pw));
            password = Some(pw);
        }

        let config = GcpLaunchConfig {
            name: spec.name.clone(),
            machine_type: spec.machine_type.clone(),
            source_image: DEFAULT_SOURCE_IMAGE.to_string(),
            boot_disk_gb: DEFAULT_BOOT_DISK_GB,
            ssh_key: spec.ssh_key.clone(),
            startup_script,
        };

        info!(
            %project,
            zone = %spec.zone,
            name = %spec.name,
            machine_type = %spec.machine_type,
            "creating GCP instance"
        );
        let created = self.api.insert_instance(&project, &spec.zone, config).await?;

        // Re-fetch to pick up the NAT IP assigned once the insert settles.
        let record = match self
            .api
            .get_instance(&project, &spec.zone, &created.name)
            .await?
        {
            Some(current) => current.into_record(),
            None => created.into_record(),
        };

        Ok(CreatedInstance { record, password })
    }

    /// Deletes by name. With a zone the target must exist there; without one
    /// every zone is searched and an ambiguous name is rejected rather than
    /// resolved to an arbitrary match.
    pub async fn delete(&self, args: &GcpDeleteArgs) -> Result<DeletionReport> {
        let creds = self.credentials.resolve(args.credentials.as_deref())?;
        let project = creds.project_id;

        let zone = match &args.zone {
            Some(zone) => {
                if self
                    .api
                    .get_instance(&project, zone, &args.name)
                    .await?
                    .is_none()
                {
                    return Err(GatewayError::NotFound(format!(
                        "instance '{}' not found in zone {zone}",
                        args.name
                    )));
                }
                zone.clone()
            }
            None => self.locate_zone(&project, &args.name).await?,
        };

        info!(%project, %zone, name = %args.name, "deleting GCP instance");
        self.api.delete_instance(&project, &zone, &args.name).await?;
        Ok(DeletionReport {
            deleted: vec![args.name.clone()],
            zone: Some(zone),
        })
    }

    async fn locate_zone(&self, project: &str, name: &str) -> Result<String> {
        let mut matches = Vec::new();
        for zone in self.api.list_zones(project).await? {
            match self.api.get_instance(project, &zone, name).await {
                Ok(Some(_)) => matches.push(zone),
                Ok(None) => {}
                Err(err) => warn!(%zone, error = %err, "skipping zone in delete search"),
            }
        }
        match matches.len() {
            0 => Err(GatewayError::NotFound(format!(
                "instance '{name}' not found in any zone"
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(GatewayError::Validation(format!(
                "instance '{name}' exists in multiple zones ({}); pass an explicit zone",
                matches.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGcpApi;

    const CREDS: &str = r#"{"project_id": "demo-project"}"#;

    fn adapter() -> GcpAdapter {
        GcpAdapter::new(
            Arc::new(MemoryGcpApi::with_project("demo-project")),
            CredentialResolver::default(),
        )
    }

    fn spec(name: &str, zone: &str) -> GcpInstanceSpec {
        GcpInstanceSpec {
            credentials: Some(CREDS.into()),
            zone: zone.into(),
            name: name.into(),
            machine_type: "e2-medium".into(),
            ssh_key: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn create_generates_a_password_and_reports_public_ip() {
        let adapter = adapter();
        let created = adapter.create(&spec("demo", "europe-west1-b")).await.unwrap();
        assert_eq!(created.record.name, "demo");
        assert_eq!(created.record.zone, "europe-west1-b");
        assert!(created.record.public_ip.is_some());
        assert_eq!(created.password.as_ref().map(String::len), Some(16));
    }

    #[tokio::test]
    async fn create_with_ssh_key_skips_the_password() {
        let adapter = adapter();
        let mut spec = spec("keyed", "europe-west1-b");
        spec.ssh_key = Some("demo:ssh-rsa AAAA...".into());
        let created = adapter.create(&spec).await.unwrap();
        assert!(created.password.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_state_and_unknown_state_is_empty() {
        let adapter = adapter();
        adapter.create(&spec("node1", "europe-west1-b")).await.unwrap();

        let args = GcpListArgs {
            credentials: Some(CREDS.into()),
            zone: None,
            state: Some("running".into()),
        };
        assert_eq!(adapter.list(&args).await.unwrap().len(), 1);

        let args = GcpListArgs {
            credentials: Some(CREDS.into()),
            zone: None,
            state: Some("hibernating".into()),
        };
        assert!(adapter.list(&args).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cross_zone_delete_finds_a_unique_match() {
        let adapter = adapter();
        adapter.create(&spec("node1", "europe-west1-b")).await.unwrap();

        let report = adapter
            .delete(&GcpDeleteArgs {
                credentials: Some(CREDS.into()),
                name: "node1".into(),
                zone: None,
            })
            .await
            .unwrap();
        assert_eq!(report.deleted, vec!["node1".to_string()]);
        assert_eq!(report.zone.as_deref(), Some("europe-west1-b"));
    }

    #[tokio::test]
    async fn ambiguous_cross_zone_delete_is_rejected() {
        let adapter = adapter();
        adapter.create(&spec("node1", "europe-west1-b")).await.unwrap();
        adapter.create(&spec("node1", "us-central1-a")).await.unwrap();

        let err = adapter
            .delete(&GcpDeleteArgs {
                credentials: Some(CREDS.into()),
                name: "node1".into(),
                zone: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Validation");
        assert!(err.to_string().contains("europe-west1-b"));
        assert!(err.to_string().contains("us-central1-a"));
    }

    #[tokio::test]
    async fn delete_of_missing_instance_is_not_found() {
        let adapter = adapter();
        let err = adapter
            .delete(&GcpDeleteArgs {
                credentials: Some(CREDS.into()),
                name: "ghost".into(),
                zone: Some("europe-west1-b".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn find_machine_types_applies_minimums() {
        let adapter = adapter();
        let args = GcpFindArgs {
            credentials: Some(CREDS.into()),
            zone: "europe-west1-b".into(),
            cpus: 4,
            ram_gb: 8,
        };
        let types = adapter.find_machine_types(&args).await.unwrap();
        assert!(!types.is_empty());
        assert!(types.iter().all(|t| t.vcpus >= 4 && t.memory_gb >= 8.0));
    }

    #[tokio::test]
    async fn wrong_project_surfaces_as_provider_error() {
        let adapter = GcpAdapter::new(
            Arc::new(MemoryGcpApi::with_project("other-project")),
            CredentialResolver::default(),
        );
        let err = adapter.create(&spec("demo", "europe-west1-b")).await.unwrap_err();
        assert_eq!(err.kind(), "Provider");
    }
}
