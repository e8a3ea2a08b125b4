//! In-memory backends for both provider traits. They carry a small machine
//! type catalog and hand out fake IPs, which is enough for local development
//! and the gateway test suite.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use cloudgate_common::{CloudProvider, GatewayError, Result};

use crate::aws::{AwsInstance, AwsInstanceType, AwsLaunchConfig, Ec2Api};
use crate::gcp::{GcpComputeApi, GcpInstance, GcpLaunchConfig, GcpMachineType};

const DEFAULT_ZONES: &[&str] = &[
    "europe-west1-b",
    "europe-west1-c",
    "us-central1-a",
    "us-central1-b",
];

fn default_machine_types() -> Vec<GcpMachineType> {
    [
        ("e2-micro", 2, 1024),
        ("e2-small", 2, 2048),
        ("e2-medium", 2, 4096),
        ("n1-standard-1", 1, 3840),
        ("n1-standard-2", 2, 7680),
        ("n1-standard-4", 4, 15360),
        ("n2-standard-8", 8, 32768),
    ]
    .into_iter()
    .map(|(name, guest_cpus, memory_mb)| GcpMachineType {
        name: name.to_string(),
        guest_cpus,
        memory_mb,
    })
    .collect()
}

pub struct MemoryGcpApi {
    /// When set, calls for any other project are rejected.
    project: Option<String>,
    zones: Vec<String>,
    machine_types: Vec<GcpMachineType>,
    // Keyed by (zone, instance name).
    instances: DashMap<(String, String), GcpInstance>,
    counter: AtomicU64,
}

impl Default for MemoryGcpApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGcpApi {
    /// Backend that accepts any project id.
    pub fn new() -> Self {
        Self {
            project: None,
            zones: DEFAULT_ZONES.iter().map(|z| z.to_string()).collect(),
            machine_types: default_machine_types(),
            instances: DashMap::new(),
            counter: AtomicU64::new(1),
        }
    }

    pub fn with_project(project: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::new()
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn check_project(&self, project: &str) -> Result<()> {
        match &self.project {
            Some(expected) if expected != project => Err(GatewayError::provider(
                CloudProvider::Gcp,
                format!("project '{project}' not found"),
            )),
            _ => Ok(()),
        }
    }

    fn check_zone(&self, zone: &str) -> Result<()> {
        if self.zones.iter().any(|z| z == zone) {
            Ok(())
        } else {
            Err(GatewayError::provider(
                CloudProvider::Gcp,
                format!("zone '{zone}' is not available"),
            ))
        }
    }
}

#[async_trait]
impl GcpComputeApi for MemoryGcpApi {
    async fn list_zones(&self, project: &str) -> Result<Vec<String>> {
        self.check_project(project)?;
        Ok(self.zones.clone())
    }

    async fn list_instances(&self, project: &str, zone: &str) -> Result<Vec<GcpInstance>> {
        self.check_project(project)?;
        self.check_zone(zone)?;
        Ok(self
            .instances
            .iter()
            .filter(|entry| entry.key().0 == zone)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<Option<GcpInstance>> {
        self.check_project(project)?;
        self.check_zone(zone)?;
        Ok(self
            .instances
            .get(&(zone.to_string(), name.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        config: GcpLaunchConfig,
    ) -> Result<GcpInstance> {
        self.check_project(project)?;
        self.check_zone(zone)?;
        if !self.machine_types.iter().any(|t| t.name == config.machine_type) {
            return Err(GatewayError::provider(
                CloudProvider::Gcp,
                format!("invalid machine type '{}'", config.machine_type),
            ));
        }
        let key = (zone.to_string(), config.name.clone());
        if self.instances.contains_key(&key) {
            return Err(GatewayError::provider(
                CloudProvider::Gcp,
                format!("instance '{}' already exists in {zone}", config.name),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let instance = GcpInstance {
            id: format!("{:016}", 4_000_000_000_000_000u64 + n),
            name: config.name,
            zone: zone.to_string(),
            machine_type: config.machine_type,
            status: "RUNNING".to_string(),
            internal_ip: Some(format!("10.132.0.{}", n % 250 + 2)),
            nat_ip: Some(format!("34.76.{}.{}", n / 250 % 250, n % 250 + 1)),
            creation_timestamp: Some(Utc::now()),
        };
        self.instances.insert(key, instance.clone());
        Ok(instance)
    }

    async fn delete_instance(&self, project: &str, zone: &str, name: &str) -> Result<()> {
        self.check_project(project)?;
        self.check_zone(zone)?;
        self.instances
            .remove(&(zone.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| {
                GatewayError::NotFound(format!("instance '{name}' not found in zone {zone}"))
            })
    }

    async fn list_machine_types(&self, project: &str, zone: &str) -> Result<Vec<GcpMachineType>> {
        self.check_project(project)?;
        self.check_zone(zone)?;
        Ok(self.machine_types.clone())
    }
}

fn default_instance_types() -> Vec<AwsInstanceType> {
    [
        ("t3.micro", 2, 1024),
        ("t3.small", 2, 2048),
        ("t3.medium", 2, 4096),
        ("t3.large", 2, 8192),
        ("m5.large", 2, 8192),
        ("m5.xlarge", 4, 16384),
        ("c5.2xlarge", 8, 16384),
        ("r5.xlarge", 4, 32768),
    ]
    .into_iter()
    .map(|(name, default_vcpus, memory_mib)| AwsInstanceType {
        name: name.to_string(),
        default_vcpus,
        memory_mib,
    })
    .collect()
}

struct StoredEc2Instance {
    region: String,
    instance: AwsInstance,
}

pub struct MemoryEc2Api {
    instances: DashMap<String, StoredEc2Instance>,
    instance_types: Vec<AwsInstanceType>,
    counter: AtomicU64,
}

impl Default for MemoryEc2Api {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEc2Api {
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
            instance_types: default_instance_types(),
            counter: AtomicU64::new(1),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Seeds an instance directly, bypassing the adapter guard. Handy for
    /// populating a region with resources the gateway must not see.
    pub fn seed_instance(
        &self,
        region: &str,
        name_tag: Option<&str>,
        state: &str,
        instance_type: &str,
    ) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let instance_id = format!("i-0{n:016x}");
        let instance = AwsInstance {
            instance_id: instance_id.clone(),
            name_tag: name_tag.map(str::to_string),
            state: state.to_string(),
            instance_type: instance_type.to_string(),
            public_ip: Some(format!("54.244.{}.{}", n / 250 % 250, n % 250 + 1)),
            private_ip: Some(format!("172.31.{}.{}", n / 250 % 250, n % 250 + 1)),
            launch_time: Some(Utc::now()),
        };
        self.instances.insert(
            instance_id.clone(),
            StoredEc2Instance {
                region: region.to_string(),
                instance,
            },
        );
        instance_id
    }
}

fn pattern_matches(pattern: &str, name: Option<&str>) -> bool {
    let Some(name) = name else { return false };
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}

#[async_trait]
impl Ec2Api for MemoryEc2Api {
    async fn describe_instances(
        &self,
        region: &str,
        name_pattern: Option<&str>,
    ) -> Result<Vec<AwsInstance>> {
        Ok(self
            .instances
            .iter()
            .filter(|entry| entry.value().region == region)
            .filter(|entry| {
                name_pattern.map_or(true, |pattern| {
                    pattern_matches(pattern, entry.value().instance.name_tag.as_deref())
                })
            })
            .map(|entry| entry.value().instance.clone())
            .collect())
    }

    async fn describe_instance(
        &self,
        region: &str,
        instance_id: &str,
    ) -> Result<Option<AwsInstance>> {
        Ok(self
            .instances
            .get(instance_id)
            .filter(|entry| entry.value().region == region)
            .map(|entry| entry.value().instance.clone()))
    }

    async fn run_instance(&self, region: &str, config: AwsLaunchConfig) -> Result<AwsInstance> {
        if !self
            .instance_types
            .iter()
            .any(|t| t.name == config.instance_type)
        {
            return Err(GatewayError::provider(
                CloudProvider::Aws,
                format!("invalid instance type '{}'", config.instance_type),
            ));
        }
        let id = self.seed_instance(region, Some(&config.name_tag), "running", &config.instance_type);
        self.describe_instance(region, &id)
            .await?
            .ok_or_else(|| GatewayError::Internal("instance vanished after launch".into()))
    }

    async fn terminate_instances(
        &self,
        region: &str,
        instance_ids: &[String],
    ) -> Result<Vec<String>> {
        let mut terminated = Vec::new();
        for id in instance_ids {
            let found = self
                .instances
                .remove_if(id, |_, stored| stored.region == region);
            match found {
                Some(_) => terminated.push(id.clone()),
                None => {
                    return Err(GatewayError::NotFound(format!("instance {id} not found")));
                }
            }
        }
        Ok(terminated)
    }

    async fn describe_instance_types(&self, _region: &str) -> Result<Vec<AwsInstanceType>> {
        Ok(self.instance_types.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn regions_are_isolated() {
        let api = MemoryEc2Api::new();
        api.seed_instance("us-west-2", Some("t3-a"), "running", "t3.micro");
        api.seed_instance("eu-west-1", Some("t3-b"), "running", "t3.micro");

        let west = api.describe_instances("us-west-2", None).await.unwrap();
        assert_eq!(west.len(), 1);
        assert_eq!(west[0].name_tag.as_deref(), Some("t3-a"));
    }

    #[tokio::test]
    async fn name_patterns_support_prefix_and_exact() {
        let api = MemoryEc2Api::new();
        api.seed_instance("us-west-2", Some("t3-api-1"), "running", "t3.micro");
        api.seed_instance("us-west-2", Some("t3-api-2"), "running", "t3.micro");

        let exact = api
            .describe_instances("us-west-2", Some("t3-api-1"))
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let prefixed = api
            .describe_instances("us-west-2", Some("t3-api*"))
            .await
            .unwrap();
        assert_eq!(prefixed.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_gcp_names_per_zone_are_rejected() {
        let api = MemoryGcpApi::new();
        let config = GcpLaunchConfig {
            name: "node1".into(),
            machine_type: "e2-medium".into(),
            source_image: crate::gcp::DEFAULT_SOURCE_IMAGE.into(),
            boot_disk_gb: 10,
            ssh_key: None,
            startup_script: None,
        };
        api.insert_instance("p", "europe-west1-b", config.clone())
            .await
            .unwrap();
        let err = api
            .insert_instance("p", "europe-west1-b", config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Provider");
    }

    #[tokio::test]
    async fn unknown_gcp_zone_errors() {
        let api = MemoryGcpApi::new();
        let err = api.list_instances("p", "mars-north-1").await.unwrap_err();
        assert_eq!(err.kind(), "Provider");
    }
}
