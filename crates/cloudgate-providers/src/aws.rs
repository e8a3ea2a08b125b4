//! AWS adapter. Every operation runs behind the [`NameGuard`]: instances
//! whose Name tag does not carry the configured prefix are invisible through
//! this API and can never be mutated by it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use cloudgate_common::{
    AwsDeleteArgs, AwsFindArgs, AwsInstanceSpec, AwsListArgs, AwsTypeFilter, CloudProvider,
    CreatedInstance, DeletionReport, GatewayError, InstanceRecord, InstanceTypeRecord, NameGuard,
    Result,
};

use crate::password;

pub const DEFAULT_IMAGE_ID: &str = "ami-03c1f788292172a4e";
pub const DEFAULT_INSTANCE_TYPE: &str = "t3.micro";
/// DescribeInstanceTypes can return hundreds of types; cap catalog queries.
pub const MAX_TYPE_RESULTS: usize = 500;

/// Raw EC2 surface the adapter drives. `name_pattern` is either an exact tag
/// value or a prefix ending in `*`.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    async fn describe_instances(
        &self,
        region: &str,
        name_pattern: Option<&str>,
    ) -> Result<Vec<AwsInstance>>;
    async fn describe_instance(&self, region: &str, instance_id: &str)
        -> Result<Option<AwsInstance>>;
    async fn run_instance(&self, region: &str, config: AwsLaunchConfig) -> Result<AwsInstance>;
    async fn terminate_instances(&self, region: &str, instance_ids: &[String])
        -> Result<Vec<String>>;
    async fn describe_instance_types(&self, region: &str) -> Result<Vec<AwsInstanceType>>;
}

#[derive(Debug, Clone)]
pub struct AwsInstance {
    pub instance_id: String,
    pub name_tag: Option<String>,
    pub state: String,
    pub instance_type: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub launch_time: Option<DateTime<Utc>>,
}

impl AwsInstance {
    fn into_record(self, region: &str) -> InstanceRecord {
        InstanceRecord {
            name: self.name_tag.unwrap_or_else(|| self.instance_id.clone()),
            id: self.instance_id,
            provider: CloudProvider::Aws,
            state: self.state,
            machine_type: self.instance_type,
            zone: region.to_string(),
            public_ip: self.public_ip,
            private_ip: self.private_ip,
            created_at: self.launch_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AwsLaunchConfig {
    pub image_id: String,
    pub instance_type: String,
    pub name_tag: String,
    pub key_name: Option<String>,
    pub user_data: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AwsInstanceType {
    pub name: String,
    pub default_vcpus: u32,
    pub memory_mib: u64,
}

pub struct AwsAdapter {
    api: Arc<dyn Ec2Api>,
    guard: NameGuard,
    default_region: Option<String>,
}

impl AwsAdapter {
    pub fn new(api: Arc<dyn Ec2Api>, guard: NameGuard, default_region: Option<String>) -> Self {
        Self {
            api,
            guard,
            default_region,
        }
    }

    fn region<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        requested
            .or(self.default_region.as_deref())
            .ok_or_else(|| {
                GatewayError::Validation(
                    "region is required and no default region is configured".into(),
                )
            })
    }

    fn filter_records(
        &self,
        instances: Vec<AwsInstance>,
        region: &str,
        state: Option<&str>,
    ) -> Vec<InstanceRecord> {
        instances
            .into_iter()
            .filter(|i| self.guard.matches_tag(i.name_tag.as_deref()))
            .filter(|i| state.map_or(true, |s| i.state.eq_ignore_ascii_case(s)))
            .map(|i| i.into_record(region))
            .collect()
    }

    /// Only guard-matching instances are returned. An unknown state filter
    /// yields an empty list.
    pub async fn list(&self, args: &AwsListArgs) -> Result<Vec<InstanceRecord>> {
        let region = self.region(args.region.as_deref())?;
        let instances = self.api.describe_instances(region, None).await?;
        Ok(self.filter_records(instances, region, args.state.as_deref()))
    }

    /// Prefix search under the qualified name; without a name this is `list`.
    pub async fn find(&self, args: &AwsFindArgs) -> Result<Vec<InstanceRecord>> {
        let region = self.region(args.region.as_deref())?;
        let instances = match args.name.as_deref() {
            Some(name) => {
                let pattern = format!("{}*", self.guard.qualify(name));
                self.api.describe_instances(region, Some(&pattern)).await?
            }
            None => self.api.describe_instances(region, None).await?,
        };
        Ok(self.filter_records(instances, region, None))
    }

    pub async fn find_instance_types(
        &self,
        filter: &AwsTypeFilter,
    ) -> Result<Vec<InstanceTypeRecord>> {
        let region = self.region(filter.region.as_deref())?;
        let types = self.api.describe_instance_types(region).await?;
        Ok(types
            .into_iter()
            .filter(|t| {
                t.default_vcpus >= filter.min_vcpus
                    && t.memory_mib as f64 / 1024.0 >= filter.min_memory_gb
            })
            .map(|t| InstanceTypeRecord {
                vcpus: t.default_vcpus,
                memory_gb: (t.memory_mib as f64 / 1024.0 * 100.0).round() / 100.0,
                name: t.name,
            })
            .take(MAX_TYPE_RESULTS)
            .collect())
    }

    /// Launches an instance whose Name tag always carries the guard prefix;
    /// a missing name gets a generated one. Without a key pair a password is
    /// configured through user data and returned exactly once.
    pub async fn create(&self, spec: &AwsInstanceSpec) -> Result<CreatedInstance> {
        let region = self.region(spec.region.as_deref())?;

        let name_tag = match spec.name.as_deref() {
            Some(name) => self.guard.qualify(name),
            None => {
                let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
                self.guard.qualify(&suffix)
            }
        };

        let mut password = None;
        let mut user_data = None;
        if spec.key_name.is_none() {
            let pw = spec.password.clone().unwrap_or_else(password::generate);
            user_data = Some(password::aws_user_data(&pw));
            password = Some(pw);
        }

        let config = AwsLaunchConfig {
            image_id: spec
                .image_id
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_ID.to_string()),
            instance_type: spec
                .instance_type
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string()),
            name_tag,
            key_name: spec.key_name.clone(),
            user_data,
        };

        info!(
            %region,
            name = %config.name_tag,
            instance_type = %config.instance_type,
            "launching EC2 instance"
        );
        let instance = self.api.run_instance(region, config).await?;
        Ok(CreatedInstance {
            record: instance.into_record(region),
            password,
        })
    }

    /// Terminates by id (preferred) or by exact qualified name. A gone id is
    /// `NotFound`, so repeated deletes are idempotent; an ambiguous name is
    /// rejected rather than resolved to an arbitrary match.
    pub async fn delete(&self, args: &AwsDeleteArgs) -> Result<DeletionReport> {
        let region = self.region(args.region.as_deref())?;

        let instance_id = match (&args.instance_id, &args.name) {
            (Some(id), _) => {
                let instance = self
                    .api
                    .describe_instance(region, id)
                    .await?
                    .ok_or_else(|| GatewayError::NotFound(format!("instance {id} not found")))?;
                if !self.guard.matches_tag(instance.name_tag.as_deref()) {
                    // Guarded-out instances are invisible through this API.
                    return Err(GatewayError::NotFound(format!("instance {id} not found")));
                }
                id.clone()
            }
            (None, Some(name)) => self.resolve_by_name(region, name).await?,
            (None, None) => {
                return Err(GatewayError::Validation(
                    "either instance_id or name is required".into(),
                ))
            }
        };

        info!(%region, %instance_id, "terminating EC2 instance");
        let deleted = self
            .api
            .terminate_instances(region, std::slice::from_ref(&instance_id))
            .await?;
        Ok(DeletionReport {
            deleted,
            zone: None,
        })
    }

    async fn resolve_by_name(&self, region: &str, name: &str) -> Result<String> {
        let target = self.guard.qualify(name);
        let mut matches: Vec<AwsInstance> = self
            .api
            .describe_instances(region, Some(&target))
            .await?
            .into_iter()
            .filter(|i| i.name_tag.as_deref() == Some(target.as_str()))
            .filter(|i| !i.state.eq_ignore_ascii_case("terminated"))
            .collect();

        match matches.len() {
            0 => Err(GatewayError::NotFound(format!(
                "no instance with Name={target} found"
            ))),
            1 => Ok(matches.swap_remove(0).instance_id),
            _ => {
                let ids: Vec<String> = matches.iter().map(|i| i.instance_id.clone()).collect();
                Err(GatewayError::Validation(format!(
                    "name '{target}' matches multiple instances ({}); pass instance_id",
                    ids.join(", ")
                )))
            }
        }
    }
}
