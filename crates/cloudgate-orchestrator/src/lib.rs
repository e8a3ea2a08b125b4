//! Combined orchestrator: fans one logical request out to both provider
//! adapters as independently spawned tasks, captures each outcome, and never
//! lets one provider's failure abort the other's execution.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, instrument};

use cloudgate_common::{
    AwsFindArgs, AwsInstanceSpec, AwsListArgs, CloudProvider, CombinedDeleteRequest,
    CombinedRequest, CombinedResult, CreatedInstance, DeletionReport, GatewayError, GcpFindArgs,
    GcpInstanceSpec, GcpListArgs, InstanceRecord, InstanceTypeRecord, ProviderOutcome, Result,
};
use cloudgate_providers::{AwsAdapter, GcpAdapter};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Orchestrator {
    gcp: Arc<GcpAdapter>,
    aws: Arc<AwsAdapter>,
    call_timeout: Duration,
}

impl Orchestrator {
    pub fn new(gcp: Arc<GcpAdapter>, aws: Arc<AwsAdapter>) -> Self {
        Self {
            gcp,
            aws,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Spawns a provider call on its own task with the configured timeout.
    /// Expiry becomes a provider error for that slot only.
    fn spawn_slot<T, F>(&self, provider: CloudProvider, fut: F) -> JoinHandle<Result<T>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let timeout = self.call_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::provider(
                    provider,
                    format!("call timed out after {}ms", timeout.as_millis()),
                )),
            }
        })
    }

    #[instrument(skip_all)]
    pub async fn create_all(
        &self,
        req: CombinedRequest<GcpInstanceSpec, AwsInstanceSpec>,
    ) -> CombinedResult<CreatedInstance, CreatedInstance> {
        let gcp_task = req.gcp.map(|spec| {
            let gcp = Arc::clone(&self.gcp);
            self.spawn_slot(CloudProvider::Gcp, async move { gcp.create(&spec).await })
        });
        let aws_task = req.aws.map(|spec| {
            let aws = Arc::clone(&self.aws);
            self.spawn_slot(CloudProvider::Aws, async move { aws.create(&spec).await })
        });
        join_slots(gcp_task, aws_task).await
    }

    #[instrument(skip_all)]
    pub async fn list_all(
        &self,
        req: CombinedRequest<GcpListArgs, AwsListArgs>,
    ) -> CombinedResult<Vec<InstanceRecord>, Vec<InstanceRecord>> {
        let gcp_task = req.gcp.map(|args| {
            let gcp = Arc::clone(&self.gcp);
            self.spawn_slot(CloudProvider::Gcp, async move { gcp.list(&args).await })
        });
        let aws_task = req.aws.map(|args| {
            let aws = Arc::clone(&self.aws);
            self.spawn_slot(CloudProvider::Aws, async move { aws.list(&args).await })
        });
        join_slots(gcp_task, aws_task).await
    }

    /// Each provider keeps its native find semantics: machine types for GCP,
    /// name search under the guard prefix for AWS.
    #[instrument(skip_all)]
    pub async fn find_all(
        &self,
        req: CombinedRequest<GcpFindArgs, AwsFindArgs>,
    ) -> CombinedResult<Vec<InstanceTypeRecord>, Vec<InstanceRecord>> {
        let gcp_task = req.gcp.map(|args| {
            let gcp = Arc::clone(&self.gcp);
            self.spawn_slot(CloudProvider::Gcp, async move {
                gcp.find_machine_types(&args).await
            })
        });
        let aws_task = req.aws.map(|args| {
            let aws = Arc::clone(&self.aws);
            self.spawn_slot(CloudProvider::Aws, async move { aws.find(&args).await })
        });
        join_slots(gcp_task, aws_task).await
    }

    /// Destructive on two providers at once; rejected without explicit
    /// confirmation, before any provider call is made.
    #[instrument(skip_all)]
    pub async fn delete_all(
        &self,
        req: CombinedDeleteRequest,
    ) -> Result<CombinedResult<DeletionReport, DeletionReport>> {
        if !req.confirm {
            return Err(GatewayError::Validation(
                "combined delete is destructive; set confirm=true to proceed".into(),
            ));
        }
        let gcp_task = req.gcp.map(|args| {
            let gcp = Arc::clone(&self.gcp);
            self.spawn_slot(CloudProvider::Gcp, async move { gcp.delete(&args).await })
        });
        let aws_task = req.aws.map(|args| {
            let aws = Arc::clone(&self.aws);
            self.spawn_slot(CloudProvider::Aws, async move { aws.delete(&args).await })
        });
        Ok(join_slots(gcp_task, aws_task).await)
    }
}

async fn join_slots<G, A>(
    gcp: Option<JoinHandle<Result<G>>>,
    aws: Option<JoinHandle<Result<A>>>,
) -> CombinedResult<G, A> {
    CombinedResult {
        gcp: join_slot(CloudProvider::Gcp, gcp).await,
        aws: join_slot(CloudProvider::Aws, aws).await,
    }
}

async fn join_slot<T>(
    provider: CloudProvider,
    handle: Option<JoinHandle<Result<T>>>,
) -> Option<ProviderOutcome<T>> {
    let handle = handle?;
    let result = match handle.await {
        Ok(result) => result,
        Err(err) => {
            error!(%provider, error = %err, "provider task aborted");
            Err(GatewayError::provider(provider, "provider task aborted"))
        }
    };
    Some(ProviderOutcome::from_result(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cloudgate_common::{AwsDeleteArgs, GcpDeleteArgs, NameGuard};
    use cloudgate_providers::gcp::{GcpInstance, GcpLaunchConfig, GcpMachineType};
    use cloudgate_providers::{
        CredentialResolver, GcpComputeApi, MemoryEc2Api, MemoryGcpApi,
    };

    const CREDS: &str = r#"{"project_id": "demo-project"}"#;

    fn gcp_spec(name: &str) -> GcpInstanceSpec {
        GcpInstanceSpec {
            credentials: Some(CREDS.into()),
            zone: "europe-west1-b".into(),
            name: name.into(),
            machine_type: "e2-medium".into(),
            ssh_key: None,
            password: None,
        }
    }

    fn aws_spec(name: &str) -> AwsInstanceSpec {
        AwsInstanceSpec {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn orchestrator_over(
        gcp_api: Arc<dyn GcpComputeApi>,
        ec2: Arc<MemoryEc2Api>,
    ) -> Orchestrator {
        let gcp = Arc::new(GcpAdapter::new(gcp_api, CredentialResolver::default()));
        let aws = Arc::new(AwsAdapter::new(
            ec2,
            NameGuard::default(),
            Some("us-west-2".into()),
        ));
        Orchestrator::new(gcp, aws)
    }

    #[tokio::test]
    async fn absent_section_skips_the_provider() {
        let ec2 = Arc::new(MemoryEc2Api::new());
        let orchestrator = orchestrator_over(Arc::new(MemoryGcpApi::new()), Arc::clone(&ec2));

        let result = orchestrator
            .create_all(CombinedRequest {
                gcp: Some(gcp_spec("demo")),
                aws: None,
            })
            .await;

        let gcp = result.gcp.expect("gcp slot should be present");
        assert!(gcp.success);
        assert!(result.aws.is_none());
        // No AWS call was attempted.
        assert_eq!(ec2.instance_count(), 0);
    }

    #[tokio::test]
    async fn one_provider_failing_does_not_abort_the_other() {
        let ec2 = Arc::new(MemoryEc2Api::new());
        let orchestrator = orchestrator_over(Arc::new(MemoryGcpApi::new()), Arc::clone(&ec2));

        // No credentials anywhere: the GCP slot fails authentication while
        // the AWS slot proceeds.
        let mut bad_gcp = gcp_spec("demo");
        bad_gcp.credentials = None;

        let result = orchestrator
            .create_all(CombinedRequest {
                gcp: Some(bad_gcp),
                aws: Some(aws_spec("worker")),
            })
            .await;

        let gcp = result.gcp.as_ref().expect("gcp slot");
        assert!(!gcp.success);
        assert_eq!(gcp.error.as_ref().map(|e| e.kind.as_str()), Some("Authentication"));

        let aws = result.aws.as_ref().expect("aws slot");
        assert!(aws.success);
        assert_eq!(
            aws.result.as_ref().map(|c| c.record.name.as_str()),
            Some("t3-worker")
        );
        assert!(result.is_partial());
        assert!(!result.all_succeeded());
    }

    struct StalledGcpApi;

    #[async_trait]
    impl GcpComputeApi for StalledGcpApi {
        async fn list_zones(&self, _project: &str) -> Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
        async fn list_instances(&self, _: &str, _: &str) -> Result<Vec<GcpInstance>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
        async fn get_instance(&self, _: &str, _: &str, _: &str) -> Result<Option<GcpInstance>> {
            Ok(None)
        }
        async fn insert_instance(
            &self,
            _: &str,
            _: &str,
            _: GcpLaunchConfig,
        ) -> Result<GcpInstance> {
            unreachable!("not used in timeout test")
        }
        async fn delete_instance(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn list_machine_types(&self, _: &str, _: &str) -> Result<Vec<GcpMachineType>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_in_its_slot_only() {
        let ec2 = Arc::new(MemoryEc2Api::new());
        ec2.seed_instance("us-west-2", Some("t3-up"), "running", "t3.micro");

        let orchestrator = orchestrator_over(Arc::new(StalledGcpApi), Arc::clone(&ec2))
            .with_call_timeout(Duration::from_millis(50));

        let result = orchestrator
            .list_all(CombinedRequest {
                gcp: Some(GcpListArgs {
                    credentials: Some(CREDS.into()),
                    ..Default::default()
                }),
                aws: Some(AwsListArgs::default()),
            })
            .await;

        let gcp = result.gcp.expect("gcp slot");
        assert!(!gcp.success);
        let error = gcp.error.expect("timeout error");
        assert_eq!(error.kind, "Provider");
        assert!(error.message.contains("timed out"));

        let aws = result.aws.expect("aws slot");
        assert!(aws.success);
        assert_eq!(aws.result.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn delete_all_requires_confirmation() {
        let ec2 = Arc::new(MemoryEc2Api::new());
        let id = ec2.seed_instance("us-west-2", Some("t3-keep"), "running", "t3.micro");
        let orchestrator = orchestrator_over(Arc::new(MemoryGcpApi::new()), Arc::clone(&ec2));

        let err = orchestrator
            .delete_all(CombinedDeleteRequest {
                confirm: false,
                gcp: None,
                aws: Some(AwsDeleteArgs {
                    instance_id: Some(id),
                    ..Default::default()
                }),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Validation");
        assert_eq!(ec2.instance_count(), 1);
    }

    #[tokio::test]
    async fn confirmed_delete_all_reports_both_slots() {
        let ec2 = Arc::new(MemoryEc2Api::new());
        let id = ec2.seed_instance("us-west-2", Some("t3-old"), "running", "t3.micro");

        let gcp_api = Arc::new(MemoryGcpApi::new());
        let orchestrator = orchestrator_over(gcp_api, Arc::clone(&ec2));

        let result = orchestrator
            .delete_all(CombinedDeleteRequest {
                confirm: true,
                gcp: Some(GcpDeleteArgs {
                    credentials: Some(CREDS.into()),
                    name: "ghost".into(),
                    zone: Some("europe-west1-b".into()),
                }),
                aws: Some(AwsDeleteArgs {
                    instance_id: Some(id),
                    ..Default::default()
                }),
            })
            .await
            .unwrap();

        // GCP target never existed; AWS target is gone. Partial success.
        assert_eq!(
            result.gcp.as_ref().and_then(|o| o.error.as_ref()).map(|e| e.kind.as_str()),
            Some("NotFound")
        );
        assert!(result.aws.as_ref().map_or(false, |o| o.success));
        assert!(result.is_partial());
        assert_eq!(ec2.instance_count(), 0);
    }
}
