//! HTTP gateway for cloud instance lifecycle operations.
//!
//! One axum router exposes list/find/create/delete per provider plus the
//! combined `/all/*` fan-out. The provider backends arrive as trait objects,
//! so the same router serves the in-memory backends in tests and development
//! and SDK-backed clients in a real deployment.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cloudgate_orchestrator::Orchestrator;
use cloudgate_providers::{
    AwsAdapter, CredentialResolver, Ec2Api, GcpAdapter, GcpComputeApi,
};

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;

use config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub gcp: Arc<GcpAdapter>,
    pub aws: Arc<AwsAdapter>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(
        config: &GatewayConfig,
        gcp_api: Arc<dyn GcpComputeApi>,
        ec2_api: Arc<dyn Ec2Api>,
    ) -> Self {
        let resolver = CredentialResolver::new(config.gcp_credentials.clone());
        let gcp = Arc::new(GcpAdapter::new(gcp_api, resolver));
        let aws = Arc::new(AwsAdapter::new(
            ec2_api,
            config.name_guard(),
            config.aws_region.clone(),
        ));
        let orchestrator = Arc::new(
            Orchestrator::new(Arc::clone(&gcp), Arc::clone(&aws))
                .with_call_timeout(config.provider_timeout),
        );
        Self {
            gcp,
            aws,
            orchestrator,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // GCP lifecycle (the unprefixed legacy surface)
        .route("/list", get(handlers::gcp_list))
        .route("/find", post(handlers::gcp_find))
        .route("/create", post(handlers::gcp_create))
        .route("/delete", post(handlers::gcp_delete))
        // AWS lifecycle
        .route("/aws/list", get(handlers::aws_list))
        .route("/aws/find", post(handlers::aws_find))
        .route("/aws/create", post(handlers::aws_create))
        .route("/aws/delete", post(handlers::aws_delete))
        // Combined fan-out across both providers
        .route("/all/list", post(handlers::all_list))
        .route("/all/find", post(handlers::all_find))
        .route("/all/create", post(handlers::all_create))
        .route("/all/delete", post(handlers::all_delete))
        // Catalog queries
        .route("/instance-types/gcp", get(handlers::gcp_instance_types))
        .route("/instance-types/aws", get(handlers::aws_instance_types))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
