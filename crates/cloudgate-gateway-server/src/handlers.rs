//! Route handlers. Success bodies carry `success: true` next to the payload;
//! failures go through [`ApiError`](crate::error::ApiError) and share the
//! `{success, error, message}` envelope.
//!
//! The `/all/*` handlers answer 200 whenever the request envelope itself was
//! valid: per-provider failures live inside the result slots, with a
//! top-level `success` reflecting whether every attempted provider made it.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use cloudgate_common::{
    AwsDeleteArgs, AwsFindArgs, AwsInstanceSpec, AwsListArgs, AwsTypeFilter,
    CombinedDeleteRequest, CombinedRequest, CombinedResult, CreatedInstance, DeletionReport,
    GatewayError, GcpDeleteArgs, GcpFindArgs, GcpInstanceSpec, GcpListArgs, InstanceRecord,
    InstanceTypeRecord,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::AppState;

type ApiResult = Result<Json<Value>, ApiError>;

fn instances_body(records: Vec<InstanceRecord>) -> Json<Value> {
    Json(json!({
        "success": true,
        "count": records.len(),
        "instances": records,
    }))
}

fn types_body(types: Vec<InstanceTypeRecord>) -> Json<Value> {
    Json(json!({
        "success": true,
        "count": types.len(),
        "instance_types": types,
    }))
}

fn deletion_body(report: DeletionReport) -> Json<Value> {
    Json(json!({
        "success": true,
        "deleted": report.deleted,
        "zone": report.zone,
    }))
}

/// Flattens the created record next to `success` and, when one was set up,
/// the password. This response is the only place the password ever appears.
fn created_body(created: CreatedInstance) -> ApiResult {
    merge_success(serde_json::to_value(&created), Value::Bool(true))
}

fn combined_body<G: Serialize, A: Serialize>(result: CombinedResult<G, A>) -> ApiResult {
    let success = result.all_succeeded();
    let partial = result.is_partial();
    let mut body = merge_success(serde_json::to_value(&result), Value::Bool(success))?;
    if let Value::Object(map) = &mut body.0 {
        map.insert("partial".to_string(), Value::Bool(partial));
    }
    Ok(body)
}

fn merge_success(
    value: serde_json::Result<Value>,
    success: Value,
) -> ApiResult {
    let mut value = value.map_err(|err| GatewayError::Internal(err.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert("success".to_string(), success);
    }
    Ok(Json(value))
}

// --- GCP ---

pub async fn gcp_list(
    State(state): State<AppState>,
    ApiQuery(args): ApiQuery<GcpListArgs>,
) -> ApiResult {
    Ok(instances_body(state.gcp.list(&args).await?))
}

pub async fn gcp_find(
    State(state): State<AppState>,
    ApiJson(args): ApiJson<GcpFindArgs>,
) -> ApiResult {
    Ok(types_body(state.gcp.find_machine_types(&args).await?))
}

pub async fn gcp_create(
    State(state): State<AppState>,
    ApiJson(spec): ApiJson<GcpInstanceSpec>,
) -> ApiResult {
    created_body(state.gcp.create(&spec).await?)
}

pub async fn gcp_delete(
    State(state): State<AppState>,
    ApiJson(args): ApiJson<GcpDeleteArgs>,
) -> ApiResult {
    Ok(deletion_body(state.gcp.delete(&args).await?))
}

pub async fn gcp_instance_types(
    State(state): State<AppState>,
    ApiQuery(args): ApiQuery<GcpFindArgs>,
) -> ApiResult {
    Ok(types_body(state.gcp.find_machine_types(&args).await?))
}

// --- AWS ---

pub async fn aws_list(
    State(state): State<AppState>,
    ApiQuery(args): ApiQuery<AwsListArgs>,
) -> ApiResult {
    Ok(instances_body(state.aws.list(&args).await?))
}

pub async fn aws_find(
    State(state): State<AppState>,
    ApiJson(args): ApiJson<AwsFindArgs>,
) -> ApiResult {
    Ok(instances_body(state.aws.find(&args).await?))
}

pub async fn aws_create(
    State(state): State<AppState>,
    ApiJson(spec): ApiJson<AwsInstanceSpec>,
) -> ApiResult {
    created_body(state.aws.create(&spec).await?)
}

pub async fn aws_delete(
    State(state): State<AppState>,
    ApiJson(args): ApiJson<AwsDeleteArgs>,
) -> ApiResult {
    Ok(deletion_body(state.aws.delete(&args).await?))
}

pub async fn aws_instance_types(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AwsTypeFilter>,
) -> ApiResult {
    Ok(types_body(state.aws.find_instance_types(&filter).await?))
}

// --- Combined ---

pub async fn all_list(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CombinedRequest<GcpListArgs, AwsListArgs>>,
) -> ApiResult {
    combined_body(state.orchestrator.list_all(req).await)
}

pub async fn all_find(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CombinedRequest<GcpFindArgs, AwsFindArgs>>,
) -> ApiResult {
    combined_body(state.orchestrator.find_all(req).await)
}

pub async fn all_create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CombinedRequest<GcpInstanceSpec, AwsInstanceSpec>>,
) -> ApiResult {
    combined_body(state.orchestrator.create_all(req).await)
}

pub async fn all_delete(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CombinedDeleteRequest>,
) -> ApiResult {
    combined_body(state.orchestrator.delete_all(req).await?)
}

// --- Health ---

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "providers": { "gcp": "ready", "aws": "ready" },
    }))
}
