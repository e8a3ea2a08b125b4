//! HTTP mapping for the gateway error taxonomy. Every failure body carries
//! the same envelope: `{"success": false, "error": <kind>, "message": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use cloudgate_common::GatewayError;

pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Authentication(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Provider { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Config(_) | GatewayError::Io(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = json!({
            "success": false,
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (GatewayError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                GatewayError::Authentication("no creds".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (GatewayError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                GatewayError::provider(cloudgate_common::CloudProvider::Aws, "boom"),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GatewayError::Internal("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
