use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use application::dispatch_service::{ActionError, ActionErrorKind};

/// Transport wrapper for dispatch errors.
///
/// The body is the dispatcher's `{detail, err?, status?}` record; only the
/// HTTP status is decided here, from the error's kind.
#[derive(Debug)]
pub struct ApiError(pub ActionError);

impl From<ActionError> for ApiError {
    fn from(e: ActionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ActionErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ActionErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ActionErrorKind::Queue => StatusCode::SERVICE_UNAVAILABLE,
            ActionErrorKind::Config | ActionErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::vendor::error::GatewayError;
    use http_body_util::BodyExt;

    async fn response_body(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bad_request_maps_to_400_with_detail() {
        let err = ApiError(ActionError {
            detail: "Unknown action: explode".to_string(),
            err: None,
            status: None,
            kind: ActionErrorKind::BadRequest,
        });
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = response_body(resp).await;
        assert_eq!(body["detail"], "Unknown action: explode");
        assert!(body.get("status").is_none());
        assert!(body.get("err").is_none());
    }

    #[tokio::test]
    async fn upstream_error_maps_to_502_and_carries_status() {
        let err = ApiError(ActionError::from(GatewayError::Upstream {
            status: 503,
            body: "vendor down".to_string(),
        }));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body = response_body(resp).await;
        assert_eq!(body["status"], 503);
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .contains("vendor returned HTTP 503")
        );
    }

    #[tokio::test]
    async fn queue_discards_map_to_503() {
        for gateway_err in [GatewayError::QueueFull, GatewayError::QueueTimeout] {
            let resp = ApiError(ActionError::from(gateway_err)).into_response();
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn credential_failure_maps_to_500() {
        let resp = ApiError(ActionError::from(GatewayError::Credentials(
            "token endpoint returned HTTP 400".to_string(),
        )))
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
