use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    verify_signatures: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub request_signing: HealthCheck,
    pub checked_at: String,
}

pub fn router(verify_signatures: bool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { verify_signatures })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let request_signing = if state.verify_signatures {
        HealthCheck { status: "ready", detail: "slack request signatures enforced".to_string() }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "slack request signatures are not checked".to_string(),
        }
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: concat!("eventlink-server ", env!("CARGO_PKG_VERSION")).to_string(),
        },
        request_signing,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use tower::ServiceExt;

    use crate::health::{health, router, HealthState};

    #[tokio::test]
    async fn health_reports_ready_with_signing_enforced() {
        let (status, Json(payload)) = health(State(HealthState { verify_signatures: true })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.request_signing.status, "ready");
    }

    #[tokio::test]
    async fn health_flags_disabled_signature_checks() {
        let (status, Json(payload)) = health(State(HealthState { verify_signatures: false })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.request_signing.status, "disabled");
    }

    #[tokio::test]
    async fn health_route_serves_json() {
        let response = router(true)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(value["status"], "ready");
    }
}
