use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use eventlink_slack::{
    events::{parse_webhook_body, EventContext, EventDispatcher, SlackEvent},
    signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const EVENTS_PATH: &str = "/slack/events";

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<EventDispatcher>,
    /// `None` disables signature checks.
    pub verifier: Option<Arc<SignatureVerifier>>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route(EVENTS_PATH, post(receive)).with_state(state)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Single entry point for Events API deliveries and interactivity callbacks.
/// Everything that passes signature checks is acknowledged with 200 so Slack does not retry.
pub async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = EventContext { correlation_id: Uuid::new_v4().to_string() };

    if let Some(verifier) = &state.verifier {
        let verified = verifier.verify(
            header_str(&headers, TIMESTAMP_HEADER),
            header_str(&headers, SIGNATURE_HEADER),
            &body,
            Utc::now().timestamp(),
        );
        if let Err(error) = verified {
            warn!(
                event_name = "ingress.slack.signature_rejected",
                correlation_id = %ctx.correlation_id,
                error = %error,
                "rejected unsigned or mis-signed request"
            );
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str());
    let event = match parse_webhook_body(content_type, &body) {
        Ok(event) => event,
        Err(error) => {
            warn!(
                event_name = "ingress.slack.payload_malformed",
                correlation_id = %ctx.correlation_id,
                error = %error,
                body_len = body.len(),
                "acknowledging malformed payload without processing"
            );
            return StatusCode::OK.into_response();
        }
    };

    if let SlackEvent::UrlVerification { challenge } = event {
        info!(
            event_name = "ingress.slack.url_verification",
            correlation_id = %ctx.correlation_id,
            "answering url verification handshake"
        );
        return ([(header::CONTENT_TYPE, "text/plain")], challenge).into_response();
    }

    debug!(
        event_name = "ingress.slack.received",
        correlation_id = %ctx.correlation_id,
        event_type = ?event.event_type(),
        "dispatching slack event"
    );
    match state.dispatcher.dispatch(&event, &ctx).await {
        Ok(result) => debug!(
            event_name = "ingress.slack.dispatched",
            correlation_id = %ctx.correlation_id,
            result = ?result,
            "slack event handled"
        ),
        Err(dispatch_error) => error!(
            event_name = "ingress.slack.dispatch_failed",
            correlation_id = %ctx.correlation_id,
            error = %dispatch_error,
            "slack event handler failed"
        ),
    }

    StatusCode::OK.into_response()
}
