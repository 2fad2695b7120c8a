use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use eventlink_core::config::AppConfig;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    api::{SlackApi, SlackApiError},
    notifier::Notifier,
    submission::FormProcessor,
    trigger::TriggerDetector,
};

/// An inbound webhook delivery, classified once at the HTTP boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    UrlVerification { challenge: String },
    Message(MessageEvent),
    ViewSubmission(ViewSubmission),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::UrlVerification { .. } => SlackEventType::UrlVerification,
            Self::Message(_) => SlackEventType::Message,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    UrlVerification,
    Message,
    ViewSubmission,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "channel")]
    pub channel_id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

/// Submitted value of one input element, keyed the way Slack reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ElementState {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_date: Option<String>,
    #[serde(default)]
    pub selected_time: Option<String>,
}

/// `block_id -> action_id -> element state`
pub type StateValues = HashMap<String, HashMap<String, ElementState>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmission {
    pub user_id: String,
    pub callback_id: Option<String>,
    pub private_metadata: String,
    pub values: StateValues,
}

impl ViewSubmission {
    pub fn element(&self, block_id: &str, action_id: &str) -> Option<&ElementState> {
        self.values.get(block_id).and_then(|actions| actions.get(action_id))
    }
}

#[derive(Deserialize)]
struct RawViewSubmission {
    user: RawUser,
    view: RawView,
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Deserialize)]
struct RawView {
    #[serde(default)]
    callback_id: Option<String>,
    #[serde(default)]
    private_metadata: String,
    state: RawViewState,
}

#[derive(Deserialize)]
struct RawViewState {
    #[serde(default)]
    values: StateValues,
}

impl From<RawViewSubmission> for ViewSubmission {
    fn from(raw: RawViewSubmission) -> Self {
        Self {
            user_id: raw.user.id,
            callback_id: raw.view.callback_id,
            private_metadata: raw.view.private_metadata,
            values: raw.view.state.values,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("request body is not valid json: {0}")]
    InvalidJson(String),
    #[error("form-encoded body has no `payload` field")]
    MissingPayloadField,
    #[error("`{event_type}` payload is malformed: {reason}")]
    Malformed { event_type: String, reason: String },
}

fn malformed(event_type: &str, reason: impl ToString) -> PayloadError {
    PayloadError::Malformed { event_type: event_type.to_owned(), reason: reason.to_string() }
}

/// Classifies a webhook body: JSON for Events API deliveries, form-encoded
/// with a `payload` field for interactivity callbacks.
pub fn parse_webhook_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<SlackEvent, PayloadError> {
    let form_encoded = match content_type {
        Some(content_type) => content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("application/x-www-form-urlencoded"),
        None => body.iter().find(|byte| !byte.is_ascii_whitespace()) != Some(&b'{'),
    };

    if form_encoded {
        parse_interaction_body(body)
    } else {
        parse_events_api_body(body)
    }
}

pub fn parse_events_api_body(body: &[u8]) -> Result<SlackEvent, PayloadError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;

    match value.get("type").and_then(Value::as_str) {
        Some("url_verification") => {
            let challenge = value
                .get("challenge")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("url_verification", "missing `challenge`"))?;
            Ok(SlackEvent::UrlVerification { challenge: challenge.to_owned() })
        }
        Some("event_callback") => classify_callback_event(value.get("event")),
        Some(other) => Ok(SlackEvent::Unsupported { event_type: other.to_owned() }),
        None => Ok(SlackEvent::Unsupported { event_type: "unknown".to_owned() }),
    }
}

fn classify_callback_event(event: Option<&Value>) -> Result<SlackEvent, PayloadError> {
    let Some(event) = event else {
        return Err(malformed("event_callback", "missing `event`"));
    };

    let event_type = event.get("type").and_then(Value::as_str).unwrap_or("unknown");
    if event_type != "message" {
        return Ok(SlackEvent::Unsupported { event_type: event_type.to_owned() });
    }
    // Edits, deletions, joins and bot posts arrive as message subtypes.
    if let Some(subtype) = event.get("subtype").and_then(Value::as_str) {
        return Ok(SlackEvent::Unsupported { event_type: format!("message.{subtype}") });
    }

    MessageEvent::deserialize(event)
        .map(SlackEvent::Message)
        .map_err(|error| malformed("message", error))
}

pub fn parse_interaction_body(body: &[u8]) -> Result<SlackEvent, PayloadError> {
    let payload = url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.into_owned())
        .ok_or(PayloadError::MissingPayloadField)?;
    let value: Value = serde_json::from_str(&payload)
        .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;

    match value.get("type").and_then(Value::as_str) {
        Some("view_submission") => RawViewSubmission::deserialize(&value)
            .map(|raw| SlackEvent::ViewSubmission(raw.into()))
            .map_err(|error| malformed("view_submission", error)),
        Some(other) => Ok(SlackEvent::Unsupported { event_type: other.to_owned() }),
        None => Ok(SlackEvent::Unsupported { event_type: "unknown".to_owned() }),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    /// The action failed and the failure was reported back into Slack.
    Reported {
        reason: String,
    },
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("could not notify `{target}`: {source}")]
    Notify {
        target: String,
        #[source]
        source: SlackApiError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        event: &SlackEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        event: &SlackEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(event, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(api: Arc<dyn SlackApi>, config: &AppConfig) -> EventDispatcher {
    let notifier = Notifier::new(api.clone());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(TriggerDetector::new(
        api,
        notifier.clone(),
        config.slack.escalation_contact.clone(),
    ));
    dispatcher.register(FormProcessor::new(notifier, config.link.base_url.clone()));
    dispatcher
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eventlink_core::config::AppConfig;
    use serde_json::json;

    use super::{
        default_dispatcher, parse_events_api_body, parse_interaction_body, parse_webhook_body,
        EventContext, EventDispatcher, HandlerResult, MessageEvent, PayloadError, SlackEvent,
    };
    use crate::api::RecordingSlackApi;

    fn form_body(payload: &serde_json::Value) -> Vec<u8> {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload.to_string())
            .finish()
            .into_bytes()
    }

    fn submission_payload() -> serde_json::Value {
        json!({
            "type": "view_submission",
            "user": { "id": "U42", "name": "someone" },
            "view": {
                "callback_id": "event_creation",
                "private_metadata": "C7",
                "state": { "values": {
                    "title_block": { "title": { "type": "plain_text_input", "value": "Team Sync" } },
                    "location_block": { "location": { "type": "plain_text_input", "value": "Room 4" } },
                    "datetime_block": { "date": { "type": "datepicker", "selected_date": "2024-06-15" } },
                    "time_block": { "time": { "type": "timepicker", "selected_time": "14:30" } },
                    "timezone_block": { "timezone": { "type": "plain_text_input", "value": "America/New_York" } }
                } }
            }
        })
    }

    #[test]
    fn url_verification_carries_challenge() {
        let body = json!({ "type": "url_verification", "challenge": "abc123", "token": "t" });

        let event = parse_events_api_body(body.to_string().as_bytes()).expect("parse");

        assert_eq!(event, SlackEvent::UrlVerification { challenge: "abc123".to_owned() });
    }

    #[test]
    fn url_verification_without_challenge_is_malformed() {
        let error = parse_events_api_body(br#"{"type":"url_verification"}"#).expect_err("missing");

        assert!(matches!(error, PayloadError::Malformed { ref event_type, .. } if event_type == "url_verification"));
    }

    #[test]
    fn message_callback_becomes_message_event() {
        let body = json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "text": "please create event",
                "channel": "C1",
                "user": "U1",
                "trigger_id": "trig-1",
                "ts": "1730000000.1000"
            }
        });

        let event = parse_webhook_body(Some("application/json"), body.to_string().as_bytes())
            .expect("parse");

        assert_eq!(
            event,
            SlackEvent::Message(MessageEvent {
                text: Some("please create event".to_owned()),
                channel_id: "C1".to_owned(),
                user_id: "U1".to_owned(),
                trigger_id: Some("trig-1".to_owned()),
                bot_id: None,
            })
        );
    }

    #[test]
    fn message_without_text_is_still_a_message() {
        let body = json!({
            "type": "event_callback",
            "event": { "type": "message", "channel": "C1", "user": "U1" }
        });

        let event = parse_events_api_body(body.to_string().as_bytes()).expect("parse");

        assert!(matches!(event, SlackEvent::Message(MessageEvent { text: None, .. })));
    }

    #[test]
    fn message_subtypes_are_unsupported() {
        let body = json!({
            "type": "event_callback",
            "event": { "type": "message", "subtype": "message_changed", "channel": "C1" }
        });

        let event = parse_events_api_body(body.to_string().as_bytes()).expect("parse");

        assert_eq!(
            event,
            SlackEvent::Unsupported { event_type: "message.message_changed".to_owned() }
        );
    }

    #[test]
    fn other_callback_events_are_unsupported() {
        let body = json!({
            "type": "event_callback",
            "event": { "type": "reaction_added", "user": "U1" }
        });

        let event = parse_events_api_body(body.to_string().as_bytes()).expect("parse");

        assert_eq!(event, SlackEvent::Unsupported { event_type: "reaction_added".to_owned() });
    }

    #[test]
    fn message_missing_channel_is_malformed() {
        let body = json!({
            "type": "event_callback",
            "event": { "type": "message", "user": "U1", "text": "create event" }
        });

        let error = parse_events_api_body(body.to_string().as_bytes()).expect_err("malformed");

        assert!(matches!(error, PayloadError::Malformed { ref event_type, .. } if event_type == "message"));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let error = parse_webhook_body(Some("application/json"), b"nope").expect_err("invalid");

        assert!(matches!(error, PayloadError::InvalidJson(_)));
    }

    #[test]
    fn form_encoded_view_submission_is_decoded() {
        let body = form_body(&submission_payload());

        let event = parse_webhook_body(Some("application/x-www-form-urlencoded"), &body)
            .expect("parse");

        let SlackEvent::ViewSubmission(submission) = event else {
            panic!("expected view submission, got {event:?}");
        };
        assert_eq!(submission.user_id, "U42");
        assert_eq!(submission.private_metadata, "C7");
        assert_eq!(submission.callback_id.as_deref(), Some("event_creation"));
        assert_eq!(
            submission.element("datetime_block", "date").and_then(|e| e.selected_date.as_deref()),
            Some("2024-06-15")
        );
        assert_eq!(
            submission.element("title_block", "title").and_then(|e| e.value.as_deref()),
            Some("Team Sync")
        );
    }

    #[test]
    fn body_shape_is_sniffed_without_content_type() {
        let body = form_body(&submission_payload());

        let event = parse_webhook_body(None, &body).expect("parse");

        assert!(matches!(event, SlackEvent::ViewSubmission(_)));
    }

    #[test]
    fn form_body_without_payload_field_is_rejected() {
        let error = parse_interaction_body(b"foo=bar").expect_err("missing payload");

        assert_eq!(error, PayloadError::MissingPayloadField);
    }

    #[test]
    fn other_interaction_types_are_unsupported() {
        let body = form_body(&json!({ "type": "block_actions", "user": { "id": "U1" } }));

        let event = parse_interaction_body(&body).expect("parse");

        assert_eq!(event, SlackEvent::Unsupported { event_type: "block_actions".to_owned() });
    }

    #[test]
    fn default_dispatcher_registers_handlers() {
        let dispatcher = default_dispatcher(Arc::new(RecordingSlackApi::new()), &AppConfig::default());

        assert_eq!(dispatcher.handler_count(), 2);
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();
        let event = SlackEvent::Unsupported { event_type: "app_mention".to_owned() };

        let result = dispatcher.dispatch(&event, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn dispatcher_ignores_url_verification() {
        let api = Arc::new(RecordingSlackApi::new());
        let dispatcher = default_dispatcher(api.clone(), &AppConfig::default());
        let event = SlackEvent::UrlVerification { challenge: "abc".to_owned() };

        let result = dispatcher.dispatch(&event, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn dispatcher_routes_submissions_to_form_processor() {
        let api = Arc::new(RecordingSlackApi::new());
        let dispatcher = default_dispatcher(api.clone(), &AppConfig::default());
        let event = parse_interaction_body(&form_body(&submission_payload())).expect("parse");

        let result = dispatcher.dispatch(&event, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        let messages = api.posted_messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "U42");
        assert!(messages[0].1.contains("20240615T183000+0000/PT1H"));
    }
}
