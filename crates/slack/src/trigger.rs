use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    api::{SlackApi, SlackApiError},
    blocks::event_creation_modal,
    events::{
        EventContext, EventHandler, EventHandlerError, HandlerResult, MessageEvent, SlackEvent,
        SlackEventType,
    },
    notifier::Notifier,
};

pub const TRIGGER_PHRASE: &str = "create event";

/// Case-insensitive substring match; word boundaries are not required.
pub fn contains_trigger_phrase(text: Option<&str>) -> bool {
    text.is_some_and(|text| text.to_lowercase().contains(TRIGGER_PHRASE))
}

pub fn modal_failure_text(error: &SlackApiError, escalation_contact: &str) -> String {
    format!(
        "Error opening modal: {}. My human might be able to help: <@{escalation_contact}>",
        error.reason()
    )
}

/// Opens the event creation modal when a channel message asks for it.
pub struct TriggerDetector {
    api: Arc<dyn SlackApi>,
    notifier: Notifier,
    escalation_contact: String,
}

impl TriggerDetector {
    pub fn new(api: Arc<dyn SlackApi>, notifier: Notifier, escalation_contact: String) -> Self {
        Self { api, notifier, escalation_contact }
    }

    async fn open_modal(&self, message: &MessageEvent) -> Result<(), SlackApiError> {
        let Some(trigger_id) = message.trigger_id.as_deref() else {
            return Err(SlackApiError::MissingTriggerId);
        };
        self.api.open_view(trigger_id, &event_creation_modal(&message.channel_id)).await
    }
}

#[async_trait]
impl EventHandler for TriggerDetector {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        event: &SlackEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(message) = event else {
            return Ok(HandlerResult::Ignored);
        };
        if message.bot_id.is_some() || !contains_trigger_phrase(message.text.as_deref()) {
            return Ok(HandlerResult::Ignored);
        }

        match self.open_modal(message).await {
            Ok(()) => {
                info!(
                    event_name = "slack.modal.opened",
                    correlation_id = %ctx.correlation_id,
                    channel = %message.channel_id,
                    user = %message.user_id,
                    "event creation modal opened"
                );
                Ok(HandlerResult::Processed)
            }
            Err(error) => {
                warn!(
                    event_name = "slack.modal.open_failed",
                    correlation_id = %ctx.correlation_id,
                    channel = %message.channel_id,
                    error = %error,
                    "could not open event creation modal"
                );
                let text = modal_failure_text(&error, &self.escalation_contact);
                self.notifier.send(&message.channel_id, &text, ctx).await.map_err(|source| {
                    EventHandlerError::Notify { target: message.channel_id.clone(), source }
                })?;
                Ok(HandlerResult::Reported { reason: error.reason().to_owned() })
            }
        }
    }
}
