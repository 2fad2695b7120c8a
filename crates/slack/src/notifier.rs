use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{SlackApi, SlackApiError};
use crate::events::EventContext;

/// Sends plain-text messages to a user or channel. Single attempt.
#[derive(Clone)]
pub struct Notifier {
    api: Arc<dyn SlackApi>,
}

impl Notifier {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    pub async fn send(
        &self,
        target: &str,
        text: &str,
        ctx: &EventContext,
    ) -> Result<(), SlackApiError> {
        match self.api.post_message(target, text).await {
            Ok(posted) => {
                debug!(
                    event_name = "egress.slack.message_sent",
                    correlation_id = %ctx.correlation_id,
                    recipient = target,
                    channel = %posted.channel,
                    ts = posted.ts.as_deref().unwrap_or("unknown"),
                    "notification delivered"
                );
                Ok(())
            }
            Err(error) => {
                warn!(
                    event_name = "egress.slack.message_failed",
                    correlation_id = %ctx.correlation_id,
                    recipient = target,
                    error = %error,
                    "notification failed"
                );
                Err(error)
            }
        }
    }
}
