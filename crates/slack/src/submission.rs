use async_trait::async_trait;
use eventlink_core::{CalendarLink, EventFormFields, FormError, SubmissionError};
use tracing::{info, warn};

use crate::{
    events::{
        EventContext, EventHandler, EventHandlerError, HandlerResult, SlackEvent, SlackEventType,
        ViewSubmission,
    },
    form::{FormField, ValueKey, EVENT_FORM_CALLBACK_ID},
    notifier::Notifier,
};

/// Pulls the five form values out of the submitted view state.
/// Blank or whitespace-only values count as missing.
pub fn extract_form_fields(submission: &ViewSubmission) -> Result<EventFormFields, FormError> {
    let read = |field: FormField| -> Result<String, FormError> {
        submission
            .element(field.block_id(), field.action_id())
            .and_then(|state| match field.value_key() {
                ValueKey::Value => state.value.as_deref(),
                ValueKey::SelectedDate => state.selected_date.as_deref(),
                ValueKey::SelectedTime => state.selected_time.as_deref(),
            })
            .filter(|value| !value.trim().is_empty())
            .map(str::to_owned)
            .ok_or(FormError::MissingField {
                block_id: field.block_id(),
                action_id: field.action_id(),
                label: field.label(),
            })
    };

    Ok(EventFormFields {
        title: read(FormField::Title)?,
        location: read(FormField::Location)?,
        date: read(FormField::Date)?,
        time: read(FormField::Time)?,
        timezone: read(FormField::Timezone)?,
    })
}

pub fn link_message(link: &CalendarLink) -> String {
    format!("Here is your event link: {link}")
}

pub fn failure_message(error: &SubmissionError) -> String {
    format!("Sorry, I couldn't create your event link: {}.", error.user_message())
}

/// Turns a submitted event form into a calendar link and DMs it to the submitter.
pub struct FormProcessor {
    notifier: Notifier,
    link_base_url: String,
}

impl FormProcessor {
    pub fn new(notifier: Notifier, link_base_url: String) -> Self {
        Self { notifier, link_base_url }
    }

    pub fn build_link(&self, submission: &ViewSubmission) -> Result<CalendarLink, SubmissionError> {
        let fields = extract_form_fields(submission)?;
        CalendarLink::for_event(&self.link_base_url, &fields)
    }
}

#[async_trait]
impl EventHandler for FormProcessor {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    async fn handle(
        &self,
        event: &SlackEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(submission) = event else {
            return Ok(HandlerResult::Ignored);
        };
        if submission.callback_id.as_deref().is_some_and(|id| id != EVENT_FORM_CALLBACK_ID) {
            return Ok(HandlerResult::Ignored);
        }

        let (text, result) = match self.build_link(submission) {
            Ok(link) => {
                info!(
                    event_name = "slack.event_link.created",
                    correlation_id = %ctx.correlation_id,
                    user = %submission.user_id,
                    origin_channel = %submission.private_metadata,
                    link = %link,
                    "event link created"
                );
                (link_message(&link), HandlerResult::Processed)
            }
            Err(error) => {
                warn!(
                    event_name = "slack.event_link.rejected",
                    correlation_id = %ctx.correlation_id,
                    user = %submission.user_id,
                    error = %error,
                    "submitted event form could not be converted"
                );
                let reason = error.to_string();
                (failure_message(&error), HandlerResult::Reported { reason })
            }
        };

        self.notifier.send(&submission.user_id, &text, ctx).await.map_err(|source| {
            EventHandlerError::Notify { target: submission.user_id.clone(), source }
        })?;
        Ok(result)
    }
}
