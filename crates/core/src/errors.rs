use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("form field `{block_id}.{action_id}` is missing")]
    MissingField { block_id: &'static str, action_id: &'static str, label: &'static str },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("could not parse `{input}` as a `YYYY-MM-DD HH:MM` timestamp")]
    InvalidDateTime { input: String },
    #[error("`{0}` is not a recognized timezone")]
    InvalidTimezone(String),
    #[error("{local} does not exist in {timezone}")]
    NonexistentLocalTime { local: String, timezone: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("invalid link base url `{base_url}`: {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Any failure turning a submitted form into a calendar link.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl SubmissionError {
    /// Text safe to show the person who submitted the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Form(FormError::MissingField { label, .. }) => {
                format!("the {label} field was empty")
            }
            Self::Schedule(ScheduleError::InvalidDateTime { input }) => {
                format!("`{input}` is not a valid date and time")
            }
            Self::Schedule(ScheduleError::InvalidTimezone(name)) => {
                let hint = "try something like America/New_York";
                format!("`{name}` is not a recognized timezone ({hint})")
            }
            Self::Schedule(ScheduleError::NonexistentLocalTime { local, timezone }) => {
                format!("{local} is skipped by a clock change in {timezone}; pick another time")
            }
            Self::Link(_) => "the link service is misconfigured".to_owned(),
        }
    }
}
