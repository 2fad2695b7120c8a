use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

use crate::errors::{LinkError, SubmissionError};
use crate::schedule::{link_timestamp, EventFormFields};

pub const DEFAULT_LINK_BASE_URL: &str = "https://time.cs50.io/";
pub const UTC_OFFSET_MARKER: &str = "+0000";
pub const EVENT_DURATION: &str = "PT1H";

/// A shareable calendar link for a one-hour event starting at a UTC instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarLink {
    url: Url,
}

impl CalendarLink {
    pub fn build(
        base_url: &str,
        start: &DateTime<Utc>,
        title: &str,
        location: &str,
    ) -> Result<Self, LinkError> {
        let normalized =
            if base_url.ends_with('/') { base_url.to_owned() } else { format!("{base_url}/") };
        let invalid = |reason: String| LinkError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };

        let base = Url::parse(&normalized).map_err(|error| invalid(error.to_string()))?;
        let mut url = base
            .join(&format!("{}{UTC_OFFSET_MARKER}/{EVENT_DURATION}", link_timestamp(start)))
            .map_err(|error| invalid(error.to_string()))?;
        url.query_pairs_mut().append_pair("title", title).append_pair("location", location);

        Ok(Self { url })
    }

    pub fn for_event(base_url: &str, fields: &EventFormFields) -> Result<Self, SubmissionError> {
        let start = fields.start_utc()?;
        Ok(Self::build(base_url, &start, &fields.title, &fields.location)?)
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    #[cfg(test)]
    fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for CalendarLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
