//! Fixed identifiers shared by the event creation modal and the submission extractor.

pub const EVENT_FORM_CALLBACK_ID: &str = "event_creation";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Location,
    Date,
    Time,
    Timezone,
}

/// Key under which an input element reports its submitted value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKey {
    Value,
    SelectedDate,
    SelectedTime,
}

impl FormField {
    pub const ALL: [FormField; 5] =
        [Self::Title, Self::Location, Self::Date, Self::Time, Self::Timezone];

    pub fn block_id(self) -> &'static str {
        match self {
            Self::Title => "title_block",
            Self::Location => "location_block",
            Self::Date => "datetime_block",
            Self::Time => "time_block",
            Self::Timezone => "timezone_block",
        }
    }

    pub fn action_id(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Location => "location",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timezone => "timezone",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Location => "Location",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Timezone => "Timezone",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Title => "Event Title",
            Self::Location => "Event Location",
            Self::Date => "Select a date",
            Self::Time => "Select a time",
            Self::Timezone => "e.g., America/New_York",
        }
    }

    pub fn value_key(self) -> ValueKey {
        match self {
            Self::Date => ValueKey::SelectedDate,
            Self::Time => ValueKey::SelectedTime,
            Self::Title | Self::Location | Self::Timezone => ValueKey::Value,
        }
    }
}
