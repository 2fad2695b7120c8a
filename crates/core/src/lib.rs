pub mod config;
pub mod errors;
pub mod link;
pub mod schedule;

pub use errors::{FormError, LinkError, ScheduleError, SubmissionError};
pub use link::CalendarLink;
pub use schedule::EventFormFields;
