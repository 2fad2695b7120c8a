//! Local wall-clock time to UTC conversion for submitted events.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::ScheduleError;

pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const LINK_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The five values collected by the event creation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventFormFields {
    pub title: String,
    pub location: String,
    /// `YYYY-MM-DD`, as produced by the date picker.
    pub date: String,
    /// `HH:MM` 24-hour clock, as produced by the time picker.
    pub time: String,
    /// IANA zone name such as `America/New_York`.
    pub timezone: String,
}

impl EventFormFields {
    pub fn start_utc(&self) -> Result<DateTime<Utc>, ScheduleError> {
        local_to_utc(&self.date, &self.time, &self.timezone)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    let name = name.trim();
    name.parse::<Tz>().map_err(|_| ScheduleError::InvalidTimezone(name.to_owned()))
}

/// Interprets `date` + `time` as wall-clock time in `timezone`.
///
/// Ambiguous times during a fall-back transition resolve to the earlier
/// instant. Times skipped by a spring-forward transition are rejected.
pub fn local_to_utc(
    date: &str,
    time: &str,
    timezone: &str,
) -> Result<DateTime<Utc>, ScheduleError> {
    let input = format!("{} {}", date.trim(), time.trim());
    let naive = NaiveDateTime::parse_from_str(&input, LOCAL_TIMESTAMP_FORMAT)
        .map_err(|_| ScheduleError::InvalidDateTime { input: input.clone() })?;
    let zone = parse_timezone(timezone)?;

    let local = zone.from_local_datetime(&naive).earliest().ok_or_else(|| {
        ScheduleError::NonexistentLocalTime { local: input, timezone: zone.name().to_owned() }
    })?;

    Ok(local.with_timezone(&Utc))
}

pub fn link_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(LINK_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{link_timestamp, local_to_utc, parse_timezone, EventFormFields};
    use crate::errors::ScheduleError;

    #[test]
    fn new_york_summer_time_is_four_hours_behind_utc() {
        let instant = local_to_utc("2024-06-15", "14:30", "America/New_York").expect("convert");

        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 6, 15, 18, 30, 0).unwrap());
        assert_eq!(link_timestamp(&instant), "20240615T183000");
    }

    #[test]
    fn winter_time_uses_standard_offset() {
        let instant = local_to_utc("2024-01-15", "09:00", "Europe/Berlin").expect("convert");

        assert_eq!(link_timestamp(&instant), "20240115T080000");
    }

    #[test]
    fn conversion_can_roll_over_to_the_next_utc_day() {
        let instant = local_to_utc("2024-12-31", "20:15", "America/Los_Angeles").expect("convert");

        assert_eq!(link_timestamp(&instant), "20250101T041500");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let error = local_to_utc("2024-06-15", "14:30", "Not/AZone").expect_err("invalid zone");

        assert_eq!(error, ScheduleError::InvalidTimezone("Not/AZone".to_owned()));
    }

    #[test]
    fn timezone_names_are_trimmed() {
        let zone = parse_timezone("  Asia/Tokyo ").expect("zone");

        assert_eq!(zone.name(), "Asia/Tokyo");
    }

    #[test]
    fn malformed_time_is_rejected() {
        let error = local_to_utc("2024-06-15", "2:30pm", "UTC").expect_err("bad time");

        assert!(matches!(
            error,
            ScheduleError::InvalidDateTime { ref input } if input == "2024-06-15 2:30pm"
        ));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let error = local_to_utc("06/15/2024", "14:30", "UTC").expect_err("bad date");

        assert!(matches!(error, ScheduleError::InvalidDateTime { .. }));
    }

    #[test]
    fn spring_forward_gap_is_rejected() {
        let error = local_to_utc("2024-03-10", "02:30", "America/New_York").expect_err("gap");

        assert_eq!(
            error,
            ScheduleError::NonexistentLocalTime {
                local: "2024-03-10 02:30".to_owned(),
                timezone: "America/New_York".to_owned(),
            }
        );
    }

    #[test]
    fn fall_back_overlap_resolves_to_earlier_instant() {
        let instant = local_to_utc("2024-11-03", "01:30", "America/New_York").expect("overlap");

        // First 01:30 is still EDT (UTC-4).
        assert_eq!(link_timestamp(&instant), "20241103T053000");
    }

    #[test]
    fn form_fields_delegate_to_conversion() {
        let fields = EventFormFields {
            title: "Team Sync".to_owned(),
            location: "Room 4".to_owned(),
            date: "2024-06-15".to_owned(),
            time: "14:30".to_owned(),
            timezone: "America/New_York".to_owned(),
        };

        assert_eq!(link_timestamp(&fields.start_utc().expect("convert")), "20240615T183000");
    }
}
