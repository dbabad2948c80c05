use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// A half-open `[start_utc, end_utc)` interval as delivered by the schedule source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> Self {
        Self { start_utc, end_utc }
    }
}

/// Availability and bookings for one requested week, exactly as fetched.
///
/// Ranges may overlap, arrive unordered and have any length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSchedule {
    pub available_list: Vec<TimeRange>,
    pub booked_list: Vec<TimeRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Booked,
}

/// One 30-minute bucket, keyed by its start instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_utc: DateTime<Utc>,
    /// `HH:mm` in the zone the slot was generated for
    pub display_time: String,
    pub status: SlotStatus,
}

impl TimeSlot {
    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

// Wire format of the schedule endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(rename = "available")]
    pub available_time_list: Vec<TimeRangeResponse>,
    #[serde(rename = "booked")]
    pub booked_time_list: Vec<TimeRangeResponse>,
}

/// A single range on the wire, ISO-8601 strings such as `2025-07-27T04:00:00Z`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRangeResponse {
    #[serde(rename = "start")]
    pub start_time: String,
    #[serde(rename = "end")]
    pub end_time: String,
}

impl TryFrom<&TimeRangeResponse> for TimeRange {
    type Error = ScheduleError;

    fn try_from(range: &TimeRangeResponse) -> Result<Self, Self::Error> {
        Ok(TimeRange {
            start_utc: parse_instant(&range.start_time)?,
            end_utc: parse_instant(&range.end_time)?,
        })
    }
}

impl TryFrom<ScheduleResponse> for RawSchedule {
    type Error = ScheduleError;

    fn try_from(response: ScheduleResponse) -> Result<Self, Self::Error> {
        let available_list = response
            .available_time_list
            .iter()
            .map(TimeRange::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let booked_list = response
            .booked_time_list
            .iter()
            .map(TimeRange::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawSchedule {
            available_list,
            booked_list,
        })
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, ScheduleError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScheduleError::Api {
            message: format!("Invalid timestamp '{}': {}", value, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_response_uses_wire_field_names() {
        let body = r#"{
            "available": [{"start": "2025-07-27T04:00:00Z", "end": "2025-07-27T06:30:00Z"}],
            "booked": [{"start": "2025-07-27T05:00:00+08:00", "end": "2025-07-27T05:30:00+08:00"}]
        }"#;

        let response: ScheduleResponse = serde_json::from_str(body).unwrap();
        let raw = RawSchedule::try_from(response).unwrap();

        assert_eq!(raw.available_list.len(), 1);
        assert_eq!(
            raw.available_list[0].start_utc,
            Utc.with_ymd_and_hms(2025, 7, 27, 4, 0, 0).unwrap()
        );
        assert_eq!(
            raw.available_list[0].end_utc,
            Utc.with_ymd_and_hms(2025, 7, 27, 6, 30, 0).unwrap()
        );

        // Offsets are normalized to UTC
        assert_eq!(
            raw.booked_list[0].start_utc,
            Utc.with_ymd_and_hms(2025, 7, 26, 21, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bad_timestamp_is_api_error() {
        let response = ScheduleResponse {
            available_time_list: vec![TimeRangeResponse {
                start_time: "yesterday".to_string(),
                end_time: "2025-07-27T06:30:00Z".to_string(),
            }],
            booked_time_list: vec![],
        };

        let result = RawSchedule::try_from(response);
        assert!(matches!(result, Err(ScheduleError::Api { .. })));
    }

    #[test]
    fn test_slot_status_serializes_upper_case() {
        assert_eq!(
            serde_json::to_value(SlotStatus::Available).unwrap(),
            "AVAILABLE"
        );
        assert_eq!(serde_json::to_value(SlotStatus::Booked).unwrap(), "BOOKED");
    }
}
