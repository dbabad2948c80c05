use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::ScheduleError;
use crate::models::schedule::TimeSlot;

/// Everything the presentation layer needs to render one loaded week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSnapshot {
    /// The instant sent as the fetch's `started_at`. Not necessarily a Monday.
    pub range_anchor: DateTime<Tz>,
    /// Week label such as `Jul 15 - Jul 21`
    pub range_text: String,
    pub slots_for_selected_date: Vec<TimeSlot>,
    /// Local dates with at least one slot, ascending
    pub all_dates_in_range: Vec<NaiveDate>,
    pub selected_date: NaiveDate,
    /// Always a member of `slots_for_selected_date` when present
    pub selected_slot: Option<TimeSlot>,
    pub is_prev_enabled: bool,
    pub is_booking_confirmed: bool,
}

/// What the session currently exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    /// A fetch is outstanding. `previous` keeps the last loaded week on screen.
    Loading { previous: Option<ScheduleSnapshot> },
    Success(ScheduleSnapshot),
    Error { error: ScheduleError },
}

impl ViewState {
    pub fn as_success(&self) -> Option<&ScheduleSnapshot> {
        match self {
            ViewState::Success(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// The week the presentation layer should draw, fresh or stale.
    pub fn visible_snapshot(&self) -> Option<&ScheduleSnapshot> {
        match self {
            ViewState::Success(snapshot) => Some(snapshot),
            ViewState::Loading { previous } => previous.as_ref(),
            ViewState::Error { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }

    pub fn error(&self) -> Option<&ScheduleError> {
        match self {
            ViewState::Error { error } => Some(error),
            _ => None,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Loading { previous: None }
    }
}
