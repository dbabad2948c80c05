use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::schedule::{SlotStatus, TimeRange, TimeSlot};

/// Length of one bookable slot.
pub const SLOT_MINUTES: i64 = 30;

/// Turn raw availability and booking ranges into ordered half-hour slots.
///
/// Every range is walked from its start in 30-minute steps while the step
/// start is still before the range end, so a trailing partial bucket still
/// yields a slot. Overlapping ranges collapse to one slot per instant. When the same
/// instant is both available and booked the slot is `Booked`, whatever order
/// the ranges come in. `display_time` is the slot start in `zone` as `HH:mm`.
pub fn generate_time_slots(
    available_ranges: &[TimeRange],
    booked_ranges: &[TimeRange],
    zone: Tz,
) -> Vec<TimeSlot> {
    let mut statuses: BTreeMap<DateTime<Utc>, SlotStatus> = BTreeMap::new();

    let tagged = available_ranges
        .iter()
        .map(|range| (range, SlotStatus::Available))
        .chain(booked_ranges.iter().map(|range| (range, SlotStatus::Booked)));

    for (range, status) in tagged {
        for start in slot_starts(range) {
            statuses
                .entry(start)
                .and_modify(|existing| *existing = merge_status(*existing, status))
                .or_insert(status);
        }
    }

    debug!(
        "Generated {} slots from {} available and {} booked ranges",
        statuses.len(),
        available_ranges.len(),
        booked_ranges.len()
    );

    statuses
        .into_iter()
        .map(|(start_utc, status)| TimeSlot {
            start_utc,
            display_time: start_utc.with_timezone(&zone).format("%H:%M").to_string(),
            status,
        })
        .collect()
}

fn slot_starts(range: &TimeRange) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    let step = Duration::minutes(SLOT_MINUTES);
    std::iter::successors(Some(range.start_utc), move |current| Some(*current + step))
        .take_while(move |current| *current < range.end_utc)
}

// Booked dominates
fn merge_status(existing: SlotStatus, incoming: SlotStatus) -> SlotStatus {
    match (existing, incoming) {
        (SlotStatus::Booked, _) | (_, SlotStatus::Booked) => SlotStatus::Booked,
        _ => SlotStatus::Available,
    }
}

/// Slots of one fetched week grouped by their local start date.
///
/// Keys iterate in ascending date order and every day's slots keep the
/// generator's ascending start order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklySlotIndex {
    days: BTreeMap<NaiveDate, Vec<TimeSlot>>,
}

impl WeeklySlotIndex {
    pub fn build(slots: Vec<TimeSlot>, zone: Tz) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<TimeSlot>> = BTreeMap::new();
        for slot in slots {
            let local_date = slot.start_utc.with_timezone(&zone).date_naive();
            days.entry(local_date).or_default().push(slot);
        }
        Self { days }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    pub fn slots_for(&self, date: NaiveDate) -> Option<&[TimeSlot]> {
        self.days.get(&date).map(Vec::as_slice)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

/// Move an anchor by whole local days, keeping its wall-clock time.
///
/// If that wall-clock time does not exist (or is ambiguous) on the target
/// day, fall back to moving by an exact 24-hour multiple.
pub fn shift_days(anchor: DateTime<Tz>, days: i64) -> DateTime<Tz> {
    let calendar = if days >= 0 {
        anchor.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        anchor.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    calendar.unwrap_or_else(|| anchor + Duration::days(days))
}

pub fn shift_weeks(anchor: DateTime<Tz>, weeks: i64) -> DateTime<Tz> {
    shift_days(anchor, weeks * 7)
}

/// Whether the week before `anchor` still has a day that is not over.
///
/// The previous week spans `anchor - 7d ..= anchor - 1d`; it is loadable only
/// while its last day is at or after `now`.
pub fn can_load_prev_week(anchor: DateTime<Tz>, now: DateTime<Utc>) -> bool {
    let prev_week_start = shift_weeks(anchor, -1);
    let prev_week_end = shift_days(prev_week_start, 6);
    prev_week_end.with_timezone(&Utc) >= now
}

/// Week label covering the anchor date and the six days after it.
pub fn range_text(anchor: DateTime<Tz>) -> String {
    let last_day = shift_days(anchor, 6);
    format!(
        "{} - {}",
        anchor.date_naive().format("%b %d"),
        last_day.date_naive().format("%b %d")
    )
}
