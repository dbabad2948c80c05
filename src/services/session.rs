//! Weekly browsing state machine.
//!
//! A [`ScheduleSession`] owns one browsing session: the teacher being viewed,
//! the current week's [`WeeklySlotIndex`] and the [`ViewState`] handed to the
//! presentation layer. Fetching is the only suspension point. Every operation
//! takes `&mut self`, so callers serialize gestures per session and a newer
//! load can never interleave with an older one on the same value.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::ScheduleFetcher;
use crate::clock::Clock;
use crate::error::ScheduleError;
use crate::models::schedule::TimeSlot;
use crate::models::view_state::{ScheduleSnapshot, ViewState};
use crate::services::time_slots::{
    can_load_prev_week, generate_time_slots, range_text, shift_weeks, WeeklySlotIndex,
};

pub struct ScheduleSession {
    fetcher: Arc<dyn ScheduleFetcher>,
    clock: Arc<dyn Clock>,
    zone: Tz,
    teacher_id: String,
    index: WeeklySlotIndex,
    last_request: Option<(DateTime<Tz>, NaiveDate)>,
    state: watch::Sender<ViewState>,
}

impl ScheduleSession {
    /// Create an uninitialized session. `zone` is the caller's local zone.
    pub fn new(fetcher: Arc<dyn ScheduleFetcher>, clock: Arc<dyn Clock>, zone: Tz) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            fetcher,
            clock,
            zone,
            teacher_id: String::new(),
            index: WeeklySlotIndex::default(),
            last_request: None,
            state,
        }
    }

    pub fn teacher_id(&self) -> &str {
        &self.teacher_id
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Current view state
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receive every state the session emits from now on.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Slots of the last successfully loaded week
    pub fn weekly_index(&self) -> &WeeklySlotIndex {
        &self.index
    }

    pub fn now_local(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.zone)
    }

    fn is_initialized(&self) -> bool {
        !self.teacher_id.trim().is_empty()
    }

    /// Start browsing `teacher_id` from the week anchored at `now`.
    ///
    /// Only the first call with a non-blank id takes effect. Later calls are
    /// ignored even for a different teacher; build a new session to switch.
    pub async fn initialize(&mut self, teacher_id: &str, now: DateTime<Tz>) {
        if self.is_initialized() {
            debug!(
                "Session already initialized for teacher {}, ignoring init for {}",
                self.teacher_id, teacher_id
            );
            return;
        }

        info!("Initializing schedule session for teacher {}", teacher_id);
        self.teacher_id = teacher_id.to_string();

        let anchor = now.with_timezone(&self.zone);
        self.load_week(anchor, anchor.date_naive()).await;
    }

    /// Fetch the week starting at `anchor` and select `preferred_date` if it has slots.
    ///
    /// Emits `Loading` (carrying the week on screen, if any) before the fetch.
    /// On failure the previous index is kept but only exposed again after a
    /// later successful load.
    pub async fn load_week(&mut self, anchor: DateTime<Tz>, preferred_date: NaiveDate) {
        // A load that replaces an abandoned one keeps showing the same stale week
        let previous = self.state.borrow().visible_snapshot().cloned();
        self.emit(ViewState::Loading { previous });
        self.last_request = Some((anchor, preferred_date));

        info!(
            "Loading schedule for teacher {} anchored at {}",
            self.teacher_id, anchor
        );

        let result = self.fetcher.fetch(&self.teacher_id, anchor).await;
        match result {
            Ok(raw) => {
                let slots = generate_time_slots(&raw.available_list, &raw.booked_list, self.zone);
                self.index = WeeklySlotIndex::build(slots, self.zone);

                let selected_date = self.resolve_date(preferred_date);
                let snapshot = ScheduleSnapshot {
                    range_anchor: anchor,
                    range_text: range_text(anchor),
                    slots_for_selected_date: self.slots_on(selected_date),
                    all_dates_in_range: self.index.dates(),
                    selected_date,
                    selected_slot: None,
                    is_prev_enabled: can_load_prev_week(anchor, self.clock.now()),
                    is_booking_confirmed: false,
                };

                info!(
                    "Loaded {} slots over {} days, selected {}",
                    self.index.slot_count(),
                    snapshot.all_dates_in_range.len(),
                    selected_date
                );
                self.emit(ViewState::Success(snapshot));
            }
            Err(err) => {
                let error = ScheduleError::classify(err);
                warn!("Failed to load schedule: {}", error);
                self.emit(ViewState::Error { error });
            }
        }
    }

    /// Show the slots of another day from the already loaded week.
    ///
    /// A date outside the week falls back to the earliest loaded day.
    /// Always clears the selected slot and the booking flag.
    pub fn select_date(&mut self, date: NaiveDate) {
        let Some(mut snapshot) = self.current_success() else {
            debug!("Ignoring date selection outside of a loaded week");
            return;
        };

        let selected_date = self.resolve_date(date);
        snapshot.slots_for_selected_date = self.slots_on(selected_date);
        snapshot.selected_date = selected_date;
        snapshot.selected_slot = None;
        snapshot.is_booking_confirmed = false;

        self.emit(ViewState::Success(snapshot));
    }

    /// Mark `slot` as chosen.
    ///
    /// Status is not checked here; the presentation layer must not offer
    /// booked slots. Slots that are not part of the selected day are ignored.
    pub fn select_slot(&mut self, slot: TimeSlot) {
        let Some(mut snapshot) = self.current_success() else {
            debug!("Ignoring slot selection outside of a loaded week");
            return;
        };

        if !snapshot.slots_for_selected_date.contains(&slot) {
            debug!("Ignoring slot {} not on {}", slot.start_utc, snapshot.selected_date);
            return;
        }

        snapshot.selected_slot = Some(slot);
        self.emit(ViewState::Success(snapshot));
    }

    /// Raise the booking dialog flag for the selected, available slot.
    pub fn confirm_booking(&mut self) {
        let Some(mut snapshot) = self.current_success() else {
            return;
        };

        match &snapshot.selected_slot {
            Some(slot) if slot.is_available() => {
                info!("Booking confirmed for slot {}", slot.start_utc);
                snapshot.is_booking_confirmed = true;
                self.emit(ViewState::Success(snapshot));
            }
            _ => debug!("Ignoring booking confirmation without an available selected slot"),
        }
    }

    pub fn dismiss_booking(&mut self) {
        let Some(mut snapshot) = self.current_success() else {
            return;
        };

        if snapshot.is_booking_confirmed {
            snapshot.is_booking_confirmed = false;
            self.emit(ViewState::Success(snapshot));
        }
    }

    /// Page one week back, unless that week is already entirely in the past.
    pub async fn load_previous_week(&mut self) {
        let Some(snapshot) = self.current_success() else {
            debug!("Ignoring previous week outside of a loaded week");
            return;
        };

        if !can_load_prev_week(snapshot.range_anchor, self.clock.now()) {
            debug!(
                "Week before {} has fully elapsed, staying put",
                snapshot.range_anchor
            );
            return;
        }

        let anchor = shift_weeks(snapshot.range_anchor, -1);
        self.load_week(anchor, anchor.date_naive()).await;
    }

    pub async fn load_next_week(&mut self) {
        let Some(snapshot) = self.current_success() else {
            debug!("Ignoring next week outside of a loaded week");
            return;
        };

        let anchor = shift_weeks(snapshot.range_anchor, 1);
        self.load_week(anchor, anchor.date_naive()).await;
    }

    /// Re-issue the last load.
    ///
    /// From `Success` this reloads the shown week keeping the selected day;
    /// otherwise it repeats the last request, or starts from now if there was none.
    pub async fn retry(&mut self) {
        if !self.is_initialized() {
            warn!("Retry requested before the session was initialized");
            return;
        }

        let shown = self
            .current_success()
            .map(|snapshot| (snapshot.range_anchor, snapshot.selected_date));

        let (anchor, date) = shown.or(self.last_request).unwrap_or_else(|| {
            let now = self.now_local();
            (now, now.date_naive())
        });

        info!("Retrying schedule load anchored at {}", anchor);
        self.load_week(anchor, date).await;
    }

    fn current_success(&self) -> Option<ScheduleSnapshot> {
        self.state.borrow().as_success().cloned()
    }

    fn resolve_date(&self, preferred: NaiveDate) -> NaiveDate {
        if self.index.contains(preferred) {
            preferred
        } else {
            self.index.earliest_date().unwrap_or(preferred)
        }
    }

    fn slots_on(&self, date: NaiveDate) -> Vec<TimeSlot> {
        self.index
            .slots_for(date)
            .map(<[TimeSlot]>::to_vec)
            .unwrap_or_default()
    }

    fn emit(&self, state: ViewState) {
        debug!(
            "Session state -> {}",
            match &state {
                ViewState::Loading { .. } => "loading",
                ViewState::Success(_) => "success",
                ViewState::Error { .. } => "error",
            }
        );
        self.state.send_replace(state);
    }
}
