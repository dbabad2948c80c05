//! Teacher Schedule Service
//!
//! Lets a client browse a teacher's weekly availability and pick a bookable
//! half-hour slot. Raw availability and booking ranges fetched from the
//! schedule API are cut into zoned 30-minute slots, grouped by local date and
//! driven through a small per-session state machine (load, page between
//! weeks, pick a day, pick a slot, retry).
//!
//! # Modules
//!
//! - `services::time_slots`: slot generation and the per-week slot index
//! - `services::session`: `ScheduleSession`, the browsing state machine
//! - `client`: the `ScheduleFetcher` seam and its reqwest implementation
//! - `handlers` / `routes`: JSON rendition of the presentation layer
//!
//! # Errors
//!
//! Fetch failures are classified as `ScheduleError` (HTTP, network, API,
//! unknown). None of them are fatal; a session recovers with `retry()`.

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod client_mock;

// Re-export the main API types for ease of use
pub use client::{HttpScheduleFetcher, ScheduleFetcher};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{ConfigError, ScheduleError};
pub use handlers::api::AppState;
pub use models::schedule::{RawSchedule, SlotStatus, TimeRange, TimeSlot};
pub use models::view_state::{ScheduleSnapshot, ViewState};
pub use routes::create_router;
pub use services::session::ScheduleSession;
pub use services::time_slots::{generate_time_slots, WeeklySlotIndex};
