use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use mockall::mock;

use crate::client::ScheduleFetcher;
use crate::models::schedule::{RawSchedule, TimeRange};

// Define a mock for the schedule fetcher seam
mock! {
    pub Fetcher {}

    #[async_trait]
    impl ScheduleFetcher for Fetcher {
        async fn fetch(&self, teacher_id: &str, started_at: DateTime<Tz>) -> anyhow::Result<RawSchedule>;
    }
}

pub const TEACHER_ID: &str = "levi-ackerman";

pub fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
}

pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
    TimeRange::new(start, end)
}

/// Available 07:00-08:00 and 09:00-09:30, booked 08:00-09:00 (UTC) on 2025-07-28.
pub fn overlap_schedule() -> RawSchedule {
    RawSchedule {
        available_list: vec![
            range(utc(2025, 7, 28, 7, 0), utc(2025, 7, 28, 8, 0)),
            range(utc(2025, 7, 28, 9, 0), utc(2025, 7, 28, 9, 30)),
        ],
        booked_list: vec![range(utc(2025, 7, 28, 8, 0), utc(2025, 7, 28, 9, 0))],
    }
}

/// Seven days from `first_day`: available 09:00-11:00 UTC with 10:00-10:30 booked.
pub fn week_schedule(first_day: NaiveDate) -> RawSchedule {
    let mut schedule = RawSchedule::default();
    for offset in 0..7 {
        let day = first_day + Duration::days(offset);
        let at = |hour: u32, min: u32| {
            Utc.from_utc_datetime(&day.and_hms_opt(hour, min, 0).unwrap())
        };
        schedule.available_list.push(range(at(9, 0), at(11, 0)));
        schedule.booked_list.push(range(at(10, 0), at(10, 30)));
    }
    schedule
}

// A fetcher that serves `week_schedule` for whatever week is requested
pub fn setup_week_fetcher() -> MockFetcher {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .returning(|_, started_at| Ok(week_schedule(started_at.date_naive())));
    fetcher
}
