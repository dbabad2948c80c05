use async_trait::async_trait;
use chrono::{DateTime, Offset, Timelike};
use chrono_tz::Tz;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ScheduleError;
use crate::models::schedule::{RawSchedule, ScheduleResponse};

/// Supplies raw availability and bookings for one teacher and week anchor.
///
/// Implementations should fail with a [`ScheduleError`] so the session can
/// surface the right kind; any other error is reported as `Unknown`.
#[async_trait]
pub trait ScheduleFetcher: Send + Sync {
    async fn fetch(&self, teacher_id: &str, started_at: DateTime<Tz>) -> anyhow::Result<RawSchedule>;
}

/// Client for the remote schedule endpoint
pub struct HttpScheduleFetcher {
    client: Client,
    base_url: String,
}

impl HttpScheduleFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ScheduleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScheduleError::Unknown {
                cause: e.to_string(),
            })?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ScheduleError> {
        Self::new(config.api_base_url.clone(), config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and decode one week, classifying every failure.
    pub async fn get_schedule(
        &self,
        teacher_id: &str,
        started_at: DateTime<Tz>,
    ) -> Result<RawSchedule, ScheduleError> {
        let url = format!("{}v1/guest/teachers/{}/schedule", self.base_url, teacher_id);
        let started_at = encode_started_at(&started_at);

        info!("Requesting schedule for teacher {}", teacher_id);
        debug!("API URL: {} started_at={}", url, started_at);

        let res = self
            .client
            .get(&url)
            .query(&[("started_at", started_at.as_str())])
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = res.status();
        info!("Response received with status: {}", status);

        if !status.is_success() {
            let body = res.text().await.ok().filter(|body| !body.is_empty());
            warn!("Schedule request failed with status {}", status);
            return Err(ScheduleError::Http {
                code: status.as_u16(),
                body,
            });
        }

        let bytes = res.bytes().await.map_err(classify_transport_error)?;
        let response: ScheduleResponse =
            serde_json::from_slice(&bytes).map_err(|e| {
                warn!("Failed to decode schedule response: {}", e);
                ScheduleError::Api {
                    message: "Invalid JSON format".to_string(),
                }
            })?;

        RawSchedule::try_from(response)
    }
}

#[async_trait]
impl ScheduleFetcher for HttpScheduleFetcher {
    async fn fetch(&self, teacher_id: &str, started_at: DateTime<Tz>) -> anyhow::Result<RawSchedule> {
        Ok(self.get_schedule(teacher_id, started_at).await?)
    }
}

/// Text sent as `started_at`: ISO-8601 local date-time, offset, then the zone id in brackets.
///
/// Seconds are written only when non-zero, fractions only in groups of three
/// digits and a zero offset as `Z`, e.g. `2025-07-28T15:00+08:00[Asia/Taipei]`
/// or `2025-07-28T07:00:05.250Z[UTC]`.
pub fn encode_started_at(started_at: &DateTime<Tz>) -> String {
    let local = started_at.naive_local();
    let mut text = local.format("%Y-%m-%dT%H:%M").to_string();

    // Leap seconds are folded into the nanosecond field
    let nanos = local.nanosecond() % 1_000_000_000;
    if local.second() != 0 || nanos != 0 {
        text.push_str(&format!(":{:02}", local.second()));
        if nanos != 0 {
            let fraction = if nanos % 1_000_000 == 0 {
                format!(".{:03}", nanos / 1_000_000)
            } else if nanos % 1_000 == 0 {
                format!(".{:06}", nanos / 1_000)
            } else {
                format!(".{:09}", nanos)
            };
            text.push_str(&fraction);
        }
    }

    text.push_str(&encode_offset(started_at.offset().fix().local_minus_utc()));
    format!("{}[{}]", text, started_at.timezone().name())
}

fn encode_offset(total_seconds: i32) -> String {
    if total_seconds == 0 {
        return "Z".to_string();
    }

    let sign = if total_seconds < 0 { '-' } else { '+' };
    let abs = total_seconds.unsigned_abs();
    let (hours, minutes, seconds) = (abs / 3600, abs / 60 % 60, abs % 60);

    if seconds == 0 {
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
    }
}

fn classify_transport_error(err: reqwest::Error) -> ScheduleError {
    if err.is_decode() {
        ScheduleError::Api {
            message: "Invalid JSON format".to_string(),
        }
    } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        warn!("Transport failure: {}", err);
        ScheduleError::Network
    } else {
        ScheduleError::Unknown {
            cause: err.to_string(),
        }
    }
}
