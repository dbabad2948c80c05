use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::view_state::ViewState;

// Body for opening a new browsing session
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateSessionRequest {
    pub teacher_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SelectDateRequest {
    pub date: NaiveDate,
}

// Slots are addressed by their start instant, which is unique per week
#[derive(Debug, Deserialize, Serialize)]
pub struct SelectSlotRequest {
    pub start_utc: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub state: ViewState,
}
