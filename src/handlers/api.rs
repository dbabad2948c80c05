use axum::{
    extract::{Json as ExtractJson, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::ScheduleFetcher;
use crate::clock::Clock;
use crate::models::common::{
    CreateSessionRequest, SelectDateRequest, SelectSlotRequest, SessionResponse,
};
use crate::models::view_state::ViewState;
use crate::services::session::ScheduleSession;

type SessionHandle = Arc<Mutex<ScheduleSession>>;

/// Sessions untouched for this long are dropped on the next `POST /sessions`.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    handle: SessionHandle,
    last_touched: DateTime<Utc>,
}

// AppState shared by all handlers
pub struct AppState {
    pub fetcher: Arc<dyn ScheduleFetcher>,
    pub clock: Arc<dyn Clock>,
    pub timezone: Tz,
    idle_timeout: Duration,
    sessions: StdMutex<HashMap<String, SessionEntry>>,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn ScheduleFetcher>, clock: Arc<dyn Clock>, timezone: Tz) -> Self {
        Self {
            fetcher,
            clock,
            timezone,
            idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            sessions: StdMutex::new(HashMap::new()),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    fn open_session(&self) -> (String, SessionHandle) {
        let session_id = format!("{:016x}", rand::random::<u64>());
        let session = ScheduleSession::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.clock),
            self.timezone,
        );
        let handle = Arc::new(Mutex::new(session));
        let now = self.clock.now();

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        self.evict_idle(&mut sessions, now);
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                handle: Arc::clone(&handle),
                last_touched: now,
            },
        );

        (session_id, handle)
    }

    // Handlers still holding an evicted handle finish their request normally
    fn evict_idle(&self, sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
        let Ok(idle_timeout) = chrono::Duration::from_std(self.idle_timeout) else {
            return;
        };

        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_touched < idle_timeout);

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle sessions", evicted);
        }
    }

    fn find_session(&self, session_id: &str) -> Result<SessionHandle, StatusCode> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        match sessions.get_mut(session_id) {
            Some(entry) => {
                entry.last_touched = now;
                Ok(Arc::clone(&entry.handle))
            }
            None => {
                warn!("Unknown session: {}", session_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
    }

    fn close_session(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// Open a browsing session and load the current week
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, StatusCode> {
    if request.teacher_id.trim().is_empty() {
        warn!("Rejecting session without a teacher id");
        return Err(StatusCode::BAD_REQUEST);
    }

    let (session_id, handle) = state.open_session();
    info!(
        "Opened session {} for teacher {}",
        session_id, request.teacher_id
    );

    let mut session = handle.lock().await;
    let now = session.now_local();
    session.initialize(&request.teacher_id, now).await;

    Ok(Json(SessionResponse {
        session_id,
        state: session.state(),
    }))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let session = handle.lock().await;
    Ok(Json(session.state()))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    if state.close_session(&session_id) {
        info!("Closed session {}", session_id);
        StatusCode::NO_CONTENT
    } else {
        warn!("Unknown session: {}", session_id);
        StatusCode::NOT_FOUND
    }
}

pub async fn previous_week(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;
    session.load_previous_week().await;
    Ok(Json(session.state()))
}

pub async fn next_week(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;
    session.load_next_week().await;
    Ok(Json(session.state()))
}

pub async fn select_date(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    ExtractJson(request): ExtractJson<SelectDateRequest>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;
    session.select_date(request.date);
    Ok(Json(session.state()))
}

// Booked slots are not selectable; that gate lives here, not in the session
pub async fn select_slot(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    ExtractJson(request): ExtractJson<SelectSlotRequest>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;

    let slot = session
        .state()
        .as_success()
        .and_then(|snapshot| {
            snapshot
                .slots_for_selected_date
                .iter()
                .find(|slot| slot.start_utc == request.start_utc)
                .cloned()
        })
        .ok_or_else(|| {
            warn!("No slot at {} on the selected day", request.start_utc);
            StatusCode::NOT_FOUND
        })?;

    if !slot.is_available() {
        warn!("Rejecting selection of booked slot {}", slot.start_utc);
        return Err(StatusCode::CONFLICT);
    }

    session.select_slot(slot);
    Ok(Json(session.state()))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;
    session.confirm_booking();
    Ok(Json(session.state()))
}

pub async fn dismiss_booking(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;
    session.dismiss_booking();
    Ok(Json(session.state()))
}

pub async fn retry(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ViewState>, StatusCode> {
    let handle = state.find_session(&session_id)?;
    let mut session = handle.lock().await;
    session.retry().await;
    Ok(Json(session.state()))
}
