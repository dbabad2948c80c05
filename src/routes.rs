use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::{
    confirm_booking, create_session, delete_session, dismiss_booking, get_session, next_week,
    previous_week, retry, select_date, select_slot, AppState,
};
use crate::handlers::health::health_check;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let health_route = Router::new().route("/health", get(health_check));

    // One route per user gesture
    let session_routes = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", get(get_session).delete(delete_session))
        .route("/sessions/:session_id/previous-week", post(previous_week))
        .route("/sessions/:session_id/next-week", post(next_week))
        .route("/sessions/:session_id/date", post(select_date))
        .route("/sessions/:session_id/slot", post(select_slot))
        .route("/sessions/:session_id/booking/confirm", post(confirm_booking))
        .route("/sessions/:session_id/booking/dismiss", post(dismiss_booking))
        .route("/sessions/:session_id/retry", post(retry));

    info!("Schedule session routes enabled");

    Router::new()
        .merge(health_route)
        .merge(session_routes)
        .with_state(app_state)
}
