use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::time_entries::dto::{ApproveResponse, StopTimerRequest};
use crate::time_entries::repo::TimerDetail;
use crate::time_entries::service;

pub fn timer_routes() -> Router<AppState> {
    Router::new()
        .route("/timers/active", get(active_timer))
        .route("/timers/stop", post(stop_timer))
}

pub fn approval_routes() -> Router<AppState> {
    Router::new().route(
        "/work-orders/:id/time-entries/approve",
        post(approve_time_entries),
    )
}

#[instrument(skip(state))]
async fn active_timer(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Option<TimerDetail>>, ApiError> {
    let timer = service::active_timer(&state.db, caller).await?;
    Ok(Json(timer))
}

#[instrument(skip(state, body))]
async fn stop_timer(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    body: Option<Json<StopTimerRequest>>,
) -> Result<Json<TimerDetail>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let detail = service::stop_active_timer(&state.db, caller, &req).await?;
    Ok(Json(detail))
}

#[instrument(skip(state))]
async fn approve_time_entries(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let approved = service::approve_for_work_order(&state.db, caller, id).await?;
    Ok(Json(ApproveResponse { approved }))
}
