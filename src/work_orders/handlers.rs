use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::work_orders::dto::{Pagination, RejectRequest, WorkOrderDetail};
use crate::work_orders::repo::{self, BoardRow, WorkOrder};
use crate::work_orders::service;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/work-orders", get(list_work_orders))
        .route("/work-orders/:id", get(get_work_order))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/work-orders/:id/qc/approve", post(qc_approve))
        .route("/work-orders/:id/qc/reject", post(qc_reject))
        .route("/work-orders/:id/ready-to-bill", post(ready_to_bill))
}

#[instrument(skip(state))]
async fn list_work_orders(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<BoardRow>>, ApiError> {
    let rows = repo::list_board(&state.db, p.limit.clamp(1, 200), p.offset.max(0)).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
async fn get_work_order(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkOrderDetail>, ApiError> {
    let work_order = WorkOrder::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("work order"))?;
    let line_items = WorkOrder::line_items(&state.db, id).await?;
    Ok(Json(WorkOrderDetail {
        work_order,
        line_items,
    }))
}

#[instrument(skip(state))]
async fn qc_approve(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkOrder>, ApiError> {
    let updated = service::qc_approve(&state.db, caller, id).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, body))]
async fn qc_reject(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    let updated = service::qc_reject(&state.db, caller, id, &body.reason).await?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
async fn ready_to_bill(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkOrder>, ApiError> {
    let updated = service::mark_ready_to_bill(&state.db, caller, id).await?;
    Ok(Json(updated))
}
