use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::line_items::repo::LineItem;
use crate::line_items::service;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/line-items/:id/done", post(mark_done))
}

#[instrument(skip(state))]
async fn mark_done(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LineItem>, ApiError> {
    let updated = service::mark_done(&state.db, caller, id).await?;
    Ok(Json(updated))
}
