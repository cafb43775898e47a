use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::parts::repo::Part;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/parts", get(list_parts))
        .route("/parts/:id", get(get_part))
}

#[derive(Debug, Serialize)]
pub struct PartResponse {
    #[serde(flatten)]
    pub part: Part,
    pub quantity_available: i32,
}

impl From<Part> for PartResponse {
    fn from(part: Part) -> Self {
        let quantity_available = part.quantity_available();
        Self {
            part,
            quantity_available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[instrument(skip(state))]
async fn list_parts(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PartResponse>>, ApiError> {
    let parts = Part::list(&state.db, p.limit.clamp(1, 200), p.offset.max(0)).await?;
    Ok(Json(parts.into_iter().map(PartResponse::from).collect()))
}

#[instrument(skip(state))]
async fn get_part(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PartResponse>, ApiError> {
    let part = Part::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("part"))?;
    Ok(Json(part.into()))
}
