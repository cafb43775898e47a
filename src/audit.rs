use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Actions recorded against WorkOrder / TimeEntry state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    StopTimer,
    Approve,
    QcApprove,
    QcReject,
    ReadyToBill,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::StopTimer => "STOP_TIMER",
            AuditAction::Approve => "APPROVE",
            AuditAction::QcApprove => "QC_APPROVE",
            AuditAction::QcReject => "QC_REJECT",
            AuditAction::ReadyToBill => "READY_TO_BILL",
        }
    }
}

/// Appends one immutable audit row. Takes the caller's transaction so the
/// record commits or rolls back together with the mutation it describes.
pub async fn record(
    tx: &mut Transaction<'_, Postgres>,
    entity_type: &str,
    entity_id: Uuid,
    action: AuditAction,
    actor_id: Uuid,
    before: serde_json::Value,
    after: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (entity_type, entity_id, action, actor_id, before_json, after_json)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action.as_str())
    .bind(actor_id)
    .bind(before)
    .bind(after)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub actor_id: Uuid,
    pub before_json: serde_json::Value,
    pub after_json: serde_json::Value,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub entity_type: Option<String>,
    pub action: Option<String>,
}

fn default_limit() -> i64 {
    50
}

pub fn router() -> Router<AppState> {
    Router::new().route("/audit", get(list_audit))
}

#[instrument(skip(state))]
async fn list_audit(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(q): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    caller.require_admin()?;

    let rows = sqlx::query_as::<_, AuditLogEntry>(
        r#"
        SELECT id, entity_type, entity_id, action, actor_id, before_json, after_json, created_at
        FROM audit_log
        WHERE ($3::text IS NULL OR entity_type = $3)
          AND ($4::text IS NULL OR action = $4)
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(q.limit.clamp(1, 200))
    .bind(q.offset.max(0))
    .bind(q.entity_type)
    .bind(q.action)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}
