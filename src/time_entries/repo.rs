use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::work_orders::WorkOrderStatus;

/// Time-entry approval sub-state as stored in the `approval_state` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalState {
    Draft,
    Submitted,
    Approved,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub work_order_id: Uuid,
    pub line_item_id: Option<Uuid>,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
    pub duration_seconds: Option<i64>,
    pub approval_state: ApprovalState,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
    pub pause_reason: Option<String>,
    pub is_goodwill: bool,
    pub deleted_at: Option<OffsetDateTime>,
}

const TIME_ENTRY_COLS: &str = "id, user_id, work_order_id, line_item_id, started_at, ended_at, \
     duration_seconds, approval_state, approved_by, approved_at, notes, pause_reason, \
     is_goodwill, deleted_at";

impl TimeEntry {
    /// The caller's running timer, row-locked. Soft-deleted rows are skipped
    /// here; note that `find_running` below intentionally is not symmetric.
    pub async fn find_running_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {TIME_ENTRY_COLS} FROM time_entries \
             WHERE user_id = $1 AND ended_at IS NULL AND deleted_at IS NULL \
             FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Entries awaiting approval on one work order, locked for the bulk
    /// transition.
    pub async fn find_unapproved_for_update(
        tx: &mut Transaction<'_, Postgres>,
        work_order_id: Uuid,
    ) -> Result<Vec<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {TIME_ENTRY_COLS} FROM time_entries \
             WHERE work_order_id = $1 AND deleted_at IS NULL \
               AND approval_state IN ('DRAFT', 'SUBMITTED') \
             FOR UPDATE"
        ))
        .bind(work_order_id)
        .fetch_all(&mut **tx)
        .await
    }
}

/// Running-timer projection joined with its work order, customer and line
/// item, the shape the timer endpoints return.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TimerDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub work_order_id: Uuid,
    pub line_item_id: Option<Uuid>,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
    pub duration_seconds: Option<i64>,
    pub approval_state: ApprovalState,
    pub notes: Option<String>,
    pub pause_reason: Option<String>,
    pub is_goodwill: bool,
    pub work_order_number: String,
    pub work_order_status: WorkOrderStatus,
    pub customer_name: String,
    pub line_item_title: Option<String>,
}

const TIMER_DETAIL_QUERY: &str = r#"
    SELECT t.id, t.user_id, t.work_order_id, t.line_item_id, t.started_at, t.ended_at,
           t.duration_seconds, t.approval_state, t.notes, t.pause_reason, t.is_goodwill,
           w.number AS work_order_number, w.status AS work_order_status,
           c.name AS customer_name, l.title AS line_item_title
    FROM time_entries t
    JOIN work_orders w ON w.id = t.work_order_id
    JOIN customers c ON c.id = w.customer_id
    LEFT JOIN line_items l ON l.id = t.line_item_id
"#;

pub async fn detail_by_id(db: &PgPool, id: Uuid) -> Result<Option<TimerDetail>, sqlx::Error> {
    sqlx::query_as::<_, TimerDetail>(&format!("{TIMER_DETAIL_QUERY} WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// The caller's running timer in joined form. Deliberately does not filter
/// soft-deleted rows; stop_active_timer does. Preserved inconsistency from
/// the original system, asserted in tests rather than normalized.
pub async fn running_detail(db: &PgPool, user_id: Uuid) -> Result<Option<TimerDetail>, sqlx::Error> {
    sqlx::query_as::<_, TimerDetail>(&format!(
        "{TIMER_DETAIL_QUERY} WHERE t.user_id = $1 AND t.ended_at IS NULL LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_state_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ApprovalState::Submitted).unwrap(),
            "\"SUBMITTED\""
        );
        assert_eq!(
            serde_json::to_string(&ApprovalState::Approved).unwrap(),
            "\"APPROVED\""
        );
    }

    #[test]
    fn running_lookup_filters_deleted_but_joined_running_query_does_not() {
        // The asymmetry lives in the SQL itself; pin it so a cleanup does
        // not silently change visible behavior.
        assert!(!TIMER_DETAIL_QUERY.contains("deleted_at"));
    }
}
