use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::line_items::repo::LineItem;
use crate::work_orders::status::WorkOrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub number: String,
    pub status: WorkOrderStatus,
    pub kanban_column: String,
    pub priority: i32,
    pub qc_approved_by: Option<Uuid>,
    pub qc_approved_at: Option<OffsetDateTime>,
    pub qc_rejected_reason: Option<String>,
    pub created_at: OffsetDateTime,
}

const WORK_ORDER_COLS: &str = "id, customer_id, number, status, kanban_column, priority, \
     qc_approved_by, qc_approved_at, qc_rejected_reason, created_at";

impl WorkOrder {
    /// Row-locked lookup used by every state transition.
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        sqlx::query_as::<_, WorkOrder>(&format!(
            "SELECT {WORK_ORDER_COLS} FROM work_orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<WorkOrder>, sqlx::Error> {
        sqlx::query_as::<_, WorkOrder>(&format!(
            "SELECT {WORK_ORDER_COLS} FROM work_orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Non-deleted DRAFT/SUBMITTED entries on the order; the billing gate.
    pub async fn count_unapproved_entries(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count(*)
            FROM time_entries
            WHERE work_order_id = $1
              AND deleted_at IS NULL
              AND approval_state IN ('DRAFT', 'SUBMITTED')
            "#,
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn line_items(db: &PgPool, id: Uuid) -> Result<Vec<LineItem>, sqlx::Error> {
        sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, work_order_id, title, status, sort_order, deleted_at
            FROM line_items
            WHERE work_order_id = $1 AND deleted_at IS NULL
            ORDER BY sort_order ASC
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await
    }
}

/// Board projection: order plus its customer name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BoardRow {
    pub id: Uuid,
    pub number: String,
    pub status: WorkOrderStatus,
    pub kanban_column: String,
    pub priority: i32,
    pub customer_name: String,
}

pub async fn list_board(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<BoardRow>, sqlx::Error> {
    sqlx::query_as::<_, BoardRow>(
        r#"
        SELECT w.id, w.number, w.status, w.kanban_column, w.priority, c.name AS customer_name
        FROM work_orders w
        JOIN customers c ON c.id = w.customer_id
        ORDER BY w.priority DESC, w.created_at ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}
