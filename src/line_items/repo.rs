use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "line_item_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LineItemStatus {
    Open,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub title: String,
    pub status: LineItemStatus,
    pub sort_order: i32,
    pub deleted_at: Option<OffsetDateTime>,
}

impl LineItem {
    /// Lookup gated on assignment: a caller who is not assigned gets the
    /// same "no row" answer as one asking about a missing id, so existence
    /// is not leaked.
    pub async fn find_assigned(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LineItem>, sqlx::Error> {
        sqlx::query_as::<_, LineItem>(
            r#"
            SELECT li.id, li.work_order_id, li.title, li.status, li.sort_order, li.deleted_at
            FROM line_items li
            JOIN line_item_assignments a ON a.line_item_id = li.id AND a.user_id = $2
            WHERE li.id = $1 AND li.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn set_done(db: &PgPool, id: Uuid) -> Result<LineItem, sqlx::Error> {
        sqlx::query_as::<_, LineItem>(
            r#"
            UPDATE line_items
            SET status = 'DONE'
            WHERE id = $1
            RETURNING id, work_order_id, title, status, sort_order, deleted_at
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await
    }
}
