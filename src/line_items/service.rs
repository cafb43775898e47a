use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::line_items::repo::LineItem;
use crate::time_entries::clock::elapsed_seconds;

/// Marks an assigned line item DONE, first stopping the caller's running
/// timer on that item if one exists. The timer stop and the status update
/// are two independent writes, preserved from the original system rather
/// than strengthened into one transaction (see DESIGN.md). Completion is a
/// manual technician action; no sub-work check is performed.
pub async fn mark_done(db: &PgPool, caller: AuthedUser, id: Uuid) -> Result<LineItem, ApiError> {
    let item = LineItem::find_assigned(db, id, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("line item"))?;

    // Implicit stop of the caller's timer on this exact item. No deleted_at
    // filter here, matching the original behavior.
    let running: Option<(Uuid, OffsetDateTime)> = sqlx::query_as(
        r#"
        SELECT id, started_at
        FROM time_entries
        WHERE user_id = $1 AND line_item_id = $2 AND ended_at IS NULL
        "#,
    )
    .bind(caller.id)
    .bind(item.id)
    .fetch_optional(db)
    .await?;

    if let Some((entry_id, started_at)) = running {
        let now = OffsetDateTime::now_utc();
        let duration = elapsed_seconds(started_at, now);
        sqlx::query(
            r#"
            UPDATE time_entries
            SET ended_at = $2, duration_seconds = $3
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .bind(now)
        .bind(duration)
        .execute(db)
        .await?;
        info!(entry_id = %entry_id, user_id = %caller.id, duration, "timer stopped by mark done");
    }

    let updated = LineItem::set_done(db, item.id).await?;
    info!(line_item_id = %updated.id, user_id = %caller.id, "line item marked done");
    Ok(updated)
}
