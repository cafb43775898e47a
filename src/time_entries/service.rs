use serde_json::json;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditAction};
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::time_entries::clock::elapsed_seconds;
use crate::time_entries::dto::StopTimerRequest;
use crate::time_entries::repo::{self, TimeEntry, TimerDetail};

/// Field values applied when a timer stops: caller overrides merged with
/// the entry's current state.
#[derive(Debug, PartialEq)]
pub struct StopFields {
    pub notes: Option<String>,
    pub pause_reason: Option<String>,
    pub is_goodwill: bool,
}

/// Notes fall back to what is already on the entry; pause reason and
/// goodwill fall back to null/false, not to prior values.
pub fn merge_stop_fields(existing_notes: Option<String>, req: &StopTimerRequest) -> StopFields {
    StopFields {
        notes: req.notes.clone().or(existing_notes),
        pause_reason: req.pause_reason.clone(),
        is_goodwill: req.is_goodwill.unwrap_or(false),
    }
}

/// Stops the caller's running timer. The entry update and its audit row
/// commit in one transaction; the joined response is read back afterwards.
pub async fn stop_active_timer(
    db: &PgPool,
    caller: AuthedUser,
    req: &StopTimerRequest,
) -> Result<TimerDetail, ApiError> {
    let mut tx = db.begin().await?;

    let entry = TimeEntry::find_running_for_update(&mut tx, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("active timer"))?;

    let now = OffsetDateTime::now_utc();
    let duration = elapsed_seconds(entry.started_at, now);
    let fields = merge_stop_fields(entry.notes.clone(), req);

    sqlx::query(
        r#"
        UPDATE time_entries
        SET ended_at = $2, duration_seconds = $3, notes = $4, pause_reason = $5, is_goodwill = $6
        WHERE id = $1
        "#,
    )
    .bind(entry.id)
    .bind(now)
    .bind(duration)
    .bind(&fields.notes)
    .bind(&fields.pause_reason)
    .bind(fields.is_goodwill)
    .execute(&mut *tx)
    .await?;

    audit::record(
        &mut tx,
        "time_entry",
        entry.id,
        AuditAction::StopTimer,
        caller.id,
        json!({ "ended_at": null, "started_at": entry.started_at }),
        json!({
            "duration_seconds": duration,
            "notes": fields.notes,
            "pause_reason": fields.pause_reason,
        }),
    )
    .await?;
    tx.commit().await?;

    info!(entry_id = %entry.id, user_id = %caller.id, duration, "timer stopped");

    repo::detail_by_id(db, entry.id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("stopped entry vanished")))
}

pub async fn active_timer(db: &PgPool, caller: AuthedUser) -> Result<Option<TimerDetail>, ApiError> {
    Ok(repo::running_detail(db, caller.id).await?)
}

/// Bulk-approves every non-deleted DRAFT/SUBMITTED entry on the work order,
/// one audit row per entry, all in one transaction. Admin only. Zero
/// matching entries is a successful no-op.
pub async fn approve_for_work_order(
    db: &PgPool,
    actor: AuthedUser,
    work_order_id: Uuid,
) -> Result<u64, ApiError> {
    actor.require_admin()?;

    let mut tx = db.begin().await?;
    let pending = TimeEntry::find_unapproved_for_update(&mut tx, work_order_id).await?;
    if pending.is_empty() {
        tx.commit().await?;
        return Ok(0);
    }

    let now = OffsetDateTime::now_utc();
    let ids: Vec<Uuid> = pending.iter().map(|e| e.id).collect();
    sqlx::query(
        r#"
        UPDATE time_entries
        SET approval_state = 'APPROVED', approved_by = $2, approved_at = $3
        WHERE id = ANY($1)
        "#,
    )
    .bind(&ids)
    .bind(actor.id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for entry in &pending {
        audit::record(
            &mut tx,
            "time_entry",
            entry.id,
            AuditAction::Approve,
            actor.id,
            json!({ "approval_state": entry.approval_state }),
            json!({ "approval_state": "APPROVED" }),
        )
        .await?;
    }
    tx.commit().await?;

    let count = pending.len() as u64;
    info!(work_order_id = %work_order_id, actor_id = %actor.id, count, "time entries approved");
    Ok(count)
}


#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::auth::roles::Role;

    async fn seed_user(db: &PgPool, email: &str, role: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (email, name, role, password_hash) \
             VALUES ($1, $2, $3::user_role, 'x') RETURNING id",
        )
        .bind(email)
        .bind("Seed User")
        .bind(role)
        .fetch_one(db)
        .await
        .expect("seed user")
    }

    async fn seed_work_order(db: &PgPool, number: &str) -> Uuid {
        let customer_id: Uuid =
            sqlx::query_scalar("INSERT INTO customers (name) VALUES ('Acme Auto') RETURNING id")
                .fetch_one(db)
                .await
                .expect("seed customer");
        sqlx::query_scalar(
            "INSERT INTO work_orders (customer_id, number, status, kanban_column) \
             VALUES ($1, $2, 'IN_PROGRESS', 'IN_PROGRESS') RETURNING id",
        )
        .bind(customer_id)
        .bind(number)
        .fetch_one(db)
        .await
        .expect("seed work order")
    }

    async fn seed_finished_entry(
        db: &PgPool,
        user_id: Uuid,
        work_order_id: Uuid,
        state: &str,
    ) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO time_entries \
                 (user_id, work_order_id, started_at, ended_at, duration_seconds, approval_state) \
             VALUES ($1, $2, now() - interval '1 hour', now(), 3600, $3::approval_state) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(work_order_id)
        .bind(state)
        .fetch_one(db)
        .await
        .expect("seed entry")
    }

    #[sqlx::test]
    async fn bulk_approve_transitions_only_pending_entries(db: PgPool) {
        let admin_id = seed_user(&db, "admin@shop.example", "ADMIN").await;
        let tech_id = seed_user(&db, "tech@shop.example", "TECH").await;
        let work_order_id = seed_work_order(&db, "WO-1001").await;

        seed_finished_entry(&db, tech_id, work_order_id, "DRAFT").await;
        seed_finished_entry(&db, tech_id, work_order_id, "SUBMITTED").await;
        seed_finished_entry(&db, tech_id, work_order_id, "APPROVED").await;
        // soft-deleted drafts are out of scope for approval
        let deleted = seed_finished_entry(&db, tech_id, work_order_id, "DRAFT").await;
        sqlx::query("UPDATE time_entries SET deleted_at = now() WHERE id = $1")
            .bind(deleted)
            .execute(&db)
            .await
            .expect("soft delete");

        let admin = AuthedUser {
            id: admin_id,
            role: Role::Admin,
        };
        let approved = approve_for_work_order(&db, admin, work_order_id)
            .await
            .expect("bulk approve");
        assert_eq!(approved, 2);

        let stamped: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM time_entries \
             WHERE work_order_id = $1 AND approval_state = 'APPROVED' AND approved_by = $2",
        )
        .bind(work_order_id)
        .bind(admin_id)
        .fetch_one(&db)
        .await
        .expect("count stamped");
        assert_eq!(stamped, 2);

        let audit_rows: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM audit_log WHERE entity_type = 'time_entry' AND action = 'APPROVE'",
        )
        .fetch_one(&db)
        .await
        .expect("count audit");
        assert_eq!(audit_rows, 2);

        // nothing left to approve: successful no-op, no extra audit rows
        let again = approve_for_work_order(&db, admin, work_order_id)
            .await
            .expect("second pass");
        assert_eq!(again, 0);
        let audit_after: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM audit_log WHERE entity_type = 'time_entry' AND action = 'APPROVE'",
        )
        .fetch_one(&db)
        .await
        .expect("count audit");
        assert_eq!(audit_after, 2);
    }

    #[sqlx::test]
    async fn bulk_approve_rejects_non_admins(db: PgPool) {
        let tech_id = seed_user(&db, "tech@shop.example", "TECH").await;
        let work_order_id = seed_work_order(&db, "WO-1002").await;
        seed_finished_entry(&db, tech_id, work_order_id, "SUBMITTED").await;

        let tech = AuthedUser {
            id: tech_id,
            role: Role::Tech,
        };
        let err = approve_for_work_order(&db, tech, work_order_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let still_pending: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM time_entries \
             WHERE work_order_id = $1 AND approval_state = 'SUBMITTED'",
        )
        .bind(work_order_id)
        .fetch_one(&db)
        .await
        .expect("count pending");
        assert_eq!(still_pending, 1);
    }

    #[sqlx::test]
    async fn second_running_timer_is_rejected_by_the_store(db: PgPool) {
        let tech_id = seed_user(&db, "tech@shop.example", "TECH").await;
        let work_order_id = seed_work_order(&db, "WO-1003").await;

        sqlx::query(
            "INSERT INTO time_entries (user_id, work_order_id, started_at) VALUES ($1, $2, now())",
        )
        .bind(tech_id)
        .bind(work_order_id)
        .execute(&db)
        .await
        .expect("first running timer");

        let err = sqlx::query(
            "INSERT INTO time_entries (user_id, work_order_id, started_at) VALUES ($1, $2, now())",
        )
        .bind(tech_id)
        .bind(work_order_id)
        .execute(&db)
        .await
        .unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }
}
