use serde_json::json;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditAction};
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::work_orders::repo::WorkOrder;
use crate::work_orders::status::{
    ensure_billable, ensure_in_qc, validate_rejection_reason, WorkOrderStatus,
};

/// QC approval: QC -> READY_TO_BILL, kanban column mirrored, rejection
/// reason cleared. Admins and managers only.
pub async fn qc_approve(db: &PgPool, actor: AuthedUser, id: Uuid) -> Result<WorkOrder, ApiError> {
    actor.require_admin_or_manager()?;

    let mut tx = db.begin().await?;
    let order = WorkOrder::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("work order"))?;
    ensure_in_qc(order.status)?;

    let now = OffsetDateTime::now_utc();
    let updated = sqlx::query_as::<_, WorkOrder>(
        r#"
        UPDATE work_orders
        SET status = 'READY_TO_BILL',
            kanban_column = $2,
            qc_approved_by = $3,
            qc_approved_at = $4,
            qc_rejected_reason = NULL
        WHERE id = $1
        RETURNING id, customer_id, number, status, kanban_column, priority,
                  qc_approved_by, qc_approved_at, qc_rejected_reason, created_at
        "#,
    )
    .bind(id)
    .bind(WorkOrderStatus::ReadyToBill.as_str())
    .bind(actor.id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    audit::record(
        &mut tx,
        "work_order",
        id,
        AuditAction::QcApprove,
        actor.id,
        json!({
            "status": order.status,
            "qc_rejected_reason": order.qc_rejected_reason,
        }),
        json!({
            "status": updated.status,
            "qc_approved_by": updated.qc_approved_by,
        }),
    )
    .await?;
    tx.commit().await?;

    info!(work_order_id = %id, actor_id = %actor.id, "work order QC approved");
    Ok(updated)
}

/// QC rejection: QC -> IN_PROGRESS with a reason of at least 10 significant
/// characters; approval stamps are cleared. Admins and managers only.
pub async fn qc_reject(
    db: &PgPool,
    actor: AuthedUser,
    id: Uuid,
    reason: &str,
) -> Result<WorkOrder, ApiError> {
    actor.require_admin_or_manager()?;
    let reason = validate_rejection_reason(reason)?;

    let mut tx = db.begin().await?;
    let order = WorkOrder::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("work order"))?;
    ensure_in_qc(order.status)?;

    let updated = sqlx::query_as::<_, WorkOrder>(
        r#"
        UPDATE work_orders
        SET status = 'IN_PROGRESS',
            kanban_column = $2,
            qc_rejected_reason = $3,
            qc_approved_by = NULL,
            qc_approved_at = NULL
        WHERE id = $1
        RETURNING id, customer_id, number, status, kanban_column, priority,
                  qc_approved_by, qc_approved_at, qc_rejected_reason, created_at
        "#,
    )
    .bind(id)
    .bind(WorkOrderStatus::InProgress.as_str())
    .bind(reason)
    .fetch_one(&mut *tx)
    .await?;

    audit::record(
        &mut tx,
        "work_order",
        id,
        AuditAction::QcReject,
        actor.id,
        json!({
            "status": order.status,
            "qc_approved_by": order.qc_approved_by,
        }),
        json!({
            "status": updated.status,
            "qc_rejected_reason": updated.qc_rejected_reason,
        }),
    )
    .await?;
    tx.commit().await?;

    info!(work_order_id = %id, actor_id = %actor.id, "work order QC rejected");
    Ok(updated)
}

/// Direct billing path used when QC is skipped. Admin only, gated on zero
/// unapproved entries. Unlike qc_approve this does not touch kanban_column.
pub async fn mark_ready_to_bill(
    db: &PgPool,
    actor: AuthedUser,
    id: Uuid,
) -> Result<WorkOrder, ApiError> {
    actor.require_admin()?;

    let mut tx = db.begin().await?;
    let order = WorkOrder::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("work order"))?;

    let unapproved = WorkOrder::count_unapproved_entries(&mut tx, id).await?;
    ensure_billable(unapproved)?;

    let updated = sqlx::query_as::<_, WorkOrder>(
        r#"
        UPDATE work_orders
        SET status = 'READY_TO_BILL'
        WHERE id = $1
        RETURNING id, customer_id, number, status, kanban_column, priority,
                  qc_approved_by, qc_approved_at, qc_rejected_reason, created_at
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    audit::record(
        &mut tx,
        "work_order",
        id,
        AuditAction::ReadyToBill,
        actor.id,
        json!({ "status": order.status }),
        json!({ "status": updated.status }),
    )
    .await?;
    tx.commit().await?;

    info!(work_order_id = %id, actor_id = %actor.id, "work order marked ready to bill");
    Ok(updated)
}
