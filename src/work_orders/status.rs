use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Work-order pipeline status as stored in the `work_order_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Open,
    InProgress,
    Qc,
    ReadyToBill,
    Closed,
}

impl WorkOrderStatus {
    /// Label written into `kanban_column` when a transition mirrors it.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "OPEN",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Qc => "QC",
            WorkOrderStatus::ReadyToBill => "READY_TO_BILL",
            WorkOrderStatus::Closed => "CLOSED",
        }
    }
}

/// QC approve/reject are only legal while the order sits in QC.
pub fn ensure_in_qc(status: WorkOrderStatus) -> Result<(), ApiError> {
    if status == WorkOrderStatus::Qc {
        Ok(())
    } else {
        Err(ApiError::InvalidState(format!(
            "work order is in {} and cannot be QC-reviewed",
            status.as_str()
        )))
    }
}

/// Rejection reasons must carry enough substance to act on. Checked before
/// any store access.
pub fn validate_rejection_reason(reason: &str) -> Result<&str, ApiError> {
    let trimmed = reason.trim();
    if trimmed.len() < 10 {
        return Err(ApiError::Validation(
            "rejection reason must be at least 10 characters".into(),
        ));
    }
    Ok(trimmed)
}

/// Billing gate: zero non-deleted DRAFT/SUBMITTED entries, or Conflict
/// naming the blocking count.
pub fn ensure_billable(unapproved_count: i64) -> Result<(), ApiError> {
    if unapproved_count == 0 {
        Ok(())
    } else {
        Err(ApiError::Conflict(format!(
            "{unapproved_count} unapproved time entries block billing"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn qc_guard_only_passes_in_qc() {
        assert!(ensure_in_qc(WorkOrderStatus::Qc).is_ok());
        for status in [
            WorkOrderStatus::Open,
            WorkOrderStatus::InProgress,
            WorkOrderStatus::ReadyToBill,
            WorkOrderStatus::Closed,
        ] {
            let err = ensure_in_qc(status).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert!(err.to_string().contains(status.as_str()));
        }
    }

    #[test]
    fn short_reason_is_rejected_before_any_store_access() {
        let err = validate_rejection_reason("bad").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn reason_is_trimmed_before_length_check() {
        // 9 significant chars padded with whitespace still fails
        assert!(validate_rejection_reason("  123456789  ").is_err());
        assert_eq!(
            validate_rejection_reason("  paint run on hood  ").unwrap(),
            "paint run on hood"
        );
    }

    #[test]
    fn billing_gate_passes_iff_zero_unapproved() {
        assert!(ensure_billable(0).is_ok());
        let err = ensure_billable(2).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn status_serializes_as_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&WorkOrderStatus::ReadyToBill).unwrap(),
            "\"READY_TO_BILL\""
        );
        assert_eq!(
            serde_json::to_string(&WorkOrderStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
    }
}
