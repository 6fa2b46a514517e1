//! Workflow error types for the request lifecycle.
//!
//! Every error here is recovered at the workflow boundary and returned as a
//! structured result; none propagate as generic failures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::workflow::types::{ApplicationStatus, ApprovalStage};

/// A stored request that conflicts with a candidate date range.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConflictingApplication {
    /// Presentation code of the conflicting request.
    pub code: String,
    /// Range start.
    pub start_date: NaiveDate,
    /// Range end.
    pub end_date: NaiveDate,
    /// Status of the conflicting request.
    pub status: ApplicationStatus,
    /// Leave type name, if the conflicting request is a leave request.
    pub leave_type_name: Option<String>,
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed input: bad session combination, inverted dates, bad level.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The client-supplied stage does not match the derived current stage.
    #[error("Stage mismatch: request is at {actual}, not {claimed}")]
    StageMismatch {
        /// The stage the client claimed to act on.
        claimed: ApprovalStage,
        /// The actual derived current stage.
        actual: ApprovalStage,
    },

    /// Actor is not permitted to act on the resolved stage.
    #[error("User {user_id} is not authorized to act on stage {stage}")]
    NotAuthorizedForStage {
        /// The actor who attempted the action.
        user_id: i64,
        /// The stage the action resolved to.
        stage: ApprovalStage,
    },

    /// Actor lacks the privileged role the operation requires.
    #[error("User {user_id} lacks the privileged role required to {operation}")]
    PrivilegeRequired {
        /// The actor who attempted the operation.
        user_id: i64,
        /// The operation that was refused.
        operation: &'static str,
    },

    /// The request is not pending, so it cannot advance or be rejected.
    #[error("Request is {status}, not pending")]
    NotPending {
        /// The request's current status.
        status: ApplicationStatus,
    },

    /// The target of an undo operation is not approved.
    #[error("Original request is {status}, not approved")]
    OriginalNotApproved {
        /// The original request's status.
        status: ApplicationStatus,
    },

    /// The original request was already reversed.
    #[error("Request {0} has already been reversed")]
    AlreadyReversed(i64),

    /// Requested days exceed the remaining balance.
    #[error("Requested {requested} days but only {available} remaining")]
    InsufficientBalance {
        /// Days the request would charge.
        requested: Decimal,
        /// Days remaining in the balance.
        available: Decimal,
    },

    /// The candidate range overlaps existing active requests.
    #[error("Date range overlaps {} existing request(s)", conflicts.len())]
    OverlapConflict {
        /// The conflicting requests.
        conflicts: Vec<ConflictingApplication>,
    },

    /// Request not found.
    #[error("Request {0} not found")]
    ApplicationNotFound(i64),

    /// User not found in the directory.
    #[error("User {0} not found")]
    UserNotFound(i64),

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Cancellation reason is required but not provided.
    #[error("Cancellation reason is required")]
    CancellationReasonRequired,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::StageMismatch { .. }
            | Self::RejectionReasonRequired
            | Self::CancellationReasonRequired => 400,

            Self::NotAuthorizedForStage { .. } | Self::PrivilegeRequired { .. } => 403,

            Self::ApplicationNotFound(_) | Self::UserNotFound(_) => 404,

            Self::NotPending { .. }
            | Self::OriginalNotApproved { .. }
            | Self::AlreadyReversed(_)
            | Self::OverlapConflict { .. } => 409,

            Self::InsufficientBalance { .. } => 422,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StageMismatch { .. } => "STAGE_MISMATCH",
            Self::NotAuthorizedForStage { .. } => "NOT_AUTHORIZED_FOR_STAGE",
            Self::PrivilegeRequired { .. } => "PRIVILEGE_REQUIRED",
            Self::NotPending { .. } => "REQUEST_NOT_PENDING",
            Self::OriginalNotApproved { .. } => "ORIGINAL_NOT_APPROVED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::OverlapConflict { .. } => "OVERLAP_CONFLICT",
            Self::ApplicationNotFound(_) => "REQUEST_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::CancellationReasonRequired => "CANCELLATION_REASON_REQUIRED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stage_mismatch_error() {
        let err = WorkflowError::StageMismatch {
            claimed: ApprovalStage::Checker,
            actual: ApprovalStage::Approver1,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "STAGE_MISMATCH");
        assert!(err.to_string().contains("approver_1"));
    }

    #[test]
    fn test_not_authorized_error() {
        let err = WorkflowError::NotAuthorizedForStage {
            user_id: 3,
            stage: ApprovalStage::Checker,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_AUTHORIZED_FOR_STAGE");
    }

    #[test]
    fn test_not_pending_error() {
        let err = WorkflowError::NotPending {
            status: ApplicationStatus::Approved,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "REQUEST_NOT_PENDING");
    }

    #[test]
    fn test_insufficient_balance_error() {
        let err = WorkflowError::InsufficientBalance {
            requested: dec!(3.0),
            available: dec!(1.5),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_overlap_conflict_error() {
        let err = WorkflowError::OverlapConflict {
            conflicts: vec![ConflictingApplication {
                code: "LV-000001".into(),
                start_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
                status: ApplicationStatus::Approved,
                leave_type_name: Some("Annual Leave".into()),
            }],
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "OVERLAP_CONFLICT");
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn test_already_reversed_error() {
        let err = WorkflowError::AlreadyReversed(12);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "ALREADY_REVERSED");
    }

    #[test]
    fn test_reason_required_errors() {
        assert_eq!(WorkflowError::RejectionReasonRequired.status_code(), 400);
        assert_eq!(
            WorkflowError::CancellationReasonRequired.error_code(),
            "CANCELLATION_REASON_REQUIRED"
        );
    }

    #[test]
    fn test_not_found_error() {
        let err = WorkflowError::ApplicationNotFound(99);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "REQUEST_NOT_FOUND");
    }
}
