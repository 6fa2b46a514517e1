//! State transition logic for the approval workflow.
//!
//! This module implements the core state machine. It is pure: callers load a
//! [`WorkflowState`] from storage, apply a transition, and persist the
//! returned state inside their own transaction. Authorization is a separate
//! concern (see [`crate::workflow::authorize`]) checked by the caller before
//! applying a transition.

use chrono::{DateTime, Utc};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApplicationStatus, ApprovalStage, WorkflowState};

/// Result of a successful approve transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveOutcome {
    /// The stage that was stamped.
    pub stage: ApprovalStage,
    /// When the stage was stamped.
    pub acted_at: DateTime<Utc>,
    /// The derived stage after stamping (`Completed` on final approval).
    pub next_stage: ApprovalStage,
    /// The status after the transition.
    pub new_status: ApplicationStatus,
}

impl ApproveOutcome {
    /// True if this approval completed the chain.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self.new_status, ApplicationStatus::Approved)
    }
}

/// Result of a successful reject transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectOutcome {
    /// Who rejected.
    pub rejected_by: i64,
    /// When the rejection happened.
    pub rejected_at: DateTime<Utc>,
    /// The reason given.
    pub reason: String,
}

/// Result of a successful cancel transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Who cancelled.
    pub cancelled_by: i64,
    /// When the cancellation happened.
    pub cancelled_at: DateTime<Utc>,
    /// The reason given.
    pub reason: String,
}

/// Stateless service for workflow state transitions.
///
/// All methods are associated functions that validate a transition and return
/// the updated state plus an audit-bearing outcome.
pub struct WorkflowService;

impl WorkflowService {
    /// Advances a pending request by one stage.
    ///
    /// The actual stage is re-derived from the timeline; a client-supplied
    /// `claimed_stage` is only a consistency check. The actor is stamped into
    /// the slot even when they differ from the snapshot assignee (delegate).
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotPending`] if the request is not pending
    /// - [`WorkflowError::StageMismatch`] if `claimed_stage` disagrees with
    ///   the derived stage
    /// - [`WorkflowError::Validation`] if no actionable stage remains
    pub fn approve(
        state: &WorkflowState,
        actor_id: i64,
        claimed_stage: Option<ApprovalStage>,
        remarks: Option<String>,
    ) -> Result<(WorkflowState, ApproveOutcome), WorkflowError> {
        if state.status != ApplicationStatus::Pending {
            return Err(WorkflowError::NotPending {
                status: state.status,
            });
        }

        let actual = state.stages.current_stage();
        if actual == ApprovalStage::Completed {
            // Pending with an exhausted timeline means the cached status
            // diverged; refuse rather than guess.
            return Err(WorkflowError::Validation(
                "request has no actionable stage".to_string(),
            ));
        }

        if let Some(claimed) = claimed_stage {
            if claimed != actual {
                return Err(WorkflowError::StageMismatch { claimed, actual });
            }
        }

        let now = Utc::now();
        let mut next = state.clone();
        next.stages.stamp(actual, actor_id, now, remarks);

        let next_stage = next.stages.current_stage();
        if next_stage == ApprovalStage::Completed {
            next.status = ApplicationStatus::Approved;
        }

        let outcome = ApproveOutcome {
            stage: actual,
            acted_at: now,
            next_stage,
            new_status: next.status,
        };
        Ok((next, outcome))
    }

    /// Rejects a pending request. Terminal.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotPending`] if the request is not pending
    /// - [`WorkflowError::RejectionReasonRequired`] if the reason is blank
    pub fn reject(
        state: &WorkflowState,
        actor_id: i64,
        reason: &str,
    ) -> Result<(WorkflowState, RejectOutcome), WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }
        if state.status != ApplicationStatus::Pending {
            return Err(WorkflowError::NotPending {
                status: state.status,
            });
        }

        let mut next = state.clone();
        next.status = ApplicationStatus::Rejected;

        let outcome = RejectOutcome {
            rejected_by: actor_id,
            rejected_at: Utc::now(),
            reason: reason.to_string(),
        };
        Ok((next, outcome))
    }

    /// Cancels an approved request. Terminal.
    ///
    /// Only reachable through a completed cancellation request; there is no
    /// direct cancel endpoint.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::OriginalNotApproved`] if the request is not approved
    /// - [`WorkflowError::CancellationReasonRequired`] if the reason is blank
    pub fn cancel(
        state: &WorkflowState,
        actor_id: i64,
        reason: &str,
    ) -> Result<(WorkflowState, CancelOutcome), WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::CancellationReasonRequired);
        }
        if state.status != ApplicationStatus::Approved {
            return Err(WorkflowError::OriginalNotApproved {
                status: state.status,
            });
        }

        let mut next = state.clone();
        next.status = ApplicationStatus::Cancelled;

        let outcome = CancelOutcome {
            cancelled_by: actor_id,
            cancelled_at: Utc::now(),
            reason: reason.to_string(),
        };
        Ok((next, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{StageRecord, StageTimeline};

    fn open_slot(assignee: i64) -> StageRecord {
        StageRecord {
            assignee_id: Some(assignee),
            group_id: Some(assignee + 100),
            completed_at: None,
            remarks: None,
        }
    }

    fn two_stage_state() -> WorkflowState {
        WorkflowState::pending(StageTimeline::new([
            open_slot(1),
            open_slot(2),
            StageRecord::default(),
            StageRecord::default(),
        ]))
    }

    #[test]
    fn test_approve_advances_one_stage() {
        let state = two_stage_state();
        let (next, outcome) = WorkflowService::approve(&state, 1, None, None).unwrap();

        assert_eq!(outcome.stage, ApprovalStage::Checker);
        assert_eq!(outcome.next_stage, ApprovalStage::Approver1);
        assert_eq!(next.status, ApplicationStatus::Pending);
        assert!(!outcome.is_final());
    }

    #[test]
    fn test_final_approve_sets_approved() {
        let state = two_stage_state();
        let (mid, _) = WorkflowService::approve(&state, 1, None, None).unwrap();
        let (done, outcome) = WorkflowService::approve(&mid, 2, None, None).unwrap();

        assert_eq!(outcome.next_stage, ApprovalStage::Completed);
        assert_eq!(done.status, ApplicationStatus::Approved);
        assert!(outcome.is_final());
    }

    #[test]
    fn test_approve_with_matching_claimed_stage() {
        let state = two_stage_state();
        let result = WorkflowService::approve(&state, 1, Some(ApprovalStage::Checker), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_approve_with_stale_claimed_stage_fails() {
        let state = two_stage_state();
        let result = WorkflowService::approve(&state, 1, Some(ApprovalStage::Approver1), None);
        assert!(matches!(
            result,
            Err(WorkflowError::StageMismatch {
                claimed: ApprovalStage::Approver1,
                actual: ApprovalStage::Checker,
            })
        ));
    }

    #[test]
    fn test_approve_non_pending_fails() {
        let mut state = two_stage_state();
        state.status = ApplicationStatus::Rejected;
        let result = WorkflowService::approve(&state, 1, None, None);
        assert!(matches!(result, Err(WorkflowError::NotPending { .. })));
    }

    #[test]
    fn test_approve_keeps_delegate_actor() {
        let state = two_stage_state();
        // Actor 42 acts for the checker slot snapshot-assigned to 1.
        let (next, _) = WorkflowService::approve(&state, 42, None, Some("covered".into())).unwrap();
        let record = next.stages.record(ApprovalStage::Checker).unwrap();
        assert_eq!(record.assignee_id, Some(42));
        assert_eq!(record.remarks.as_deref(), Some("covered"));
    }

    #[test]
    fn test_reject_from_pending() {
        let state = two_stage_state();
        let (next, outcome) = WorkflowService::reject(&state, 5, "insufficient detail").unwrap();
        assert_eq!(next.status, ApplicationStatus::Rejected);
        assert_eq!(outcome.rejected_by, 5);
    }

    #[test]
    fn test_reject_blank_reason_fails() {
        let state = two_stage_state();
        let result = WorkflowService::reject(&state, 5, "   ");
        assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));
    }

    #[test]
    fn test_reject_non_pending_fails() {
        let mut state = two_stage_state();
        state.status = ApplicationStatus::Approved;
        let result = WorkflowService::reject(&state, 5, "too late");
        assert!(matches!(result, Err(WorkflowError::NotPending { .. })));
    }

    #[test]
    fn test_cancel_approved() {
        let mut state = two_stage_state();
        state.status = ApplicationStatus::Approved;
        let (next, outcome) = WorkflowService::cancel(&state, 8, "plans changed").unwrap();
        assert_eq!(next.status, ApplicationStatus::Cancelled);
        assert_eq!(outcome.cancelled_by, 8);
    }

    #[test]
    fn test_cancel_pending_fails() {
        let state = two_stage_state();
        let result = WorkflowService::cancel(&state, 8, "plans changed");
        assert!(matches!(
            result,
            Err(WorkflowError::OriginalNotApproved { .. })
        ));
    }

    #[test]
    fn test_cancel_blank_reason_fails() {
        let mut state = two_stage_state();
        state.status = ApplicationStatus::Approved;
        let result = WorkflowService::cancel(&state, 8, "");
        assert!(matches!(
            result,
            Err(WorkflowError::CancellationReasonRequired)
        ));
    }
}
