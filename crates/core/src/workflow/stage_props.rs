//! Property-based tests for the stage invariant and the state machine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::workflow::service::WorkflowService;
use crate::workflow::types::{
    ApplicationStatus, ApprovalStage, StageRecord, StageTimeline, WorkflowState,
};

/// Strategy for a single stage slot: unset, open, or completed.
fn slot_strategy() -> impl Strategy<Value = StageRecord> {
    (
        proptest::option::of(1i64..1000),
        proptest::bool::ANY,
        proptest::option::of(1i64..1000),
    )
        .prop_map(|(assignee, done, group)| StageRecord {
            assignee_id: assignee,
            group_id: group,
            completed_at: (assignee.is_some() && done)
                .then(|| Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()),
            remarks: None,
        })
}

fn timeline_strategy() -> impl Strategy<Value = StageTimeline> {
    [
        slot_strategy(),
        slot_strategy(),
        slot_strategy(),
        slot_strategy(),
    ]
    .prop_map(StageTimeline::new)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For any combination of slots, the derived stage is the first slot with
    /// an assignee and no timestamp, or completed; and re-deriving is
    /// idempotent.
    #[test]
    fn prop_current_stage_is_first_open_slot(timeline in timeline_strategy()) {
        let derived = timeline.current_stage();

        match derived.index() {
            Some(i) => {
                // Every earlier slot is either unset or completed.
                for (stage, record) in timeline.iter() {
                    let Some(j) = stage.index() else { break };
                    if j < i {
                        prop_assert!(!record.is_actionable());
                    }
                    if j == i {
                        prop_assert!(record.is_actionable());
                    }
                }
            }
            None => {
                prop_assert_eq!(derived, ApprovalStage::Completed);
                for (_, record) in timeline.iter() {
                    prop_assert!(!record.is_actionable());
                }
            }
        }

        // Total and idempotent.
        prop_assert_eq!(timeline.current_stage(), derived);
    }

    /// Approving a pending request either advances the derived stage or
    /// completes the chain; it never moves the stage backwards.
    #[test]
    fn prop_approve_never_moves_backwards(
        timeline in timeline_strategy(),
        actor in 1i64..1000,
    ) {
        let state = WorkflowState::pending(timeline);
        let before = state.stages.current_stage();

        match WorkflowService::approve(&state, actor, None, None) {
            Ok((next, outcome)) => {
                prop_assert_eq!(outcome.stage, before);
                let after = next.stages.current_stage();
                prop_assert_eq!(after, outcome.next_stage);
                match (before.index(), after.index()) {
                    (Some(b), Some(a)) => prop_assert!(a > b),
                    (Some(_), None) => {
                        prop_assert_eq!(next.status, ApplicationStatus::Approved);
                    }
                    _ => prop_assert!(false, "approved from a completed timeline"),
                }
            }
            Err(_) => {
                // Only a fully exhausted timeline refuses a pending approve.
                prop_assert_eq!(before, ApprovalStage::Completed);
            }
        }
    }

    /// Repeating the same approve call on the already-advanced state never
    /// stamps the same stage twice.
    #[test]
    fn prop_no_double_advance(
        timeline in timeline_strategy(),
        actor in 1i64..1000,
    ) {
        let state = WorkflowState::pending(timeline);
        let claimed = state.stages.current_stage();
        prop_assume!(claimed != ApprovalStage::Completed);

        let (advanced, _) = WorkflowService::approve(&state, actor, Some(claimed), None).unwrap();

        // A second caller racing with the same claimed stage loses.
        let second = WorkflowService::approve(&advanced, actor, Some(claimed), None);
        prop_assert!(second.is_err());
    }

    /// Rejection is terminal regardless of where the chain stood.
    #[test]
    fn prop_reject_is_terminal(timeline in timeline_strategy(), actor in 1i64..1000) {
        let state = WorkflowState::pending(timeline);
        let (rejected, _) = WorkflowService::reject(&state, actor, "no").unwrap();

        prop_assert_eq!(rejected.status, ApplicationStatus::Rejected);
        prop_assert!(WorkflowService::approve(&rejected, actor, None, None).is_err());
        prop_assert!(WorkflowService::reject(&rejected, actor, "again").is_err());
    }
}
