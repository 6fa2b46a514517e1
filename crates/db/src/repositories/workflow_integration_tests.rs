//! Integration tests for the request workflow.
//!
//! Exercises full lifecycles against the in-memory state machine: admission
//! through a resolved chain, stage-by-stage approval, the HR reject
//! carve-out, cancellation requests, and reversal balance restoration.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use kintai_core::balance::LeaveBalance;
    use kintai_core::calendar;
    use kintai_core::workflow::{
        assign_steps, can_act_on_stage, can_reject_at_stage, resolve_steps,
        timeline_from_assignments, ApplicationStatus, ApprovalStage, DaySession,
        DepartmentChain, StageAssignment, WorkflowError, WorkflowService, WorkflowState,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn full_chain() -> DepartmentChain {
        DepartmentChain {
            checker_group_id: Some(10),
            approver1_group_id: Some(11),
            approver2_group_id: Some(12),
            approver3_group_id: Some(13),
        }
    }

    /// Group 10 -> users 101/102, 11 -> 201, 12 -> 301, 13 -> 401.
    fn members_of(group_id: i64) -> Vec<i64> {
        match group_id {
            10 => vec![101, 102],
            11 => vec![201],
            12 => vec![301],
            13 => vec![401],
            _ => vec![],
        }
    }

    fn admitted_state(chain: &DepartmentChain) -> (WorkflowState, Vec<StageAssignment>) {
        let steps = resolve_steps(chain);
        let assignments = assign_steps(&steps, members_of);
        let timeline = timeline_from_assignments(&assignments);
        let status = if timeline.has_assignees() {
            ApplicationStatus::Pending
        } else {
            ApplicationStatus::Approved
        };
        (WorkflowState { status, stages: timeline }, assignments)
    }

    // ========================================================================
    // Full lifecycle: four-stage chain walked to approval
    // ========================================================================

    #[test]
    fn test_full_chain_lifecycle() {
        let (mut state, assignments) = admitted_state(&full_chain());
        assert_eq!(assignments.len(), 4);
        assert_eq!(state.stages.current_stage(), ApprovalStage::Checker);

        let actors = [101, 201, 301, 401];
        for (i, actor) in actors.iter().enumerate() {
            let record = state.stages.record(state.stages.current_stage()).unwrap();
            let members = members_of(record.group_id.unwrap());
            assert!(can_act_on_stage(*actor, record.assignee_id, &members));

            let (next, outcome) = WorkflowService::approve(&state, *actor, None, None).unwrap();
            assert_eq!(outcome.is_final(), i == actors.len() - 1);
            state = next;
        }

        assert_eq!(state.status, ApplicationStatus::Approved);
        assert_eq!(state.stages.current_stage(), ApprovalStage::Completed);
    }

    #[test]
    fn test_short_chain_skips_unset_slots() {
        let chain = DepartmentChain {
            checker_group_id: Some(10),
            approver1_group_id: None,
            approver2_group_id: Some(12),
            approver3_group_id: None,
        };
        let (state, assignments) = admitted_state(&chain);

        assert_eq!(assignments.len(), 2);
        let (mid, _) = WorkflowService::approve(&state, 101, None, None).unwrap();
        assert_eq!(mid.stages.current_stage(), ApprovalStage::Approver2);

        let (done, outcome) = WorkflowService::approve(&mid, 301, None, None).unwrap();
        assert!(outcome.is_final());
        assert_eq!(done.status, ApplicationStatus::Approved);
    }

    #[test]
    fn test_empty_chain_is_admitted_approved() {
        let (state, assignments) = admitted_state(&DepartmentChain::default());
        assert!(assignments.is_empty());
        assert_eq!(state.status, ApplicationStatus::Approved);
    }

    // ========================================================================
    // Delegation and stale-stage races
    // ========================================================================

    #[test]
    fn test_group_member_may_act_for_snapshot_assignee() {
        let (state, _) = admitted_state(&full_chain());
        let record = state.stages.record(ApprovalStage::Checker).unwrap();

        // 102 is a live member of group 10 but not the snapshot assignee.
        assert_eq!(record.assignee_id, Some(101));
        assert!(can_act_on_stage(102, record.assignee_id, &members_of(10)));
        assert!(!can_act_on_stage(999, record.assignee_id, &members_of(10)));

        let (next, _) = WorkflowService::approve(&state, 102, None, None).unwrap();
        // The acting delegate is stamped, not the snapshot assignee.
        let stamped = next.stages.record(ApprovalStage::Checker).unwrap();
        assert_eq!(stamped.assignee_id, Some(102));
    }

    #[test]
    fn test_racing_approver_loses_on_stale_stage() {
        let (state, _) = admitted_state(&full_chain());

        let (advanced, _) =
            WorkflowService::approve(&state, 101, Some(ApprovalStage::Checker), None).unwrap();

        // Second caller still claims checker; the derived stage moved on.
        let result = WorkflowService::approve(&advanced, 102, Some(ApprovalStage::Checker), None);
        assert!(matches!(
            result,
            Err(WorkflowError::StageMismatch {
                claimed: ApprovalStage::Checker,
                actual: ApprovalStage::Approver1,
            })
        ));
    }

    // ========================================================================
    // HR reject carve-out
    // ========================================================================

    #[test]
    fn test_hr_rejects_at_non_terminal_stage() {
        let (state, _) = admitted_state(&full_chain());
        let record = state.stages.record(ApprovalStage::Checker).unwrap();

        // 555 is in no delegation group; the HR flag alone authorizes.
        assert!(can_reject_at_stage(
            555,
            ApprovalStage::Checker,
            record.assignee_id,
            &members_of(10),
            true,
        ));
        assert!(!can_reject_at_stage(
            555,
            ApprovalStage::Checker,
            record.assignee_id,
            &members_of(10),
            false,
        ));
    }

    #[test]
    fn test_hr_cannot_reject_at_final_stage() {
        assert!(!can_reject_at_stage(
            555,
            ApprovalStage::Approver3,
            Some(401),
            &members_of(13),
            true,
        ));
        // The stage's own assignee still can.
        assert!(can_reject_at_stage(
            401,
            ApprovalStage::Approver3,
            Some(401),
            &members_of(13),
            false,
        ));
    }

    // ========================================================================
    // Cancellation requests and reversals
    // ========================================================================

    #[test]
    fn test_cancellation_request_lifecycle() {
        // Original request, fully approved.
        let (mut original, _) = admitted_state(&full_chain());
        for actor in [101, 201, 301, 401] {
            original = WorkflowService::approve(&original, actor, None, None).unwrap().0;
        }
        assert_eq!(original.status, ApplicationStatus::Approved);

        // The cancellation request walks the requester's chain.
        let (mut request, _) = admitted_state(&full_chain());
        for actor in [101, 201, 301, 401] {
            request = WorkflowService::approve(&request, actor, None, None).unwrap().0;
        }
        assert_eq!(request.status, ApplicationStatus::Approved);

        // Completion of the request is what flips the original.
        let (cancelled, outcome) =
            WorkflowService::cancel(&original, 7, "plans changed").unwrap();
        assert_eq!(cancelled.status, ApplicationStatus::Cancelled);
        assert_eq!(outcome.cancelled_by, 7);
    }

    #[test]
    fn test_cancellation_of_unapproved_original_fails() {
        let (pending, _) = admitted_state(&full_chain());
        let result = WorkflowService::cancel(&pending, 7, "too soon");
        assert!(matches!(
            result,
            Err(WorkflowError::OriginalNotApproved {
                status: ApplicationStatus::Pending,
            })
        ));
    }

    #[test]
    fn test_reversal_restores_balance_through_aggregate() {
        let entitlement = dec!(10);
        let days = calendar::total_days(d(2025, 6, 10), d(2025, 6, 12), None, None).unwrap();
        assert_eq!(days, dec!(3));

        // Approved original charges the aggregate.
        let charged = LeaveBalance {
            user_id: 1,
            leave_type_id: 1,
            year: 2025,
            entitlement,
            used: days,
        };
        assert_eq!(charged.remaining(), dec!(7));

        // The approved reversal row nets the aggregate back out.
        let restored = LeaveBalance {
            used: days + (-days),
            ..charged
        };
        assert_eq!(restored.remaining(), entitlement);
        assert!(restored.check_sufficient(dec!(10)).is_ok());
    }

    #[test]
    fn test_half_day_request_against_half_day_balance() {
        let days = calendar::total_days(
            d(2025, 6, 10),
            d(2025, 6, 10),
            Some(DaySession::Am),
            Some(DaySession::Am),
        )
        .unwrap();

        let balance = LeaveBalance {
            user_id: 1,
            leave_type_id: 1,
            year: 2025,
            entitlement: dec!(10),
            used: dec!(9.5),
        };
        assert!(balance.check_sufficient(days).is_ok());
        assert!(balance.check_sufficient(days + days).is_err());
    }

    // ========================================================================
    // Property tests
    // ========================================================================

    /// Strategy over chains with an arbitrary subset of slots configured.
    fn chain_strategy() -> impl Strategy<Value = DepartmentChain> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(c, a1, a2, a3)| {
            DepartmentChain {
                checker_group_id: c.then_some(10),
                approver1_group_id: a1.then_some(11),
                approver2_group_id: a2.then_some(12),
                approver3_group_id: a3.then_some(13),
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// Walking every configured stage of any chain ends approved, with
        /// exactly one stamp per configured stage.
        #[test]
        fn prop_any_chain_walks_to_approved(chain in chain_strategy()) {
            let (mut state, assignments) = admitted_state(&chain);

            let mut approvals = 0usize;
            while state.status == ApplicationStatus::Pending {
                let stage = state.stages.current_stage();
                let assignee = state.stages.record(stage).unwrap().assignee_id.unwrap();
                state = WorkflowService::approve(&state, assignee, Some(stage), None).unwrap().0;
                approvals += 1;
            }

            prop_assert_eq!(approvals, assignments.len());
            prop_assert_eq!(state.status, ApplicationStatus::Approved);
            prop_assert_eq!(state.stages.current_stage(), ApprovalStage::Completed);
        }

        /// Snapshot assignees always come from the configured group, in
        /// chain order.
        #[test]
        fn prop_assignments_follow_chain_order(chain in chain_strategy()) {
            let steps = resolve_steps(&chain);
            let assignments = assign_steps(&steps, members_of);

            prop_assert_eq!(assignments.len(), steps.len());
            for (step, assignment) in steps.iter().zip(&assignments) {
                prop_assert_eq!(assignment.stage, step.stage);
                prop_assert!(
                    members_of(step.delegation_group_id).contains(&assignment.assignee_id)
                );
            }
            for pair in assignments.windows(2) {
                prop_assert!(pair[0].stage.index() < pair[1].stage.index());
            }
        }

        /// A rejected request refuses every further transition.
        #[test]
        fn prop_rejection_is_terminal(chain in chain_strategy()) {
            let (state, _) = admitted_state(&chain);
            prop_assume!(state.status == ApplicationStatus::Pending);

            let (rejected, _) = WorkflowService::reject(&state, 555, "incomplete").unwrap();
            prop_assert!(WorkflowService::approve(&rejected, 101, None, None).is_err());
            prop_assert!(WorkflowService::reject(&rejected, 555, "again").is_err());
            prop_assert!(WorkflowService::cancel(&rejected, 1, "undo").is_err());
        }
    }
}
