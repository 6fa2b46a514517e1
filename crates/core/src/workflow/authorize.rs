//! Stage authorization predicate.
//!
//! Two separate concepts, never conflated: the assignee stamped at creation
//! is a historical snapshot, while the delegation group bound to a stage is
//! re-checked live — anyone currently in that group may act, including people
//! who joined after the chain was resolved.

use crate::workflow::types::ApprovalStage;

/// Whether `actor_id` may approve the given stage.
///
/// Checks the direct id first, then live group membership; the dual path must
/// be evaluated in that order (group membership is the common case for anyone
/// who joined the authorizing group after the chain was resolved).
#[must_use]
pub fn can_act_on_stage(
    actor_id: i64,
    stamped_assignee: Option<i64>,
    live_group_members: &[i64],
) -> bool {
    if stamped_assignee == Some(actor_id) {
        return true;
    }
    live_group_members.contains(&actor_id)
}

/// Whether `actor_id` may reject the request at the given stage.
///
/// Same predicate as approval, plus the HR carve-out: an HR-role actor may
/// reject while the current stage is checker/approver_1/approver_2. The
/// carve-out is reject-only and does not extend to the last stage.
#[must_use]
pub fn can_reject_at_stage(
    actor_id: i64,
    stage: ApprovalStage,
    stamped_assignee: Option<i64>,
    live_group_members: &[i64],
    actor_is_hr: bool,
) -> bool {
    if can_act_on_stage(actor_id, stamped_assignee, live_group_members) {
        return true;
    }
    actor_is_hr
        && matches!(
            stage,
            ApprovalStage::Checker | ApprovalStage::Approver1 | ApprovalStage::Approver2
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_assignee_can_act() {
        assert!(can_act_on_stage(7, Some(7), &[]));
    }

    #[test]
    fn test_live_group_member_can_act() {
        // Actor 9 joined the delegation group after the chain was resolved.
        assert!(can_act_on_stage(9, Some(7), &[7, 8, 9]));
    }

    #[test]
    fn test_outsider_cannot_act() {
        assert!(!can_act_on_stage(3, Some(7), &[7, 8]));
    }

    #[test]
    fn test_unassigned_stage_falls_back_to_group() {
        assert!(can_act_on_stage(8, None, &[8]));
        assert!(!can_act_on_stage(8, None, &[]));
    }

    #[test]
    fn test_hr_can_reject_at_early_stages() {
        for stage in [
            ApprovalStage::Checker,
            ApprovalStage::Approver1,
            ApprovalStage::Approver2,
        ] {
            assert!(can_reject_at_stage(99, stage, Some(7), &[7], true));
        }
    }

    #[test]
    fn test_hr_cannot_reject_at_last_stage() {
        assert!(!can_reject_at_stage(
            99,
            ApprovalStage::Approver3,
            Some(7),
            &[7],
            true
        ));
    }

    #[test]
    fn test_non_hr_cannot_use_carve_out() {
        assert!(!can_reject_at_stage(
            99,
            ApprovalStage::Checker,
            Some(7),
            &[7],
            false
        ));
    }

    #[test]
    fn test_stage_actor_can_reject_without_hr() {
        assert!(can_reject_at_stage(
            8,
            ApprovalStage::Approver3,
            Some(7),
            &[7, 8],
            false
        ));
    }
}
