//! Approval chain resolution from department configuration.
//!
//! A department group binds up to four delegation groups, one per stage.
//! Resolution is a pure read: unset slots are skipped, and the first member
//! of each delegation group becomes the stage's snapshot assignee — a
//! deterministic choice, not load balancing.

use crate::workflow::types::{ApprovalStage, StageRecord, StageTimeline};

/// The delegation-group bindings of an applicant's department group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepartmentChain {
    /// Delegation group for the checker stage.
    pub checker_group_id: Option<i64>,
    /// Delegation group for approver_1.
    pub approver1_group_id: Option<i64>,
    /// Delegation group for approver_2.
    pub approver2_group_id: Option<i64>,
    /// Delegation group for approver_3.
    pub approver3_group_id: Option<i64>,
}

/// One resolved step of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStep {
    /// The stage this step fills.
    pub stage: ApprovalStage,
    /// The delegation group authorized for the stage.
    pub delegation_group_id: i64,
}

/// A step with its concrete snapshot assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageAssignment {
    /// The stage this assignment fills.
    pub stage: ApprovalStage,
    /// The delegation group authorized for the stage.
    pub delegation_group_id: i64,
    /// The first member of the group at resolution time.
    pub assignee_id: i64,
}

/// Resolves the ordered steps of a department chain, skipping unset slots.
#[must_use]
pub fn resolve_steps(chain: &DepartmentChain) -> Vec<ChainStep> {
    let slots = [
        (ApprovalStage::Checker, chain.checker_group_id),
        (ApprovalStage::Approver1, chain.approver1_group_id),
        (ApprovalStage::Approver2, chain.approver2_group_id),
        (ApprovalStage::Approver3, chain.approver3_group_id),
    ];

    slots
        .into_iter()
        .filter_map(|(stage, group)| {
            group.map(|delegation_group_id| ChainStep {
                stage,
                delegation_group_id,
            })
        })
        .collect()
}

/// Picks the snapshot assignee for each step: the first member of its
/// delegation group. Steps whose group has no members are skipped — an empty
/// group can never act, so the stage is treated as unset.
pub fn assign_steps<F>(steps: &[ChainStep], mut members_of: F) -> Vec<StageAssignment>
where
    F: FnMut(i64) -> Vec<i64>,
{
    steps
        .iter()
        .filter_map(|step| {
            members_of(step.delegation_group_id)
                .first()
                .map(|&assignee_id| StageAssignment {
                    stage: step.stage,
                    delegation_group_id: step.delegation_group_id,
                    assignee_id,
                })
        })
        .collect()
}

/// Builds the stage timeline stamped onto a new request.
///
/// An empty assignment list yields an empty timeline, which the admission
/// path treats as auto-approved.
#[must_use]
pub fn timeline_from_assignments(assignments: &[StageAssignment]) -> StageTimeline {
    let mut records: [StageRecord; 4] = Default::default();
    for assignment in assignments {
        if let Some(i) = assignment.stage.index() {
            records[i] = StageRecord {
                assignee_id: Some(assignment.assignee_id),
                group_id: Some(assignment.delegation_group_id),
                completed_at: None,
                remarks: None,
            };
        }
    }
    StageTimeline::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_steps_full_chain() {
        let chain = DepartmentChain {
            checker_group_id: Some(10),
            approver1_group_id: Some(11),
            approver2_group_id: Some(12),
            approver3_group_id: Some(13),
        };
        let steps = resolve_steps(&chain);
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].stage, ApprovalStage::Checker);
        assert_eq!(steps[3].delegation_group_id, 13);
    }

    #[test]
    fn test_resolve_steps_skips_unset_slots() {
        let chain = DepartmentChain {
            checker_group_id: Some(10),
            approver1_group_id: None,
            approver2_group_id: Some(12),
            approver3_group_id: None,
        };
        let steps = resolve_steps(&chain);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].stage, ApprovalStage::Checker);
        assert_eq!(steps[1].stage, ApprovalStage::Approver2);
    }

    #[test]
    fn test_resolve_steps_empty_chain() {
        assert!(resolve_steps(&DepartmentChain::default()).is_empty());
    }

    #[test]
    fn test_assign_steps_picks_first_member() {
        let steps = vec![
            ChainStep {
                stage: ApprovalStage::Checker,
                delegation_group_id: 10,
            },
            ChainStep {
                stage: ApprovalStage::Approver1,
                delegation_group_id: 11,
            },
        ];

        let assignments = assign_steps(&steps, |group| match group {
            10 => vec![101, 102],
            11 => vec![201],
            _ => vec![],
        });

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].assignee_id, 101);
        assert_eq!(assignments[1].assignee_id, 201);
    }

    #[test]
    fn test_assign_steps_skips_empty_groups() {
        let steps = vec![ChainStep {
            stage: ApprovalStage::Checker,
            delegation_group_id: 10,
        }];
        let assignments = assign_steps(&steps, |_| vec![]);
        assert!(assignments.is_empty());
    }

    #[test]
    fn test_timeline_from_assignments() {
        let assignments = vec![
            StageAssignment {
                stage: ApprovalStage::Checker,
                delegation_group_id: 10,
                assignee_id: 101,
            },
            StageAssignment {
                stage: ApprovalStage::Approver2,
                delegation_group_id: 12,
                assignee_id: 301,
            },
        ];
        let timeline = timeline_from_assignments(&assignments);

        assert_eq!(timeline.current_stage(), ApprovalStage::Checker);
        let checker = timeline.record(ApprovalStage::Checker).unwrap();
        assert_eq!(checker.assignee_id, Some(101));
        assert_eq!(checker.group_id, Some(10));
        assert!(timeline
            .record(ApprovalStage::Approver1)
            .unwrap()
            .assignee_id
            .is_none());
    }

    #[test]
    fn test_empty_timeline_is_completed() {
        let timeline = timeline_from_assignments(&[]);
        assert_eq!(timeline.current_stage(), ApprovalStage::Completed);
        assert!(!timeline.has_assignees());
    }
}
