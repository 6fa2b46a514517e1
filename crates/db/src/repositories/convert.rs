//! Conversions between application rows and core workflow types.
//!
//! The stored `current_approval_stage` is a cache; loading goes through
//! [`workflow_state`] which rebuilds the timeline from the stage slots, and
//! saving goes through [`apply_state`] which resyncs the cache from the
//! derived value.

use chrono::Utc;
use sea_orm::Set;

use kintai_core::workflow::{
    transaction_code, ApplicationStatus, ApprovalStage, ConflictingApplication, DaySession,
    FlowType, RequestKind, StageRecord, StageTimeline, WorkflowState,
};

use crate::entities::{applications, sea_orm_active_enums as db_enums};

pub(crate) fn status_to_core(status: &db_enums::ApplicationStatus) -> ApplicationStatus {
    match status {
        db_enums::ApplicationStatus::Pending => ApplicationStatus::Pending,
        db_enums::ApplicationStatus::Approved => ApplicationStatus::Approved,
        db_enums::ApplicationStatus::Rejected => ApplicationStatus::Rejected,
        db_enums::ApplicationStatus::Cancelled => ApplicationStatus::Cancelled,
    }
}

pub(crate) const fn status_to_db(status: ApplicationStatus) -> db_enums::ApplicationStatus {
    match status {
        ApplicationStatus::Pending => db_enums::ApplicationStatus::Pending,
        ApplicationStatus::Approved => db_enums::ApplicationStatus::Approved,
        ApplicationStatus::Rejected => db_enums::ApplicationStatus::Rejected,
        ApplicationStatus::Cancelled => db_enums::ApplicationStatus::Cancelled,
    }
}

pub(crate) const fn stage_to_db(stage: ApprovalStage) -> db_enums::ApprovalStage {
    match stage {
        ApprovalStage::Checker => db_enums::ApprovalStage::Checker,
        ApprovalStage::Approver1 => db_enums::ApprovalStage::Approver1,
        ApprovalStage::Approver2 => db_enums::ApprovalStage::Approver2,
        ApprovalStage::Approver3 => db_enums::ApprovalStage::Approver3,
        ApprovalStage::Completed => db_enums::ApprovalStage::Completed,
    }
}

pub(crate) fn kind_to_core(kind: db_enums::RequestKind) -> RequestKind {
    match kind {
        db_enums::RequestKind::Leave => RequestKind::Leave,
        db_enums::RequestKind::Overtime => RequestKind::Overtime,
        db_enums::RequestKind::OutdoorWork => RequestKind::OutdoorWork,
    }
}

pub(crate) const fn kind_to_db(kind: RequestKind) -> db_enums::RequestKind {
    match kind {
        RequestKind::Leave => db_enums::RequestKind::Leave,
        RequestKind::Overtime => db_enums::RequestKind::Overtime,
        RequestKind::OutdoorWork => db_enums::RequestKind::OutdoorWork,
    }
}

pub(crate) const fn flow_to_db(flow: FlowType) -> db_enums::FlowType {
    match flow {
        FlowType::EFlow => db_enums::FlowType::EFlow,
        FlowType::PaperFlow => db_enums::FlowType::PaperFlow,
    }
}

pub(crate) const fn session_to_db(session: DaySession) -> db_enums::DaySession {
    match session {
        DaySession::Am => db_enums::DaySession::Am,
        DaySession::Pm => db_enums::DaySession::Pm,
    }
}

/// Rebuilds the stage timeline from the four inline slots of a row.
pub(crate) fn timeline_of(model: &applications::Model) -> StageTimeline {
    let slot = |id: Option<i64>,
                group: Option<i64>,
                at: Option<chrono::DateTime<chrono::FixedOffset>>,
                remarks: Option<String>| StageRecord {
        assignee_id: id,
        group_id: group,
        completed_at: at.map(|t| t.with_timezone(&Utc)),
        remarks,
    };

    StageTimeline::new([
        slot(
            model.checker_id,
            model.checker_group_id,
            model.checker_at,
            model.checker_remarks.clone(),
        ),
        slot(
            model.approver_1_id,
            model.approver_1_group_id,
            model.approver_1_at,
            model.approver_1_remarks.clone(),
        ),
        slot(
            model.approver_2_id,
            model.approver_2_group_id,
            model.approver_2_at,
            model.approver_2_remarks.clone(),
        ),
        slot(
            model.approver_3_id,
            model.approver_3_group_id,
            model.approver_3_at,
            model.approver_3_remarks.clone(),
        ),
    ])
}

/// Loads the workflow state of a row.
pub(crate) fn workflow_state(model: &applications::Model) -> WorkflowState {
    WorkflowState {
        status: status_to_core(&model.status),
        stages: timeline_of(model),
    }
}

/// Writes a workflow state back onto an active model, resyncing the stage
/// cache from the derived current stage.
pub(crate) fn apply_state(active: &mut applications::ActiveModel, state: &WorkflowState) {
    let records: Vec<&StageRecord> = state
        .stages
        .iter()
        .map(|(_, record)| record)
        .collect();

    let at = |record: &StageRecord| {
        record
            .completed_at
            .map(sea_orm::prelude::DateTimeWithTimeZone::from)
    };

    active.checker_id = Set(records[0].assignee_id);
    active.checker_group_id = Set(records[0].group_id);
    active.checker_at = Set(at(records[0]));
    active.checker_remarks = Set(records[0].remarks.clone());

    active.approver_1_id = Set(records[1].assignee_id);
    active.approver_1_group_id = Set(records[1].group_id);
    active.approver_1_at = Set(at(records[1]));
    active.approver_1_remarks = Set(records[1].remarks.clone());

    active.approver_2_id = Set(records[2].assignee_id);
    active.approver_2_group_id = Set(records[2].group_id);
    active.approver_2_at = Set(at(records[2]));
    active.approver_2_remarks = Set(records[2].remarks.clone());

    active.approver_3_id = Set(records[3].assignee_id);
    active.approver_3_group_id = Set(records[3].group_id);
    active.approver_3_at = Set(at(records[3]));
    active.approver_3_remarks = Set(records[3].remarks.clone());

    active.status = Set(status_to_db(state.status));
    // Rejected and cancelled rows keep their open slots unstamped, so the
    // derived value would still name that slot; terminal rows read completed.
    let cache = match state.status {
        ApplicationStatus::Pending | ApplicationStatus::Approved => state.stages.current_stage(),
        ApplicationStatus::Rejected | ApplicationStatus::Cancelled => ApprovalStage::Completed,
    };
    active.current_approval_stage = Set(stage_to_db(cache));
}

/// Builds the conflict summary reported for an overlapping row.
pub(crate) fn conflict_of(
    model: &applications::Model,
    leave_type_name: Option<String>,
) -> ConflictingApplication {
    ConflictingApplication {
        code: transaction_code(kind_to_core(model.request_kind), model.id),
        start_date: model.start_date,
        end_date: model.end_date,
        status: status_to_core(&model.status),
        leave_type_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_checker_state(status: ApplicationStatus) -> WorkflowState {
        WorkflowState {
            status,
            stages: StageTimeline::new([
                StageRecord {
                    assignee_id: Some(3),
                    group_id: Some(1),
                    completed_at: None,
                    remarks: None,
                },
                StageRecord::default(),
                StageRecord::default(),
                StageRecord::default(),
            ]),
        }
    }

    fn cache_of(state: &WorkflowState) -> db_enums::ApprovalStage {
        let mut active = applications::ActiveModel::default();
        apply_state(&mut active, state);
        active.current_approval_stage.unwrap()
    }

    #[test]
    fn test_pending_cache_tracks_open_stage() {
        let state = open_checker_state(ApplicationStatus::Pending);
        assert_eq!(cache_of(&state), db_enums::ApprovalStage::Checker);
    }

    #[test]
    fn test_rejected_cache_reads_completed() {
        // The checker slot stays unstamped after a rejection; the cache must
        // not resync back to it.
        let state = open_checker_state(ApplicationStatus::Rejected);
        assert_eq!(cache_of(&state), db_enums::ApprovalStage::Completed);
    }

    #[test]
    fn test_cancelled_cache_reads_completed() {
        let state = open_checker_state(ApplicationStatus::Cancelled);
        assert_eq!(cache_of(&state), db_enums::ApprovalStage::Completed);
    }
}
