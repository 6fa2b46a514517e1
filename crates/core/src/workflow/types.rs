//! Workflow domain types for request lifecycle management.
//!
//! This module defines the statuses, stages, and the stage timeline whose
//! derived current-stage function is the single source of truth for where a
//! pending request sits in its approval chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request status in the approval workflow.
///
/// Requests progress through these states from creation to a terminal state.
/// The valid transitions are:
/// - Pending → Pending (intermediate stage approval)
/// - Pending → Approved (final stage approval, or paper-flow at creation)
/// - Pending → Rejected (reject)
/// - Approved → Cancelled (completion of a cancellation request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Request is waiting at some approval stage.
    Pending,
    /// Request passed every configured stage; its days are charged.
    Approved,
    /// Request was rejected by an approver or HR. Terminal.
    Rejected,
    /// Request was cancelled through a completed cancellation request. Terminal.
    Cancelled,
}

impl ApplicationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A slot in the approval chain.
///
/// `Completed` is the derived value for a request with no stage left to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    /// First slot: the checker.
    Checker,
    /// Second slot.
    Approver1,
    /// Third slot.
    Approver2,
    /// Fourth and last slot.
    Approver3,
    /// No actionable stage remains.
    Completed,
}

impl ApprovalStage {
    /// The four actionable slots, in chain order.
    pub const ACTIONABLE: [Self; 4] = [
        Self::Checker,
        Self::Approver1,
        Self::Approver2,
        Self::Approver3,
    ];

    /// Returns the string representation of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checker => "checker",
            Self::Approver1 => "approver_1",
            Self::Approver2 => "approver_2",
            Self::Approver3 => "approver_3",
            Self::Completed => "completed",
        }
    }

    /// Parses a stage from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checker" => Some(Self::Checker),
            "approver_1" => Some(Self::Approver1),
            "approver_2" => Some(Self::Approver2),
            "approver_3" => Some(Self::Approver3),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Position of an actionable stage in the timeline, `None` for `Completed`.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Checker => Some(0),
            Self::Approver1 => Some(1),
            Self::Approver2 => Some(2),
            Self::Approver3 => Some(3),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of request flowing through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Leave request, charged against an annual balance.
    Leave,
    /// Overtime request.
    Overtime,
    /// Outdoor-work request.
    OutdoorWork,
}

impl RequestKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Overtime => "overtime",
            Self::OutdoorWork => "outdoor_work",
        }
    }

    /// Parses a kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "leave" => Some(Self::Leave),
            "overtime" => Some(Self::Overtime),
            "outdoor_work" => Some(Self::OutdoorWork),
            _ => None,
        }
    }

    /// Prefix used in presentation-only transaction codes.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::Leave => "LV",
            Self::Overtime => "OT",
            Self::OutdoorWork => "OD",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derives the zero-padded transaction code shown to users.
///
/// Presentation only, never a key.
#[must_use]
pub fn transaction_code(kind: RequestKind, id: i64) -> String {
    format!("{}-{:06}", kind.code_prefix(), id)
}

/// How a request entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    /// Normal multi-stage approval path.
    EFlow,
    /// Privileged direct-entry path, created already approved.
    PaperFlow,
}

impl FlowType {
    /// Returns the string representation of the flow type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EFlow => "e_flow",
            Self::PaperFlow => "paper_flow",
        }
    }

    /// Parses a flow type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "e_flow" => Some(Self::EFlow),
            "paper_flow" => Some(Self::PaperFlow),
            _ => None,
        }
    }
}

/// Half-day marker on a range edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaySession {
    /// Morning half.
    Am,
    /// Afternoon half.
    Pm,
}

impl DaySession {
    /// Returns the string representation of the session.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Am => "am",
            Self::Pm => "pm",
        }
    }

    /// Parses a session from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "am" => Some(Self::Am),
            "pm" => Some(Self::Pm),
            _ => None,
        }
    }
}

/// One slot of the approval chain as stamped on a request.
///
/// `assignee_id` is the historical snapshot picked at creation (overwritten
/// with the acting delegate's id when the stage completes); `group_id` is the
/// delegation group whose live membership authorizes the stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageRecord {
    /// Assignee snapshot, later the actor who completed the stage.
    pub assignee_id: Option<i64>,
    /// Delegation group authorized for this stage.
    pub group_id: Option<i64>,
    /// When the stage was completed, if it was.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optional remarks left by the actor.
    pub remarks: Option<String>,
}

impl StageRecord {
    /// True if the slot has an assignee but no completion timestamp yet.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        self.assignee_id.is_some() && self.completed_at.is_none()
    }
}

/// The four ordered stage slots of a request.
///
/// The current stage is always re-derivable from this timeline; any stored
/// stage column is a cache that must be resynchronized from
/// [`StageTimeline::current_stage`] after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageTimeline {
    records: [StageRecord; 4],
}

impl StageTimeline {
    /// Builds a timeline from four slots in chain order.
    #[must_use]
    pub const fn new(records: [StageRecord; 4]) -> Self {
        Self { records }
    }

    /// Returns the slot for an actionable stage, `None` for `Completed`.
    #[must_use]
    pub fn record(&self, stage: ApprovalStage) -> Option<&StageRecord> {
        stage.index().map(|i| &self.records[i])
    }

    /// Iterates slots in chain order together with their stage.
    pub fn iter(&self) -> impl Iterator<Item = (ApprovalStage, &StageRecord)> {
        ApprovalStage::ACTIONABLE
            .iter()
            .copied()
            .zip(self.records.iter())
    }

    /// The stage invariant: first slot with an assignee and no completion
    /// timestamp, `Completed` if none remain.
    ///
    /// Pure, total, and idempotent over any combination of slots.
    #[must_use]
    pub fn current_stage(&self) -> ApprovalStage {
        for (stage, record) in self.iter() {
            if record.is_actionable() {
                return stage;
            }
        }
        ApprovalStage::Completed
    }

    /// True if at least one slot has an assignee.
    #[must_use]
    pub fn has_assignees(&self) -> bool {
        self.records.iter().any(|r| r.assignee_id.is_some())
    }

    /// Stamps a stage as completed by `actor_id` at `now`.
    ///
    /// The actor may differ from the snapshot assignee (a delegate); the slot
    /// keeps the actor that actually acted.
    pub fn stamp(
        &mut self,
        stage: ApprovalStage,
        actor_id: i64,
        now: DateTime<Utc>,
        remarks: Option<String>,
    ) {
        if let Some(i) = stage.index() {
            self.records[i].assignee_id = Some(actor_id);
            self.records[i].completed_at = Some(now);
            self.records[i].remarks = remarks;
        }
    }
}

/// The workflow-relevant projection of a stored request.
///
/// Storage maps each request row (leave, overtime, or outdoor work) into this
/// shape, runs the state machine, and maps the result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    /// Current request status.
    pub status: ApplicationStatus,
    /// The four stage slots.
    pub stages: StageTimeline,
}

impl WorkflowState {
    /// Creates a pending state over a freshly resolved timeline.
    #[must_use]
    pub const fn pending(stages: StageTimeline) -> Self {
        Self {
            status: ApplicationStatus::Pending,
            stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn slot(assignee: Option<i64>, done: bool) -> StageRecord {
        StageRecord {
            assignee_id: assignee,
            group_id: assignee.map(|a| a + 100),
            completed_at: done.then(Utc::now),
            remarks: None,
        }
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(ApplicationStatus::Pending.as_str(), "pending");
        assert_eq!(ApplicationStatus::Approved.as_str(), "approved");
        assert_eq!(ApplicationStatus::Rejected.as_str(), "rejected");
        assert_eq!(ApplicationStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            ApplicationStatus::parse("PENDING"),
            Some(ApplicationStatus::Pending)
        );
        assert_eq!(
            ApplicationStatus::parse("cancelled"),
            Some(ApplicationStatus::Cancelled)
        );
        assert_eq!(ApplicationStatus::parse("draft"), None);
    }

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in ApprovalStage::ACTIONABLE {
            assert_eq!(ApprovalStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(
            ApprovalStage::parse("completed"),
            Some(ApprovalStage::Completed)
        );
        assert_eq!(ApprovalStage::parse("manager"), None);
    }

    #[test]
    fn test_transaction_code() {
        assert_eq!(transaction_code(RequestKind::Leave, 42), "LV-000042");
        assert_eq!(transaction_code(RequestKind::Overtime, 7), "OT-000007");
        assert_eq!(
            transaction_code(RequestKind::OutdoorWork, 123_456),
            "OD-123456"
        );
    }

    #[test]
    fn test_current_stage_first_open_slot() {
        let timeline = StageTimeline::new([
            slot(Some(1), true),
            slot(Some(2), false),
            slot(Some(3), false),
            slot(None, false),
        ]);
        assert_eq!(timeline.current_stage(), ApprovalStage::Approver1);
    }

    #[test]
    fn test_current_stage_skips_unset_slots() {
        let timeline = StageTimeline::new([
            slot(Some(1), true),
            slot(None, false),
            slot(Some(3), false),
            slot(None, false),
        ]);
        assert_eq!(timeline.current_stage(), ApprovalStage::Approver2);
    }

    #[test]
    fn test_current_stage_completed_when_all_done() {
        let timeline = StageTimeline::new([
            slot(Some(1), true),
            slot(Some(2), true),
            slot(None, false),
            slot(None, false),
        ]);
        assert_eq!(timeline.current_stage(), ApprovalStage::Completed);
    }

    #[test]
    fn test_current_stage_empty_timeline() {
        let timeline = StageTimeline::default();
        assert_eq!(timeline.current_stage(), ApprovalStage::Completed);
        assert!(!timeline.has_assignees());
    }

    #[test]
    fn test_stamp_advances_stage() {
        let mut timeline = StageTimeline::new([
            slot(Some(1), false),
            slot(Some(2), false),
            slot(None, false),
            slot(None, false),
        ]);
        assert_eq!(timeline.current_stage(), ApprovalStage::Checker);

        // A delegate (id 9) acts instead of the snapshot assignee (id 1).
        timeline.stamp(ApprovalStage::Checker, 9, Utc::now(), Some("ok".into()));
        assert_eq!(timeline.current_stage(), ApprovalStage::Approver1);
        let record = timeline.record(ApprovalStage::Checker).unwrap();
        assert_eq!(record.assignee_id, Some(9));
        assert!(record.completed_at.is_some());
    }
}
