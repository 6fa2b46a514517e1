//! Approval workflow for leave, overtime, and outdoor-work requests.
//!
//! The three request kinds share one workflow shape, so the state machine is
//! implemented once over [`types::WorkflowState`] and instantiated per kind by
//! the storage layer.
//!
//! # Modules
//!
//! - `types` - Domain types (statuses, stages, the stage timeline invariant)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic
//! - `authorize` - Stage authorization predicate
//! - `chain` - Approval chain resolution from department configuration

pub mod authorize;
pub mod chain;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod stage_props;

pub use authorize::{can_act_on_stage, can_reject_at_stage};
pub use chain::{
    assign_steps, resolve_steps, timeline_from_assignments, ChainStep, DepartmentChain,
    StageAssignment,
};
pub use error::{ConflictingApplication, WorkflowError};
pub use service::{ApproveOutcome, CancelOutcome, RejectOutcome, WorkflowService};
pub use types::{
    transaction_code, ApplicationStatus, ApprovalStage, DaySession, FlowType, RequestKind,
    StageRecord, StageTimeline, WorkflowState,
};
