//! Workflow repository for request state transitions.
//!
//! Every transition locks the row with `SELECT ... FOR UPDATE`, re-derives
//! the current stage from the stage slots, and runs its gates inside the
//! same transaction before anything is stamped. Two racing approvers
//! serialize on the row lock; the loser re-derives a stage that no longer
//! matches and fails cleanly.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect, Set,
    TransactionTrait,
};

use kintai_core::workflow::{
    can_act_on_stage, can_reject_at_stage, ApplicationStatus, ApprovalStage, ApproveOutcome,
    RequestKind, WorkflowError, WorkflowService,
};

use crate::entities::{applications, leave_types};

use super::{balance, convert, directory, overlap, undo};

/// Result of a successful approval.
#[derive(Debug, Clone)]
pub struct ApprovalResult {
    /// The updated row.
    pub application: applications::Model,
    /// What the transition did.
    pub outcome: ApproveOutcome,
    /// Live members of the next stage's delegation group; empty on final
    /// approval.
    pub next_stage_notify: Vec<i64>,
}

/// Workflow repository for request state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Advances a pending request by one stage.
    ///
    /// The actor must be the stamped assignee of the derived current stage
    /// or a live member of its delegation group. On final approval the
    /// overlap and balance gates re-run against the stored days before the
    /// stamp is persisted, and cancellation-request or reversal rows apply
    /// their ledger effect to the original inside the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing or not pending, the actor
    /// is not authorized, a claimed stage is stale, a final-approval gate
    /// fails, or a database operation fails.
    pub async fn approve_application(
        &self,
        application_id: i64,
        actor_id: i64,
        claimed_stage: Option<ApprovalStage>,
        remarks: Option<String>,
    ) -> Result<ApprovalResult, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let model = find_locked(&txn, application_id).await?;
        let state = convert::workflow_state(&model);
        let actual = state.stages.current_stage();

        if state.status == ApplicationStatus::Pending {
            if let Some(record) = state.stages.record(actual) {
                let members = match record.group_id {
                    Some(group_id) => directory::group_member_ids(&txn, group_id).await?,
                    None => vec![],
                };
                if !can_act_on_stage(actor_id, record.assignee_id, &members) {
                    return Err(WorkflowError::NotAuthorizedForStage {
                        user_id: actor_id,
                        stage: actual,
                    });
                }
            }
        }

        let (next_state, outcome) =
            WorkflowService::approve(&state, actor_id, claimed_stage, remarks)?;

        if outcome.is_final() {
            if model.is_cancellation_request {
                undo::finalize_cancellation(&txn, &model).await?;
            } else if model.is_reversal_transaction {
                undo::finalize_reversal(&txn, &model).await?;
            } else {
                final_gates(&txn, &model).await?;
            }
        }

        let mut active: applications::ActiveModel = model.clone().into();
        convert::apply_state(&mut active, &next_state);
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let next_stage_notify = if outcome.is_final() {
            vec![]
        } else {
            match next_state
                .stages
                .record(outcome.next_stage)
                .and_then(|r| r.group_id)
            {
                Some(group_id) => directory::group_member_ids(&txn, group_id).await?,
                None => vec![],
            }
        };

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(
            application_id,
            actor_id,
            stage = %outcome.stage,
            final_approval = outcome.is_final(),
            "approved stage"
        );

        Ok(ApprovalResult {
            application: updated,
            outcome,
            next_stage_notify,
        })
    }

    /// Rejects a pending request. Terminal.
    ///
    /// Stage authorization matches approval, with one carve-out: an HR actor
    /// may reject while the derived stage is checker or approver_1/approver_2.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing or not pending, the reason
    /// is blank, the actor may not reject at the derived stage, or a
    /// database operation fails.
    pub async fn reject_application(
        &self,
        application_id: i64,
        actor_id: i64,
        reason: &str,
    ) -> Result<applications::Model, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let model = find_locked(&txn, application_id).await?;
        let state = convert::workflow_state(&model);

        let (next_state, outcome) = WorkflowService::reject(&state, actor_id, reason)?;

        let actual = state.stages.current_stage();
        let Some(record) = state.stages.record(actual) else {
            return Err(WorkflowError::Validation(
                "request has no actionable stage".to_string(),
            ));
        };

        let actor = directory::require_user(&txn, actor_id).await?;
        let members = match record.group_id {
            Some(group_id) => directory::group_member_ids(&txn, group_id).await?,
            None => vec![],
        };
        if !can_reject_at_stage(
            actor_id,
            actual,
            record.assignee_id,
            &members,
            directory::is_hr(&actor),
        ) {
            return Err(WorkflowError::NotAuthorizedForStage {
                user_id: actor_id,
                stage: actual,
            });
        }

        let mut active: applications::ActiveModel = model.into();
        convert::apply_state(&mut active, &next_state);
        active.rejected_by_id = Set(Some(outcome.rejected_by));
        active.rejected_at = Set(Some(outcome.rejected_at.into()));
        active.rejection_reason = Set(Some(outcome.reason));
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(application_id, actor_id, stage = %actual, "rejected request");

        Ok(updated)
    }
}

/// Fetches a request under `SELECT ... FOR UPDATE`.
pub(crate) async fn find_locked<C: ConnectionTrait>(
    conn: &C,
    application_id: i64,
) -> Result<applications::Model, WorkflowError> {
    applications::Entity::find_by_id(application_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?
        .ok_or(WorkflowError::ApplicationNotFound(application_id))
}

/// Final-approval gates for an ordinary request: no overlap with other
/// active rows, and a balance that still absorbs the stored days.
async fn final_gates<C: ConnectionTrait>(
    conn: &C,
    model: &applications::Model,
) -> Result<(), WorkflowError> {
    let kind = convert::kind_to_core(model.request_kind);

    overlap::check_no_overlap(
        conn,
        model.user_id,
        kind,
        model.start_date,
        model.end_date,
        Some(model.id),
    )
    .await?;

    if kind != RequestKind::Leave {
        return Ok(());
    }
    let Some(leave_type_id) = model.leave_type_id else {
        return Ok(());
    };

    let leave_type = leave_types::Entity::find_by_id(leave_type_id)
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;
    let requires_balance = leave_type.is_some_and(|t| t.requires_balance);

    if requires_balance {
        balance::computed_balance(conn, model.user_id, leave_type_id, model.year)
            .await?
            .check_sufficient(model.total_days)?;
    }
    Ok(())
}
