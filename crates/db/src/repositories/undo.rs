//! Cancellation requests and reversal rows.
//!
//! Both undo paths are themselves rows in the applications table. A
//! cancellation request copies the original's dates and walks the
//! requester's own chain; its completion, not its creation, flips the
//! original to cancelled. A reversal row carries the negated day count and
//! restores balance through the ordinary approved-rows aggregate once it
//! completes.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use kintai_core::workflow::{
    timeline_from_assignments, ApplicationStatus, RequestKind, WorkflowError, WorkflowService,
    WorkflowState,
};

use crate::entities::{applications, sea_orm_active_enums as db_enums};

use super::application::CreatedApplication;
use super::{convert, directory, workflow};

/// Repository for the two undo paths over approved requests.
#[derive(Debug, Clone)]
pub struct UndoRepository {
    db: DatabaseConnection,
}

impl UndoRepository {
    /// Creates a new undo repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Files a cancellation request against an approved request.
    ///
    /// The request copies the original's kind, dates, and days, and routes
    /// through the requester's own approval chain, which is the applicant's
    /// chain when they file for themselves and the privileged actor's chain
    /// when filed on the applicant's behalf. With no configured chain it
    /// completes immediately and cancels the original in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the original is missing, not approved, already
    /// reversed, not an ordinary request, the requester is neither the owner
    /// nor privileged, another undo is already pending, or a database
    /// operation fails.
    pub async fn create_cancellation_request(
        &self,
        original_id: i64,
        requester_id: i64,
        reason: &str,
    ) -> Result<CreatedApplication, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::CancellationReasonRequired);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let original = workflow::find_locked(&txn, original_id).await?;
        check_undo_target(&original)?;

        let requester = directory::require_user(&txn, requester_id).await?;
        if original.user_id != requester_id && !directory::is_privileged(&requester) {
            return Err(WorkflowError::PrivilegeRequired {
                user_id: requester_id,
                operation: "cancel another user's request",
            });
        }

        if pending_undo_exists(&txn, original_id).await? {
            return Err(WorkflowError::Validation(
                "an undo is already pending for this request".to_string(),
            ));
        }

        let assignments = directory::chain_assignments(&txn, requester_id).await?;
        let timeline = timeline_from_assignments(&assignments);
        let status = if timeline.has_assignees() {
            ApplicationStatus::Pending
        } else {
            ApplicationStatus::Approved
        };
        let state = WorkflowState {
            status,
            stages: timeline,
        };

        let now = Utc::now().into();
        let mut active = applications::ActiveModel {
            user_id: Set(original.user_id),
            request_kind: Set(original.request_kind),
            leave_type_id: Set(original.leave_type_id),
            year: Set(original.year),
            start_date: Set(original.start_date),
            end_date: Set(original.end_date),
            start_session: Set(original.start_session),
            end_session: Set(original.end_session),
            total_days: Set(original.total_days),
            reason: Set(Some(reason.to_string())),
            flow_type: Set(db_enums::FlowType::EFlow),
            is_paper_flow: Set(false),
            is_cancellation_request: Set(true),
            original_application_id: Set(Some(original_id)),
            is_reversal_transaction: Set(false),
            reversal_of_application_id: Set(None),
            is_reversed: Set(false),
            reversal_completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        convert::apply_state(&mut active, &state);

        let application = active
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        if status == ApplicationStatus::Approved {
            // No chain to walk: the cancellation completes immediately.
            finalize_cancellation(&txn, &application).await?;
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(
            original_id,
            cancellation_request_id = application.id,
            requester_id,
            immediate = status == ApplicationStatus::Approved,
            "filed cancellation request"
        );

        Ok(CreatedApplication {
            application,
            assignments,
        })
    }

    /// Creates a reversal row against an approved leave request.
    ///
    /// The row carries the negated day count. A privileged actor's reversal
    /// completes immediately; anyone else's routes through their own chain
    /// and takes effect on final approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the original is missing, not approved, already
    /// reversed, not an ordinary leave request, the actor is neither the
    /// owner nor privileged, another undo is already pending, or a database
    /// operation fails.
    pub async fn create_reversal(
        &self,
        original_id: i64,
        actor_id: i64,
        reason: &str,
    ) -> Result<CreatedApplication, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "reversal reason is required".to_string(),
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let original = workflow::find_locked(&txn, original_id).await?;
        check_undo_target(&original)?;

        if convert::kind_to_core(original.request_kind) != RequestKind::Leave {
            return Err(WorkflowError::Validation(
                "only leave requests can be reversed".to_string(),
            ));
        }

        let actor = directory::require_user(&txn, actor_id).await?;
        let privileged = directory::is_privileged(&actor);
        if !privileged && original.user_id != actor_id {
            return Err(WorkflowError::PrivilegeRequired {
                user_id: actor_id,
                operation: "reverse another user's request",
            });
        }

        if pending_undo_exists(&txn, original_id).await? {
            return Err(WorkflowError::Validation(
                "an undo is already pending for this request".to_string(),
            ));
        }

        let assignments = if privileged {
            vec![]
        } else {
            directory::chain_assignments(&txn, actor_id).await?
        };
        let timeline = timeline_from_assignments(&assignments);
        let status = if timeline.has_assignees() {
            ApplicationStatus::Pending
        } else {
            ApplicationStatus::Approved
        };
        let state = WorkflowState {
            status,
            stages: timeline,
        };

        let now = Utc::now().into();
        let mut active = applications::ActiveModel {
            user_id: Set(original.user_id),
            request_kind: Set(original.request_kind),
            leave_type_id: Set(original.leave_type_id),
            year: Set(original.year),
            start_date: Set(original.start_date),
            end_date: Set(original.end_date),
            start_session: Set(original.start_session),
            end_session: Set(original.end_session),
            total_days: Set(-original.total_days),
            reason: Set(Some(reason.to_string())),
            flow_type: Set(db_enums::FlowType::EFlow),
            is_paper_flow: Set(false),
            is_cancellation_request: Set(false),
            original_application_id: Set(None),
            is_reversal_transaction: Set(true),
            reversal_of_application_id: Set(Some(original_id)),
            is_reversed: Set(false),
            reversal_completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        convert::apply_state(&mut active, &state);

        let application = active
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        if status == ApplicationStatus::Approved {
            finalize_reversal(&txn, &application).await?;
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(
            original_id,
            reversal_id = application.id,
            actor_id,
            immediate = status == ApplicationStatus::Approved,
            "created reversal"
        );

        Ok(CreatedApplication {
            application,
            assignments,
        })
    }
}

/// True when any undo row, of either kind, is still pending against the
/// original. The two undo paths are mutually exclusive while one is in
/// flight; otherwise a completed reversal and a completed cancellation would
/// each undo the original's ledger effect.
async fn pending_undo_exists<C: ConnectionTrait>(
    conn: &C,
    original_id: i64,
) -> Result<bool, WorkflowError> {
    let row = applications::Entity::find()
        .filter(applications::Column::Status.eq(db_enums::ApplicationStatus::Pending))
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(applications::Column::OriginalApplicationId.eq(original_id))
                        .add(applications::Column::IsCancellationRequest.eq(true)),
                )
                .add(
                    Condition::all()
                        .add(applications::Column::ReversalOfApplicationId.eq(original_id))
                        .add(applications::Column::IsReversalTransaction.eq(true)),
                ),
        )
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;
    Ok(row.is_some())
}

/// An undo must target an ordinary approved request that has not already
/// been reversed.
fn check_undo_target(original: &applications::Model) -> Result<(), WorkflowError> {
    if original.is_cancellation_request || original.is_reversal_transaction {
        return Err(WorkflowError::Validation(
            "only ordinary requests can be undone".to_string(),
        ));
    }
    if original.is_reversed {
        return Err(WorkflowError::AlreadyReversed(original.id));
    }
    let status = convert::status_to_core(&original.status);
    if status != ApplicationStatus::Approved {
        return Err(WorkflowError::OriginalNotApproved { status });
    }
    Ok(())
}

/// Applies a completed cancellation request: flips the original to
/// cancelled, stamped with the requester and the request's reason.
pub(crate) async fn finalize_cancellation<C: ConnectionTrait>(
    conn: &C,
    request: &applications::Model,
) -> Result<(), WorkflowError> {
    let original_id = request.original_application_id.ok_or_else(|| {
        WorkflowError::Database(format!(
            "cancellation request {} has no original",
            request.id
        ))
    })?;

    let original = workflow::find_locked(conn, original_id).await?;
    if original.is_reversed {
        // A reversal already netted out the original's days; cancelling it
        // too would restore them twice.
        return Err(WorkflowError::AlreadyReversed(original_id));
    }
    let state = convert::workflow_state(&original);
    let reason = request.reason.clone().unwrap_or_default();

    let (next_state, outcome) = WorkflowService::cancel(&state, request.user_id, &reason)?;

    let mut active: applications::ActiveModel = original.into();
    convert::apply_state(&mut active, &next_state);
    active.cancelled_by_id = Set(Some(outcome.cancelled_by));
    active.cancelled_at = Set(Some(outcome.cancelled_at.into()));
    active.cancellation_reason = Set(Some(outcome.reason));
    active.updated_at = Set(Utc::now().into());

    active
        .update(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    tracing::info!(original_id, request_id = request.id, "cancelled original request");
    Ok(())
}

/// Applies a completed reversal: marks the original as reversed so it drops
/// out of the overlap guard while its days stay netted by the negative row.
pub(crate) async fn finalize_reversal<C: ConnectionTrait>(
    conn: &C,
    reversal: &applications::Model,
) -> Result<(), WorkflowError> {
    let original_id = reversal.reversal_of_application_id.ok_or_else(|| {
        WorkflowError::Database(format!("reversal {} has no original", reversal.id))
    })?;

    let original = workflow::find_locked(conn, original_id).await?;
    if original.is_reversed {
        return Err(WorkflowError::AlreadyReversed(original_id));
    }
    let status = convert::status_to_core(&original.status);
    if status != ApplicationStatus::Approved {
        return Err(WorkflowError::OriginalNotApproved { status });
    }

    let now = Utc::now();
    let mut active: applications::ActiveModel = original.into();
    active.is_reversed = Set(true);
    active.reversal_completed_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());

    active
        .update(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    tracing::info!(original_id, reversal_id = reversal.id, "reversed original request");
    Ok(())
}
