//! Admission and querying of request rows.
//!
//! Creation resolves the applicant's approval chain, snapshots stage
//! assignees, and runs the overlap and balance gates inside one transaction
//! so a concurrent admission cannot slip past either check.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use kintai_core::calendar;
use kintai_core::workflow::{
    timeline_from_assignments, ApplicationStatus, DaySession, FlowType, RequestKind, StageAssignment,
    WorkflowError, WorkflowState,
};

use crate::entities::{applications, leave_types, sea_orm_active_enums as db_enums};

use super::{balance, convert, directory, overlap};

/// Input for admitting a new request.
#[derive(Debug, Clone)]
pub struct CreateApplicationInput {
    /// The applicant the request belongs to.
    pub user_id: i64,
    /// Request kind.
    pub kind: RequestKind,
    /// Leave type; required for leave, forbidden otherwise.
    pub leave_type_id: Option<i64>,
    /// Balance year; derived from the start date when absent.
    pub year: Option<i32>,
    /// Inclusive range start.
    pub start_date: NaiveDate,
    /// Inclusive range end.
    pub end_date: NaiveDate,
    /// Half-day marker on the start date.
    pub start_session: Option<DaySession>,
    /// Half-day marker on the end date.
    pub end_session: Option<DaySession>,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Admission path.
    pub flow_type: FlowType,
}

/// A newly admitted request with its snapshot assignments.
#[derive(Debug, Clone)]
pub struct CreatedApplication {
    /// The inserted row.
    pub application: applications::Model,
    /// Stage assignments snapshotted at admission, first stage first.
    pub assignments: Vec<StageAssignment>,
}

/// Repository for admitting and reading request rows.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    db: DatabaseConnection,
}

impl ApplicationRepository {
    /// Creates a new application repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Admits a new request.
    ///
    /// E-flow requests are submitted by the applicant and start pending at
    /// the first configured stage; an empty chain admits them directly as
    /// approved. Paper-flow entries require a privileged actor, may be
    /// recorded on behalf of any user, and are created already approved with
    /// no stage slots.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the range overlaps an active
    /// request, the balance cannot absorb the days, the actor lacks the
    /// required privilege, or a database operation fails.
    #[allow(clippy::too_many_lines)]
    pub async fn create(
        &self,
        actor_id: i64,
        input: CreateApplicationInput,
    ) -> Result<CreatedApplication, WorkflowError> {
        let actor = directory::require_user(&self.db, actor_id).await?;

        match input.flow_type {
            FlowType::PaperFlow => {
                if !directory::is_privileged(&actor) {
                    return Err(WorkflowError::PrivilegeRequired {
                        user_id: actor_id,
                        operation: "record a paper-flow entry",
                    });
                }
            }
            FlowType::EFlow => {
                if input.user_id != actor_id {
                    return Err(WorkflowError::Validation(
                        "requests can only be submitted for oneself".to_string(),
                    ));
                }
            }
        }

        if input.user_id != actor_id {
            directory::require_user(&self.db, input.user_id).await?;
        }

        let total_days = calendar::total_days(
            input.start_date,
            input.end_date,
            input.start_session,
            input.end_session,
        )?;
        let year = input
            .year
            .unwrap_or_else(|| calendar::derive_year(input.start_date));

        // The leave type id to charge, when the balance gate applies.
        let balance_scope = match input.kind {
            RequestKind::Leave => {
                let Some(leave_type_id) = input.leave_type_id else {
                    return Err(WorkflowError::Validation(
                        "leave requests require a leave type".to_string(),
                    ));
                };
                let leave_type = leave_types::Entity::find_by_id(leave_type_id)
                    .filter(leave_types::Column::IsActive.eq(true))
                    .one(&self.db)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?
                    .ok_or_else(|| {
                        WorkflowError::Validation(format!("unknown leave type {leave_type_id}"))
                    })?;
                leave_type.requires_balance.then_some(leave_type_id)
            }
            RequestKind::Overtime | RequestKind::OutdoorWork => {
                if input.leave_type_id.is_some() {
                    return Err(WorkflowError::Validation(
                        "leave type only applies to leave requests".to_string(),
                    ));
                }
                None
            }
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        overlap::check_no_overlap(
            &txn,
            input.user_id,
            input.kind,
            input.start_date,
            input.end_date,
            None,
        )
        .await?;

        if let Some(leave_type_id) = balance_scope {
            balance::computed_balance(&txn, input.user_id, leave_type_id, year)
                .await?
                .check_sufficient(total_days)?;
        }

        let assignments = match input.flow_type {
            FlowType::PaperFlow => vec![],
            FlowType::EFlow => directory::chain_assignments(&txn, input.user_id).await?,
        };

        let timeline = timeline_from_assignments(&assignments);
        let status = if timeline.has_assignees() {
            ApplicationStatus::Pending
        } else {
            // No chain to walk: admitted directly as approved.
            ApplicationStatus::Approved
        };
        let state = WorkflowState {
            status,
            stages: timeline,
        };

        let now = Utc::now().into();
        let mut active = applications::ActiveModel {
            user_id: Set(input.user_id),
            request_kind: Set(convert::kind_to_db(input.kind)),
            leave_type_id: Set(input.leave_type_id),
            year: Set(year),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            start_session: Set(input.start_session.map(convert::session_to_db)),
            end_session: Set(input.end_session.map(convert::session_to_db)),
            total_days: Set(total_days),
            reason: Set(input.reason),
            flow_type: Set(convert::flow_to_db(input.flow_type)),
            is_paper_flow: Set(input.flow_type == FlowType::PaperFlow),
            is_cancellation_request: Set(false),
            original_application_id: Set(None),
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

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(
            application_id = application.id,
            user_id = application.user_id,
            kind = %input.kind.as_str(),
            status = ?application.status,
            "admitted request"
        );

        Ok(CreatedApplication {
            application,
            assignments,
        })
    }

    /// Finds a request by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        application_id: i64,
    ) -> Result<Option<applications::Model>, WorkflowError> {
        applications::Entity::find_by_id(application_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// All requests belonging to a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<applications::Model>, WorkflowError> {
        applications::Entity::find()
            .filter(applications::Column::UserId.eq(user_id))
            .order_by_desc(applications::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Pending requests waiting on the given user: the stamped assignee of
    /// the current stage, or any member of its delegation group.
    ///
    /// The whole predicate runs in SQL over the stage cache and the inline
    /// slot columns, so the table is never scanned into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_for_actor(
        &self,
        user_id: i64,
    ) -> Result<Vec<applications::Model>, WorkflowError> {
        let memberships = directory::member_delegation_group_ids(&self.db, user_id).await?;

        let slots = [
            (
                db_enums::ApprovalStage::Checker,
                applications::Column::CheckerId,
                applications::Column::CheckerGroupId,
            ),
            (
                db_enums::ApprovalStage::Approver1,
                applications::Column::Approver1Id,
                applications::Column::Approver1GroupId,
            ),
            (
                db_enums::ApprovalStage::Approver2,
                applications::Column::Approver2Id,
                applications::Column::Approver2GroupId,
            ),
            (
                db_enums::ApprovalStage::Approver3,
                applications::Column::Approver3Id,
                applications::Column::Approver3GroupId,
            ),
        ];

        let mut waiting_on_actor = Condition::any();
        for (stage, assignee, group) in slots {
            let mut actor = Condition::any().add(assignee.eq(user_id));
            if !memberships.is_empty() {
                actor = actor.add(group.is_in(memberships.clone()));
            }
            waiting_on_actor = waiting_on_actor.add(
                Condition::all()
                    .add(applications::Column::CurrentApprovalStage.eq(stage))
                    .add(actor),
            );
        }

        applications::Entity::find()
            .filter(applications::Column::Status.eq(db_enums::ApplicationStatus::Pending))
            .filter(waiting_on_actor)
            .order_by_desc(applications::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }
}
