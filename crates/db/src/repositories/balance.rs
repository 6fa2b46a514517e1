//! Computed leave balances.
//!
//! The balance is never stored. The credit side is the entitlement row for
//! (user, leave type, year); the debit side is the sum of `total_days` over
//! approved leave rows for that scope, which already nets out reversals
//! (negative days) and drops cancelled originals.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};

use kintai_core::balance::LeaveBalance;
use kintai_core::workflow::WorkflowError;

use crate::entities::{applications, leave_entitlements, sea_orm_active_enums as db_enums};

/// Read-only repository computing balances from the ledger.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The balance for one (user, leave type, year) scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn computed_balance(
        &self,
        user_id: i64,
        leave_type_id: i64,
        year: i32,
    ) -> Result<LeaveBalance, WorkflowError> {
        computed_balance(&self.db, user_id, leave_type_id, year).await
    }

    /// Every balance the user holds an entitlement for in `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balances_for_user(
        &self,
        user_id: i64,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, WorkflowError> {
        let entitlements = leave_entitlements::Entity::find()
            .filter(leave_entitlements::Column::UserId.eq(user_id))
            .filter(leave_entitlements::Column::Year.eq(year))
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let mut balances = Vec::with_capacity(entitlements.len());
        for entitlement in entitlements {
            balances
                .push(computed_balance(&self.db, user_id, entitlement.leave_type_id, year).await?);
        }
        Ok(balances)
    }
}

/// Computes a balance inside any connection, including an open transaction.
pub(crate) async fn computed_balance<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    leave_type_id: i64,
    year: i32,
) -> Result<LeaveBalance, WorkflowError> {
    let entitlement = leave_entitlements::Entity::find()
        .filter(leave_entitlements::Column::UserId.eq(user_id))
        .filter(leave_entitlements::Column::LeaveTypeId.eq(leave_type_id))
        .filter(leave_entitlements::Column::Year.eq(year))
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?
        .map_or(Decimal::ZERO, |e| e.entitled_days);

    let approved = applications::Entity::find()
        .filter(applications::Column::UserId.eq(user_id))
        .filter(applications::Column::RequestKind.eq(db_enums::RequestKind::Leave))
        .filter(applications::Column::LeaveTypeId.eq(leave_type_id))
        .filter(applications::Column::Year.eq(year))
        .filter(applications::Column::Status.eq(db_enums::ApplicationStatus::Approved))
        .filter(applications::Column::IsCancellationRequest.eq(false))
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    let used: Decimal = approved.iter().map(|row| row.total_days).sum();

    Ok(LeaveBalance {
        user_id,
        leave_type_id,
        year,
        entitlement,
        used,
    })
}
