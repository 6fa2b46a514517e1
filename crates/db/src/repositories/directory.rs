//! Directory lookups: users, delegation groups, department chains.
//!
//! The free functions are generic over the connection so the workflow
//! repository can reuse them inside an open transaction; the repository
//! struct is the plain out-of-transaction surface.

use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use kintai_core::workflow::{
    assign_steps, resolve_steps, DepartmentChain, StageAssignment, WorkflowError,
};

use crate::entities::{
    delegation_group_members, department_group_members, department_groups,
    sea_orm_active_enums::UserRole, users,
};

/// Read-only repository over the directory tables.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    db: DatabaseConnection,
}

impl DirectoryRepository {
    /// Creates a new directory repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_user(&self, user_id: i64) -> Result<Option<users::Model>, WorkflowError> {
        find_user(&self.db, user_id).await
    }

    /// Finds a user by id, failing when absent.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UserNotFound`] when no such user exists.
    pub async fn require_user(&self, user_id: i64) -> Result<users::Model, WorkflowError> {
        require_user(&self.db, user_id).await
    }

    /// Member user ids of a delegation group, in position order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn group_member_ids(&self, group_id: i64) -> Result<Vec<i64>, WorkflowError> {
        group_member_ids(&self.db, group_id).await
    }

    /// Email addresses for a set of users, skipping inactive accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_emails(&self, user_ids: &[i64]) -> Result<Vec<String>, WorkflowError> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids.to_vec()))
            .filter(users::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|u| u.email).collect())
    }

    /// The approval chain bound to the user's department group, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn department_chain_for(
        &self,
        user_id: i64,
    ) -> Result<Option<DepartmentChain>, WorkflowError> {
        department_chain_for(&self.db, user_id).await
    }
}

pub(crate) async fn find_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<Option<users::Model>, WorkflowError> {
    users::Entity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))
}

pub(crate) async fn require_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<users::Model, WorkflowError> {
    find_user(conn, user_id)
        .await?
        .ok_or(WorkflowError::UserNotFound(user_id))
}

pub(crate) async fn group_member_ids<C: ConnectionTrait>(
    conn: &C,
    group_id: i64,
) -> Result<Vec<i64>, WorkflowError> {
    let rows = delegation_group_members::Entity::find()
        .filter(delegation_group_members::Column::DelegationGroupId.eq(group_id))
        .order_by_asc(delegation_group_members::Column::Position)
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;
    Ok(rows.into_iter().map(|m| m.user_id).collect())
}

/// Delegation groups the user belongs to.
pub(crate) async fn member_delegation_group_ids<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<Vec<i64>, WorkflowError> {
    let rows = delegation_group_members::Entity::find()
        .filter(delegation_group_members::Column::UserId.eq(user_id))
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;
    Ok(rows.into_iter().map(|m| m.delegation_group_id).collect())
}

pub(crate) async fn department_chain_for<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<Option<DepartmentChain>, WorkflowError> {
    let membership = department_group_members::Entity::find()
        .filter(department_group_members::Column::UserId.eq(user_id))
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    let Some(membership) = membership else {
        return Ok(None);
    };

    let group = department_groups::Entity::find_by_id(membership.department_group_id)
        .filter(department_groups::Column::IsActive.eq(true))
        .one(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    Ok(group.map(|g| DepartmentChain {
        checker_group_id: g.checker_group_id,
        approver1_group_id: g.approver_1_group_id,
        approver2_group_id: g.approver_2_group_id,
        approver3_group_id: g.approver_3_group_id,
    }))
}

/// Resolves and snapshots the user's own approval chain: ordered steps from
/// the department group, first live member of each delegation group as the
/// stage assignee. No department group or no members anywhere yields an empty
/// list, which admission treats as auto-approved.
pub(crate) async fn chain_assignments<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<Vec<StageAssignment>, WorkflowError> {
    let Some(chain) = department_chain_for(conn, user_id).await? else {
        return Ok(vec![]);
    };
    let steps = resolve_steps(&chain);

    let mut member_lists = Vec::with_capacity(steps.len());
    for step in &steps {
        member_lists.push(group_member_ids(conn, step.delegation_group_id).await?);
    }

    let mut lists = member_lists.into_iter();
    Ok(assign_steps(&steps, |_| lists.next().unwrap_or_default()))
}

/// True when the user's role grants the HR reject carve-out.
pub(crate) fn is_hr(user: &users::Model) -> bool {
    user.role == UserRole::Hr
}

/// True when the user may record paper-flow entries and direct reversals.
pub(crate) fn is_privileged(user: &users::Model) -> bool {
    user.role == UserRole::Admin
}
