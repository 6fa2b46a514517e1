//! Overlap guard over stored date ranges.
//!
//! Ranges are inclusive on both edges, so sharing a boundary date conflicts.
//! Reversal rows, already-reversed originals, and cancellation-request rows
//! never count: the first two are ledger bookkeeping, and a cancellation
//! request deliberately copies the dates of the original it targets.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use kintai_core::workflow::{ConflictingApplication, RequestKind, WorkflowError};

use crate::entities::{applications, leave_types, sea_orm_active_enums as db_enums};

use super::convert;

/// Active rows of the same kind for the user whose range intersects
/// `[start_date, end_date]`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn find_overlapping<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    kind: RequestKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<Vec<applications::Model>, WorkflowError> {
    let mut query = applications::Entity::find()
        .filter(applications::Column::UserId.eq(user_id))
        .filter(applications::Column::RequestKind.eq(convert::kind_to_db(kind)))
        .filter(applications::Column::Status.is_in([
            db_enums::ApplicationStatus::Pending,
            db_enums::ApplicationStatus::Approved,
        ]))
        .filter(applications::Column::IsCancellationRequest.eq(false))
        .filter(applications::Column::IsReversalTransaction.eq(false))
        .filter(applications::Column::IsReversed.eq(false))
        .filter(applications::Column::StartDate.lte(end_date))
        .filter(applications::Column::EndDate.gte(start_date));

    if let Some(id) = exclude_id {
        query = query.filter(applications::Column::Id.ne(id));
    }

    query
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))
}

/// Builds the conflict summaries reported to the client, resolving leave
/// type names in one query.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn conflicts_of<C: ConnectionTrait>(
    conn: &C,
    rows: &[applications::Model],
) -> Result<Vec<ConflictingApplication>, WorkflowError> {
    let type_ids: Vec<i64> = rows.iter().filter_map(|r| r.leave_type_id).collect();

    let names: Vec<(i64, String)> = if type_ids.is_empty() {
        vec![]
    } else {
        leave_types::Entity::find()
            .filter(leave_types::Column::Id.is_in(type_ids))
            .all(conn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect()
    };

    let name_of = |id: Option<i64>| {
        id.and_then(|id| {
            names
                .iter()
                .find(|(type_id, _)| *type_id == id)
                .map(|(_, name)| name.clone())
        })
    };

    Ok(rows
        .iter()
        .map(|row| convert::conflict_of(row, name_of(row.leave_type_id)))
        .collect())
}

/// Fails with [`WorkflowError::OverlapConflict`] when the range intersects an
/// active row.
///
/// # Errors
///
/// Returns [`WorkflowError::OverlapConflict`] on intersection, or a database
/// error.
pub async fn check_no_overlap<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    kind: RequestKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<(), WorkflowError> {
    let rows = find_overlapping(conn, user_id, kind, start_date, end_date, exclude_id).await?;
    if rows.is_empty() {
        return Ok(());
    }
    let conflicts = conflicts_of(conn, &rows).await?;
    Err(WorkflowError::OverlapConflict { conflicts })
}
