//! Date-range and half-day duration math.
//!
//! Leave spans are inclusive calendar date ranges with optional AM/PM session
//! markers on each edge. Day counts are `Decimal` in 0.5 increments; floats
//! are banned workspace-wide.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::DaySession;

/// Half a day.
pub const HALF_DAY: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// True if two inclusive date ranges intersect.
///
/// Boundary dates overlap: `[1..5]` and `[5..10]` conflict.
#[must_use]
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// The balance year a range is charged against when none is supplied.
///
/// Derived once at admission from the start date and stored; never re-derived
/// afterwards.
#[must_use]
pub fn derive_year(start_date: NaiveDate) -> i32 {
    start_date.year()
}

/// Computes the total charged days for a range with half-day edges.
///
/// The full inclusive span counts one day per date; a PM start and an AM end
/// each shave off half a day. A single-day PM..AM combination is malformed.
///
/// # Errors
///
/// Returns [`WorkflowError::Validation`] when the end precedes the start or
/// the session combination leaves nothing to charge.
pub fn total_days(
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_session: Option<DaySession>,
    end_session: Option<DaySession>,
) -> Result<Decimal, WorkflowError> {
    if end_date < start_date {
        return Err(WorkflowError::Validation(format!(
            "end date {end_date} precedes start date {start_date}"
        )));
    }

    let span = (end_date - start_date).num_days() + 1;
    let mut days = Decimal::from(span);

    if start_session == Some(DaySession::Pm) {
        days -= HALF_DAY;
    }
    if end_session == Some(DaySession::Am) {
        days -= HALF_DAY;
    }

    if days < HALF_DAY {
        return Err(WorkflowError::Validation(
            "session combination leaves no chargeable time".to_string(),
        ));
    }

    Ok(days)
}
