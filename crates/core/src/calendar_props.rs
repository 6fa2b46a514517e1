//! Property-based tests for range overlap and half-day arithmetic.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::calendar::{ranges_overlap, total_days, HALF_DAY};
use crate::workflow::types::DaySession;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 always valid"))
}

fn range_strategy() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (date_strategy(), 0i64..60)
        .prop_map(|(start, span)| (start, start + chrono::Duration::days(span)))
}

fn session_strategy() -> impl Strategy<Value = Option<DaySession>> {
    prop_oneof![
        Just(None),
        Just(Some(DaySession::Am)),
        Just(Some(DaySession::Pm)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Overlap is symmetric and reflexive over inclusive ranges.
    #[test]
    fn prop_overlap_symmetric(a in range_strategy(), b in range_strategy()) {
        prop_assert_eq!(
            ranges_overlap(a.0, a.1, b.0, b.1),
            ranges_overlap(b.0, b.1, a.0, a.1)
        );
        prop_assert!(ranges_overlap(a.0, a.1, a.0, a.1));
    }

    /// Disjoint ranges never overlap; touching boundaries always do.
    #[test]
    fn prop_overlap_boundary(start in date_strategy(), span in 0i64..30) {
        let end = start + chrono::Duration::days(span);
        prop_assert!(ranges_overlap(start, end, end, end + chrono::Duration::days(5)));
        prop_assert!(!ranges_overlap(
            start,
            end,
            end + chrono::Duration::days(1),
            end + chrono::Duration::days(5)
        ));
    }

    /// A valid day count is always a positive multiple of half a day, no
    /// larger than the inclusive span, and sessions shave at most one day.
    #[test]
    fn prop_total_days_bounds(
        (start, end) in range_strategy(),
        start_session in session_strategy(),
        end_session in session_strategy(),
    ) {
        let span = Decimal::from((end - start).num_days() + 1);
        match total_days(start, end, start_session, end_session) {
            Ok(days) => {
                prop_assert!(days >= HALF_DAY);
                prop_assert!(days <= span);
                prop_assert!(days >= span - Decimal::ONE);
                // 0.5 grain: doubling yields an integer.
                let doubled = days + days;
                prop_assert_eq!(doubled, doubled.trunc());
            }
            Err(_) => {
                // Only the single-day PM..AM combination is refused.
                prop_assert_eq!(start, end);
                prop_assert_eq!(start_session, Some(DaySession::Pm));
                prop_assert_eq!(end_session, Some(DaySession::Am));
            }
        }
    }
}
