//! Per-employee, per-leave-type annual balance arithmetic.
//!
//! The balance is computed, never stored: the ledger is the set of approved
//! application rows. Approved reversal rows carry negative days and restore
//! balance through the same aggregate; cancelled originals drop out of it.
//! The "decrement" is therefore a re-validation gate, not a mutation.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::workflow::error::WorkflowError;

/// A computed leave balance snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeaveBalance {
    /// The employee.
    pub user_id: i64,
    /// The leave type charged.
    pub leave_type_id: i64,
    /// The balance year.
    pub year: i32,
    /// Entitled days for the year (zero when no entitlement row exists).
    pub entitlement: Decimal,
    /// Sum of `total_days` over approved applications for the year,
    /// including negative reversal rows.
    pub used: Decimal,
}

impl LeaveBalance {
    /// Days remaining in the balance.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.entitlement - self.used
    }

    /// Verifies the balance can absorb `requested` days.
    ///
    /// Negative or zero requests (reversal rows) always pass: they only ever
    /// restore balance.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InsufficientBalance`] when the request would
    /// drive the balance negative. Never clamps, never partially applies.
    pub fn check_sufficient(&self, requested: Decimal) -> Result<(), WorkflowError> {
        if requested <= Decimal::ZERO {
            return Ok(());
        }
        let available = self.remaining();
        if requested > available {
            return Err(WorkflowError::InsufficientBalance {
                requested,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(entitlement: Decimal, used: Decimal) -> LeaveBalance {
        LeaveBalance {
            user_id: 1,
            leave_type_id: 1,
            year: 2025,
            entitlement,
            used,
        }
    }

    #[test]
    fn test_remaining() {
        assert_eq!(balance(dec!(10), dec!(3)).remaining(), dec!(7));
        assert_eq!(balance(dec!(10), dec!(0)).remaining(), dec!(10));
    }

    #[test]
    fn test_reversal_rows_restore_balance() {
        // Original charged 3, reversal charged -3.
        let b = balance(dec!(10), dec!(3) + dec!(-3));
        assert_eq!(b.remaining(), dec!(10));
    }

    #[test]
    fn test_sufficient() {
        assert!(balance(dec!(10), dec!(3)).check_sufficient(dec!(7)).is_ok());
        assert!(balance(dec!(10), dec!(3))
            .check_sufficient(dec!(0.5))
            .is_ok());
    }

    #[test]
    fn test_insufficient() {
        let result = balance(dec!(10), dec!(8)).check_sufficient(dec!(2.5));
        match result {
            Err(WorkflowError::InsufficientBalance {
                requested,
                available,
            }) => {
                assert_eq!(requested, dec!(2.5));
                assert_eq!(available, dec!(2));
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_request_always_passes() {
        // Reversal of 3 days against an exhausted balance is legitimate.
        assert!(balance(dec!(10), dec!(10))
            .check_sufficient(dec!(-3))
            .is_ok());
    }

    #[test]
    fn test_missing_entitlement_is_zero() {
        let result = balance(dec!(0), dec!(0)).check_sufficient(dec!(1));
        assert!(matches!(
            result,
            Err(WorkflowError::InsufficientBalance { .. })
        ));
    }
}
