//! Core business logic for Kintai.
//!
//! This crate contains the leave/attendance approval engine and the pure
//! arithmetic surrounding it. It has zero web or database dependencies:
//! everything here is deterministic and unit-testable in isolation.
//!
//! # Modules
//!
//! - `workflow` - Approval state machine, chain resolver, authorization
//! - `balance` - Per-employee, per-leave-type annual balance arithmetic
//! - `calendar` - Date-range overlap and half-day duration math

pub mod balance;
pub mod calendar;
pub mod workflow;

#[cfg(test)]
mod calendar_props;
