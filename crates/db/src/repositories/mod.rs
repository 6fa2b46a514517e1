//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod application;
pub mod balance;
mod convert;
pub mod directory;
pub mod overlap;
pub mod undo;
pub mod workflow;

#[cfg(test)]
mod workflow_integration_tests;

pub use application::{ApplicationRepository, CreateApplicationInput, CreatedApplication};
pub use balance::BalanceRepository;
pub use directory::DirectoryRepository;
pub use undo::UndoRepository;
pub use workflow::{ApprovalResult, WorkflowRepository};
