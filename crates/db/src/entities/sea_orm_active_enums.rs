//! Postgres enum types mapped to Rust enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a request row.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "application_status")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Waiting at some approval stage.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Every configured stage acted; days are charged.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Terminally refused by an approver.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Terminally withdrawn after approval.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Cached current stage of the approval chain.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_stage")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    /// First slot.
    #[sea_orm(string_value = "checker")]
    Checker,
    /// Second slot.
    #[sea_orm(string_value = "approver_1")]
    Approver1,
    /// Third slot.
    #[sea_orm(string_value = "approver_2")]
    Approver2,
    /// Fourth slot.
    #[sea_orm(string_value = "approver_3")]
    Approver3,
    /// No actionable stage remains.
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// The kind of request a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "request_kind")]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Leave, charged against an annual balance.
    #[sea_orm(string_value = "leave")]
    Leave,
    /// Overtime.
    #[sea_orm(string_value = "overtime")]
    Overtime,
    /// Outdoor work.
    #[sea_orm(string_value = "outdoor_work")]
    OutdoorWork,
}

/// How the request entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "flow_type")]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    /// Normal multi-stage approval path.
    #[sea_orm(string_value = "e_flow")]
    EFlow,
    /// Privileged direct-entry path, created already approved.
    #[sea_orm(string_value = "paper_flow")]
    PaperFlow,
}

/// Half-day marker on a range edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "day_session")]
#[serde(rename_all = "snake_case")]
pub enum DaySession {
    /// Morning half.
    #[sea_orm(string_value = "am")]
    Am,
    /// Afternoon half.
    #[sea_orm(string_value = "pm")]
    Pm,
}

/// Directory role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular employee.
    #[sea_orm(string_value = "employee")]
    Employee,
    /// HR staff; may reject pending requests at non-terminal stages.
    #[sea_orm(string_value = "hr")]
    Hr,
    /// Privileged actor; may record paper-flow entries and direct reversals.
    #[sea_orm(string_value = "admin")]
    Admin,
}
