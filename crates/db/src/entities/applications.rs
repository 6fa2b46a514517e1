//! `SeaORM` Entity for the applications table.
//!
//! One row per request of any kind, including cancellation-request rows and
//! negative-days reversal rows. The four stage slots live inline; the current
//! stage column is a cache of the value derived from them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{
    ApplicationStatus, ApprovalStage, DaySession, FlowType, RequestKind,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub request_kind: RequestKind,
    pub leave_type_id: Option<i64>,
    pub year: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub start_session: Option<DaySession>,
    pub end_session: Option<DaySession>,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub total_days: Decimal,
    pub reason: Option<String>,
    pub status: ApplicationStatus,
    pub current_approval_stage: ApprovalStage,
    pub flow_type: FlowType,
    /// Mirrors `flow_type` for cheap filtering.
    pub is_paper_flow: bool,

    pub checker_id: Option<i64>,
    pub checker_group_id: Option<i64>,
    pub checker_at: Option<DateTimeWithTimeZone>,
    pub checker_remarks: Option<String>,
    pub approver_1_id: Option<i64>,
    pub approver_1_group_id: Option<i64>,
    pub approver_1_at: Option<DateTimeWithTimeZone>,
    pub approver_1_remarks: Option<String>,
    pub approver_2_id: Option<i64>,
    pub approver_2_group_id: Option<i64>,
    pub approver_2_at: Option<DateTimeWithTimeZone>,
    pub approver_2_remarks: Option<String>,
    pub approver_3_id: Option<i64>,
    pub approver_3_group_id: Option<i64>,
    pub approver_3_at: Option<DateTimeWithTimeZone>,
    pub approver_3_remarks: Option<String>,

    pub rejected_by_id: Option<i64>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub cancelled_by_id: Option<i64>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub cancellation_reason: Option<String>,

    pub is_cancellation_request: bool,
    pub original_application_id: Option<i64>,
    pub is_reversal_transaction: bool,
    pub reversal_of_application_id: Option<i64>,
    pub is_reversed: bool,
    pub reversal_completed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::leave_types::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_types::Column::Id"
    )]
    LeaveTypes,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::leave_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
