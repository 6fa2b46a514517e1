//! `SeaORM` Entity for the leave entitlements table.
//!
//! One row per (user, leave type, year): the credit side of the computed
//! balance. A missing row means zero entitlement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_entitlements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub leave_type_id: i64,
    pub year: i32,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub entitled_days: Decimal,
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
