//! `SeaORM` Entity for the department groups table.
//!
//! A department group binds up to four delegation groups, one per approval
//! stage. Unset slots shorten the chain.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "department_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub checker_group_id: Option<i64>,
    pub approver_1_group_id: Option<i64>,
    pub approver_2_group_id: Option<i64>,
    pub approver_3_group_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::department_group_members::Entity")]
    DepartmentGroupMembers,
}

impl Related<super::department_group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DepartmentGroupMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
