//! `SeaORM` Entity for the delegation groups table.
//!
//! A delegation group is the set of users authorized to act at one approval
//! stage. Membership is read live at action time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "delegation_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delegation_group_members::Entity")]
    DelegationGroupMembers,
}

impl Related<super::delegation_group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DelegationGroupMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
