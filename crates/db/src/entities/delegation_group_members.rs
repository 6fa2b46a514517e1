//! `SeaORM` Entity for delegation group membership.
//!
//! Position gives the deterministic ordering used when snapshotting the
//! first member as a stage assignee.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "delegation_group_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub delegation_group_id: i64,
    pub user_id: i64,
    pub position: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delegation_groups::Entity",
        from = "Column::DelegationGroupId",
        to = "super::delegation_groups::Column::Id"
    )]
    DelegationGroups,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::delegation_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DelegationGroups.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
