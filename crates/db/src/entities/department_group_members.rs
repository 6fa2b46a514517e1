//! `SeaORM` Entity for department group membership.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "department_group_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub department_group_id: i64,
    pub user_id: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department_groups::Entity",
        from = "Column::DepartmentGroupId",
        to = "super::department_groups::Column::Id"
    )]
    DepartmentGroups,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::department_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DepartmentGroups.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
