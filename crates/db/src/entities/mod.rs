//! `SeaORM` entity definitions.

pub mod applications;
pub mod delegation_group_members;
pub mod delegation_groups;
pub mod department_group_members;
pub mod department_groups;
pub mod leave_entitlements;
pub mod leave_types;
pub mod sea_orm_active_enums;
pub mod users;
