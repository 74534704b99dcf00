use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_user::Entity")]
    GroupUsers,
    #[sea_orm(has_many = "super::group_instance::Entity")]
    GroupInstances,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_user::Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::group_user::Relation::Group.def().rev())
    }
}

impl Related<super::instance::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_instance::Relation::Instance.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::group_instance::Relation::Group.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
