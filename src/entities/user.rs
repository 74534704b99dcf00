use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub ssh_public_key: Option<String>,
    pub shell_id: Option<i32>,
    pub access_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shell::Entity",
        from = "Column::ShellId",
        to = "super::shell::Column::Id",
        on_delete = "SetNull"
    )]
    Shell,
    #[sea_orm(
        belongs_to = "super::access::Entity",
        from = "Column::AccessId",
        to = "super::access::Column::Id",
        on_delete = "SetNull"
    )]
    Access,
    #[sea_orm(has_many = "super::group_user::Entity")]
    GroupUsers,
}

impl Related<super::shell::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shell.def()
    }
}

impl Related<super::access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Access.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_user::Relation::Group.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::group_user::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
