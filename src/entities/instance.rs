use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub instance_id: Option<String>, // provider-assigned id, never set by check-in
    pub name: String,
    pub role: String,
    #[sea_orm(column_type = "Json", nullable)]
    pub net: Option<Json>,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub last_seen: i64,
    #[sea_orm(column_type = "Json", nullable)]
    pub raw_payload: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_instance::Entity")]
    GroupInstances,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_instance::Relation::Group.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::group_instance::Relation::Instance.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
