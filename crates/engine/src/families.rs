//! Families: groups of users sharing records.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{FamilyInvite, FamilyMember, FamilyRole};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A family as seen by one of its members.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FamilySummary {
    #[serde(flatten)]
    pub family: Family,
    pub role: FamilyRole,
    pub member_count: u64,
    pub is_active: bool,
}

/// Full view of a family. Pending invites are only filled for admins.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FamilyDetail {
    #[serde(flatten)]
    pub family: Family,
    pub role: FamilyRole,
    pub members: Vec<FamilyMember>,
    pub pending_invites: Vec<FamilyInvite>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "families")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Creator,
    #[sea_orm(has_many = "super::family_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::family_invites::Entity")]
    Invites,
}

impl Related<super::family_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::family_invites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Family {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}
