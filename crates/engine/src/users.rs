//! Users table.
//!
//! Emails are stored lowercase so lookups are case-insensitive. The password
//! hash never leaves the engine.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{Currency, EngineError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub default_currency: Currency,
    pub active_family_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub default_currency: String,
    pub active_family_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::families::Entity",
        from = "Column::ActiveFamilyId",
        to = "super::families::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    ActiveFamily,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            default_currency: Currency::try_from(model.default_currency.as_str())?,
            active_family_id: model.active_family_id,
            created_at: model.created_at,
        })
    }
}
