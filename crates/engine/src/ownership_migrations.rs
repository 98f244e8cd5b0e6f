//! Audit trail of personal records moved into a family.
//!
//! At most one row per `(user, family)`: a repeated import returns the first
//! report instead of moving records again.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// Which personal records to move into the family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub transactions: bool,
    pub budgets: bool,
    pub credit_sources: bool,
    pub assets: bool,
    pub income_streams: bool,
    pub goals: bool,
    pub tags: bool,
    /// Inclusive bounds applied to transactions only.
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl ImportOptions {
    pub fn everything() -> Self {
        Self {
            transactions: true,
            budgets: true,
            credit_sources: true,
            assets: true,
            income_streams: true,
            goals: true,
            tags: true,
            from_date: None,
            to_date: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub transactions: u64,
    pub budgets: u64,
    pub budgets_skipped: u64,
    pub credit_sources: u64,
    pub assets: u64,
    pub income_streams: u64,
    pub goals: u64,
    pub tags: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ownership_migrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub transactions: i64,
    pub budgets: i64,
    pub budgets_skipped: i64,
    pub credit_sources: i64,
    pub assets: i64,
    pub income_streams: i64,
    pub goals: i64,
    pub tags: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::families::Entity",
        from = "Column::FamilyId",
        to = "super::families::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Family,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImportReport {
    fn from(model: Model) -> Self {
        let count = |v: i64| u64::try_from(v).unwrap_or_default();
        Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            from_date: model.from_date,
            to_date: model.to_date,
            transactions: count(model.transactions),
            budgets: count(model.budgets),
            budgets_skipped: count(model.budgets_skipped),
            credit_sources: count(model.credit_sources),
            assets: count(model.assets),
            income_streams: count(model.income_streams),
            goals: count(model.goals),
            tags: count(model.tags),
            created_at: model.created_at,
        }
    }
}
