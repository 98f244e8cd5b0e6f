use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationSource {
    #[default]
    Manual,
    Api,
    Estimated,
}

impl ValuationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Api => "api",
            Self::Estimated => "estimated",
        }
    }
}

impl TryFrom<&str> for ValuationSource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "api" => Ok(Self::Api),
            "estimated" => Ok(Self::Estimated),
            other => Err(EngineError::InvalidValue(format!(
                "invalid valuation source: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetValuation {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub valuation_date: NaiveDate,
    pub price_per_unit: Money,
    pub total_value: Money,
    pub source: ValuationSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetValuationNew {
    pub valuation_date: NaiveDate,
    pub price_per_unit: Money,
    pub source: Option<ValuationSource>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "asset_valuations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub asset_id: Uuid,
    pub valuation_date: NaiveDate,
    pub price_per_unit_minor: i64,
    pub total_value_minor: i64,
    pub source: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::AssetId",
        to = "super::assets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Asset,
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AssetValuation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            asset_id: model.asset_id,
            valuation_date: model.valuation_date,
            price_per_unit: Money::new(model.price_per_unit_minor),
            total_value: Money::new(model.total_value_minor),
            source: ValuationSource::try_from(model.source.as_str())?,
            created_at: model.created_at,
        })
    }
}
