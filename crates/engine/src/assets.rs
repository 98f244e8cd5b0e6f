//! Investment holdings. Quantities carry three decimals (`quantity_milli`),
//! rates are in basis points.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    MutualFund,
    FixedDeposit,
    Sip,
    Gold,
    RealEstate,
    Ppf,
    Nps,
    Bond,
    Etf,
    Cryptocurrency,
    Commodities,
    Other,
}

impl AssetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::MutualFund => "mutual_fund",
            Self::FixedDeposit => "fixed_deposit",
            Self::Sip => "sip",
            Self::Gold => "gold",
            Self::RealEstate => "real_estate",
            Self::Ppf => "ppf",
            Self::Nps => "nps",
            Self::Bond => "bond",
            Self::Etf => "etf",
            Self::Cryptocurrency => "cryptocurrency",
            Self::Commodities => "commodities",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for AssetType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "stock" => Ok(Self::Stock),
            "mutual_fund" => Ok(Self::MutualFund),
            "fixed_deposit" => Ok(Self::FixedDeposit),
            "sip" => Ok(Self::Sip),
            "gold" => Ok(Self::Gold),
            "real_estate" => Ok(Self::RealEstate),
            "ppf" => Ok(Self::Ppf),
            "nps" => Ok(Self::Nps),
            "bond" => Ok(Self::Bond),
            "etf" => Ok(Self::Etf),
            "cryptocurrency" => Ok(Self::Cryptocurrency),
            "commodities" => Ok(Self::Commodities),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidValue(format!(
                "invalid asset type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for RiskLevel {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(EngineError::InvalidValue(format!(
                "invalid risk level: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub asset_type: AssetType,
    pub name: String,
    pub symbol_isin: Option<String>,
    pub quantity_milli: i64,
    pub purchase_price: Money,
    pub current_price: Option<Money>,
    pub purchase_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub interest_rate_bps: Option<i32>,
    pub risk_level: Option<RiskLevel>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetNew {
    pub family_id: Option<Uuid>,
    pub asset_type: AssetType,
    pub name: String,
    pub symbol_isin: Option<String>,
    pub quantity_milli: i64,
    pub purchase_price: Money,
    pub current_price: Option<Money>,
    pub purchase_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub interest_rate_bps: Option<i32>,
    pub risk_level: Option<RiskLevel>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub symbol_isin: Option<Option<String>>,
    pub quantity_milli: Option<i64>,
    pub purchase_price: Option<Money>,
    pub current_price: Option<Option<Money>>,
    pub purchase_date: Option<Option<NaiveDate>>,
    pub maturity_date: Option<Option<NaiveDate>>,
    pub interest_rate_bps: Option<Option<i32>>,
    pub risk_level: Option<Option<RiskLevel>>,
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl AssetPatch {
    pub fn apply(self, asset: &mut Asset) {
        if let Some(name) = self.name {
            asset.name = name;
        }
        if let Some(symbol) = self.symbol_isin {
            asset.symbol_isin = symbol;
        }
        if let Some(quantity) = self.quantity_milli {
            asset.quantity_milli = quantity;
        }
        if let Some(price) = self.purchase_price {
            asset.purchase_price = price;
        }
        if let Some(price) = self.current_price {
            asset.current_price = price;
        }
        if let Some(date) = self.purchase_date {
            asset.purchase_date = date;
        }
        if let Some(date) = self.maturity_date {
            asset.maturity_date = date;
        }
        if let Some(rate) = self.interest_rate_bps {
            asset.interest_rate_bps = rate;
        }
        if let Some(risk) = self.risk_level {
            asset.risk_level = risk;
        }
        if let Some(notes) = self.notes {
            asset.notes = notes;
        }
        if let Some(active) = self.is_active {
            asset.is_active = active;
        }
    }
}

impl Asset {
    pub fn validate(&self) -> ResultEngine<()> {
        if self.quantity_milli <= 0 {
            return Err(EngineError::InvalidAmount("quantity must be > 0".to_string()));
        }
        if self.purchase_price.is_negative() || self.current_price.is_some_and(Money::is_negative)
        {
            return Err(EngineError::InvalidAmount("prices must be >= 0".to_string()));
        }
        if let (Some(purchase), Some(maturity)) = (self.purchase_date, self.maturity_date)
            && maturity < purchase
        {
            return Err(EngineError::InvalidPeriod(
                "maturity_date must not precede purchase_date".to_string(),
            ));
        }
        Ok(())
    }

    /// Holding value at the latest known price, falling back to the purchase
    /// price.
    #[must_use]
    pub fn current_value(&self) -> Money {
        self.value_at(self.current_price.unwrap_or(self.purchase_price))
    }

    #[must_use]
    pub fn value_at(&self, price_per_unit: Money) -> Money {
        Money::new(price_per_unit.minor().saturating_mul(self.quantity_milli) / 1000)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub asset_type: String,
    pub name: String,
    pub symbol_isin: Option<String>,
    pub quantity_milli: i64,
    pub purchase_price_minor: i64,
    pub current_price_minor: Option<i64>,
    pub purchase_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub interest_rate_bps: Option<i32>,
    pub risk_level: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::asset_valuations::Entity")]
    Valuations,
}

impl Related<super::asset_valuations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Valuations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Asset> for ActiveModel {
    fn from(asset: &Asset) -> Self {
        Self {
            id: ActiveValue::Set(asset.id),
            user_id: ActiveValue::Set(asset.user_id),
            family_id: ActiveValue::Set(asset.family_id),
            asset_type: ActiveValue::Set(asset.asset_type.as_str().to_string()),
            name: ActiveValue::Set(asset.name.clone()),
            symbol_isin: ActiveValue::Set(asset.symbol_isin.clone()),
            quantity_milli: ActiveValue::Set(asset.quantity_milli),
            purchase_price_minor: ActiveValue::Set(asset.purchase_price.minor()),
            current_price_minor: ActiveValue::Set(asset.current_price.map(Money::minor)),
            purchase_date: ActiveValue::Set(asset.purchase_date),
            maturity_date: ActiveValue::Set(asset.maturity_date),
            interest_rate_bps: ActiveValue::Set(asset.interest_rate_bps),
            risk_level: ActiveValue::Set(asset.risk_level.map(|r| r.as_str().to_string())),
            notes: ActiveValue::Set(asset.notes.clone()),
            is_active: ActiveValue::Set(asset.is_active),
            created_at: ActiveValue::Set(asset.created_at),
            updated_at: ActiveValue::Set(asset.updated_at),
        }
    }
}

impl TryFrom<Model> for Asset {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            asset_type: AssetType::try_from(model.asset_type.as_str())?,
            name: model.name,
            symbol_isin: model.symbol_isin,
            quantity_milli: model.quantity_milli,
            purchase_price: Money::new(model.purchase_price_minor),
            current_price: model.current_price_minor.map(Money::new),
            purchase_date: model.purchase_date,
            maturity_date: model.maturity_date,
            interest_rate_bps: model.interest_rate_bps,
            risk_level: model
                .risk_level
                .as_deref()
                .map(RiskLevel::try_from)
                .transpose()?,
            notes: model.notes,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_uses_latest_price_and_fractional_quantity() {
        let asset = Asset {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_id: None,
            asset_type: AssetType::MutualFund,
            name: "Index fund".to_string(),
            symbol_isin: None,
            quantity_milli: 12_500,
            purchase_price: Money::new(10_000),
            current_price: Some(Money::new(12_000)),
            purchase_date: None,
            maturity_date: None,
            interest_rate_bps: None,
            risk_level: Some(RiskLevel::Medium),
            notes: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(asset.validate().is_ok());
        assert_eq!(asset.current_value(), Money::new(150_000));
    }
}
