//! Recurring (or one-off) income sources.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeFrequency {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Yearly,
    OneTime,
}

impl IncomeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi-weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::OneTime => "one-time",
        }
    }
}

impl TryFrom<&str> for IncomeFrequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "bi-weekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            "one-time" => Ok(Self::OneTime),
            other => Err(EngineError::InvalidValue(format!(
                "invalid income frequency: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncomeStream {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub source: String,
    pub category_id: Option<Uuid>,
    pub amount: Money,
    pub currency: Currency,
    pub frequency: IncomeFrequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_taxable: bool,
    pub tax_rate_bps: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IncomeStreamNew {
    pub family_id: Option<Uuid>,
    pub source: String,
    pub category_id: Option<Uuid>,
    pub amount: Money,
    pub currency: Option<Currency>,
    pub frequency: IncomeFrequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_taxable: Option<bool>,
    pub tax_rate_bps: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomeStreamPatch {
    pub source: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub amount: Option<Money>,
    pub currency: Option<Currency>,
    pub frequency: Option<IncomeFrequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_taxable: Option<bool>,
    pub tax_rate_bps: Option<Option<i32>>,
    pub is_active: Option<bool>,
    pub notes: Option<Option<String>>,
}

impl IncomeStreamPatch {
    pub fn apply(self, stream: &mut IncomeStream) {
        if let Some(source) = self.source {
            stream.source = source;
        }
        if let Some(category_id) = self.category_id {
            stream.category_id = category_id;
        }
        if let Some(amount) = self.amount {
            stream.amount = amount;
        }
        if let Some(currency) = self.currency {
            stream.currency = currency;
        }
        if let Some(frequency) = self.frequency {
            stream.frequency = frequency;
        }
        if let Some(start) = self.start_date {
            stream.start_date = start;
        }
        if let Some(end) = self.end_date {
            stream.end_date = end;
        }
        if let Some(taxable) = self.is_taxable {
            stream.is_taxable = taxable;
        }
        if let Some(rate) = self.tax_rate_bps {
            stream.tax_rate_bps = rate;
        }
        if let Some(active) = self.is_active {
            stream.is_active = active;
        }
        if let Some(notes) = self.notes {
            stream.notes = notes;
        }
    }
}

impl IncomeStream {
    pub fn validate(&self) -> ResultEngine<()> {
        if !self.amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err(EngineError::InvalidPeriod(
                "end_date must not precede start_date".to_string(),
            ));
        }
        if self
            .tax_rate_bps
            .is_some_and(|rate| !(0..=10_000).contains(&rate))
        {
            return Err(EngineError::InvalidValue(
                "tax_rate must be between 0 and 100 percent".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "income_streams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub source: String,
    pub category_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_taxable: bool,
    pub tax_rate_bps: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
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
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&IncomeStream> for ActiveModel {
    fn from(stream: &IncomeStream) -> Self {
        Self {
            id: ActiveValue::Set(stream.id),
            user_id: ActiveValue::Set(stream.user_id),
            family_id: ActiveValue::Set(stream.family_id),
            source: ActiveValue::Set(stream.source.clone()),
            category_id: ActiveValue::Set(stream.category_id),
            amount_minor: ActiveValue::Set(stream.amount.minor()),
            currency: ActiveValue::Set(stream.currency.code().to_string()),
            frequency: ActiveValue::Set(stream.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(stream.start_date),
            end_date: ActiveValue::Set(stream.end_date),
            is_taxable: ActiveValue::Set(stream.is_taxable),
            tax_rate_bps: ActiveValue::Set(stream.tax_rate_bps),
            is_active: ActiveValue::Set(stream.is_active),
            notes: ActiveValue::Set(stream.notes.clone()),
            created_at: ActiveValue::Set(stream.created_at),
            updated_at: ActiveValue::Set(stream.updated_at),
        }
    }
}

impl TryFrom<Model> for IncomeStream {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            source: model.source,
            category_id: model.category_id,
            amount: Money::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            frequency: IncomeFrequency::try_from(model.frequency.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            is_taxable: model.is_taxable,
            tax_rate_bps: model.tax_rate_bps,
            is_active: model.is_active,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
