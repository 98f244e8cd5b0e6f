//! Credit cards used to pay for transactions.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Rupay,
    Amex,
    Other,
}

impl CardNetwork {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Rupay => "rupay",
            Self::Amex => "amex",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for CardNetwork {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "visa" => Ok(Self::Visa),
            "mastercard" => Ok(Self::Mastercard),
            "rupay" => Ok(Self::Rupay),
            "amex" => Ok(Self::Amex),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidValue(format!(
                "invalid card network: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreditSource {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub card_name: String,
    pub card_last4: String,
    pub card_network: CardNetwork,
    pub credit_limit: Money,
    pub billing_day: u8,
    pub due_day: u8,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreditSourceNew {
    pub family_id: Option<Uuid>,
    pub card_name: String,
    pub card_last4: String,
    pub card_network: CardNetwork,
    pub credit_limit: Money,
    pub billing_day: u8,
    pub due_day: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreditSourcePatch {
    pub card_name: Option<String>,
    pub card_last4: Option<String>,
    pub card_network: Option<CardNetwork>,
    pub credit_limit: Option<Money>,
    pub billing_day: Option<u8>,
    pub due_day: Option<u8>,
    pub is_active: Option<bool>,
}

impl CreditSourcePatch {
    pub fn apply(self, source: &mut CreditSource) {
        if let Some(name) = self.card_name {
            source.card_name = name;
        }
        if let Some(last4) = self.card_last4 {
            source.card_last4 = last4;
        }
        if let Some(network) = self.card_network {
            source.card_network = network;
        }
        if let Some(limit) = self.credit_limit {
            source.credit_limit = limit;
        }
        if let Some(day) = self.billing_day {
            source.billing_day = day;
        }
        if let Some(day) = self.due_day {
            source.due_day = day;
        }
        if let Some(active) = self.is_active {
            source.is_active = active;
        }
    }
}

impl CreditSource {
    pub fn validate(&self) -> ResultEngine<()> {
        if self.card_last4.len() != 4 || !self.card_last4.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::InvalidValue(
                "card_last4 must be exactly 4 digits".to_string(),
            ));
        }
        if !self.credit_limit.is_positive() {
            return Err(EngineError::InvalidAmount(
                "credit_limit must be > 0".to_string(),
            ));
        }
        for (label, day) in [("billing_day", self.billing_day), ("due_day", self.due_day)] {
            if !(1..=31).contains(&day) {
                return Err(EngineError::InvalidValue(format!(
                    "{label} must be between 1 and 31"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub card_name: String,
    pub card_last4: String,
    pub card_network: String,
    pub credit_limit_minor: i64,
    pub billing_day: i16,
    pub due_day: i16,
    pub is_active: bool,
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

impl From<&CreditSource> for ActiveModel {
    fn from(source: &CreditSource) -> Self {
        Self {
            id: ActiveValue::Set(source.id),
            user_id: ActiveValue::Set(source.user_id),
            family_id: ActiveValue::Set(source.family_id),
            card_name: ActiveValue::Set(source.card_name.clone()),
            card_last4: ActiveValue::Set(source.card_last4.clone()),
            card_network: ActiveValue::Set(source.card_network.as_str().to_string()),
            credit_limit_minor: ActiveValue::Set(source.credit_limit.minor()),
            billing_day: ActiveValue::Set(i16::from(source.billing_day)),
            due_day: ActiveValue::Set(i16::from(source.due_day)),
            is_active: ActiveValue::Set(source.is_active),
            created_at: ActiveValue::Set(source.created_at),
        }
    }
}

impl TryFrom<Model> for CreditSource {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let day = |value: i16, label: &str| {
            u8::try_from(value)
                .map_err(|_| EngineError::InvalidValue(format!("invalid stored {label}")))
        };
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            card_name: model.card_name,
            card_last4: model.card_last4,
            card_network: CardNetwork::try_from(model.card_network.as_str())?,
            credit_limit: Money::new(model.credit_limit_minor),
            billing_day: day(model.billing_day, "billing_day")?,
            due_day: day(model.due_day, "due_day")?,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}
