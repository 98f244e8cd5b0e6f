//! Savings goals.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    EmergencyFund,
    Retirement,
    House,
    Education,
    Vacation,
    DebtPayoff,
    Other,
}

impl GoalType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmergencyFund => "emergency_fund",
            Self::Retirement => "retirement",
            Self::House => "house",
            Self::Education => "education",
            Self::Vacation => "vacation",
            Self::DebtPayoff => "debt_payoff",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for GoalType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "emergency_fund" => Ok(Self::EmergencyFund),
            "retirement" => Ok(Self::Retirement),
            "house" => Ok(Self::House),
            "education" => Ok(Self::Education),
            "vacation" => Ok(Self::Vacation),
            "debt_payoff" => Ok(Self::DebtPayoff),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidValue(format!(
                "invalid goal type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl GoalPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl TryFrom<&str> for GoalPriority {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(EngineError::InvalidValue(format!(
                "invalid goal priority: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Completed,
    Paused,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for GoalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidValue(format!(
                "invalid goal status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinancialGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub goal_name: String,
    pub goal_type: GoalType,
    pub target_amount: Money,
    pub current_amount: Money,
    pub target_date: Option<NaiveDate>,
    pub priority: GoalPriority,
    pub status: GoalStatus,
    pub notes: Option<String>,
    pub progress_percent: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FinancialGoalNew {
    pub family_id: Option<Uuid>,
    pub goal_name: String,
    pub goal_type: GoalType,
    pub target_amount: Money,
    pub current_amount: Option<Money>,
    pub target_date: Option<NaiveDate>,
    pub priority: Option<GoalPriority>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FinancialGoalPatch {
    pub goal_name: Option<String>,
    pub goal_type: Option<GoalType>,
    pub target_amount: Option<Money>,
    pub current_amount: Option<Money>,
    pub target_date: Option<Option<NaiveDate>>,
    pub priority: Option<GoalPriority>,
    pub status: Option<GoalStatus>,
    pub notes: Option<Option<String>>,
}

impl FinancialGoalPatch {
    pub fn apply(self, goal: &mut FinancialGoal) {
        if let Some(name) = self.goal_name {
            goal.goal_name = name;
        }
        if let Some(kind) = self.goal_type {
            goal.goal_type = kind;
        }
        if let Some(target) = self.target_amount {
            goal.target_amount = target;
        }
        if let Some(current) = self.current_amount {
            goal.current_amount = current;
        }
        if let Some(date) = self.target_date {
            goal.target_date = date;
        }
        if let Some(priority) = self.priority {
            goal.priority = priority;
        }
        if let Some(status) = self.status {
            goal.status = status;
        }
        if let Some(notes) = self.notes {
            goal.notes = notes;
        }
        goal.progress_percent = goal.current_amount.percent_of(goal.target_amount);
    }
}

impl FinancialGoal {
    pub fn validate(&self) -> ResultEngine<()> {
        if !self.target_amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "target_amount must be > 0".to_string(),
            ));
        }
        if self.current_amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "current_amount must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub goal_name: String,
    pub goal_type: String,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub target_date: Option<NaiveDate>,
    pub priority: String,
    pub status: String,
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

impl From<&FinancialGoal> for ActiveModel {
    fn from(goal: &FinancialGoal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id),
            user_id: ActiveValue::Set(goal.user_id),
            family_id: ActiveValue::Set(goal.family_id),
            goal_name: ActiveValue::Set(goal.goal_name.clone()),
            goal_type: ActiveValue::Set(goal.goal_type.as_str().to_string()),
            target_amount_minor: ActiveValue::Set(goal.target_amount.minor()),
            current_amount_minor: ActiveValue::Set(goal.current_amount.minor()),
            target_date: ActiveValue::Set(goal.target_date),
            priority: ActiveValue::Set(goal.priority.as_str().to_string()),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            notes: ActiveValue::Set(goal.notes.clone()),
            created_at: ActiveValue::Set(goal.created_at),
            updated_at: ActiveValue::Set(goal.updated_at),
        }
    }
}

impl TryFrom<Model> for FinancialGoal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let target_amount = Money::new(model.target_amount_minor);
        let current_amount = Money::new(model.current_amount_minor);
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            goal_name: model.goal_name,
            goal_type: GoalType::try_from(model.goal_type.as_str())?,
            target_amount,
            current_amount,
            target_date: model.target_date,
            priority: GoalPriority::try_from(model.priority.as_str())?,
            status: GoalStatus::try_from(model.status.as_str())?,
            notes: model.notes,
            progress_percent: current_amount.percent_of(target_amount),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
