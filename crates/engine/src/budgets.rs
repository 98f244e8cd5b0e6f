//! Budgets over a closed date period, with optional per-category allocations.
//!
//! Validation that needs no database lives here (`Budget::validate`); the
//! overlap check against other budgets runs in the ops layer inside the write
//! transaction.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{BudgetStats, EngineError, Money, ResultEngine};

pub const DEFAULT_ALERT_THRESHOLD_PERCENT: u8 = 80;
pub const MAX_BUDGET_NAME_LEN: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetAllocation {
    pub category_id: Uuid,
    pub allocated: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_budget: Option<Money>,
    pub needs_budget: Option<Money>,
    pub wants_budget: Option<Money>,
    pub savings_budget: Option<Money>,
    pub alert_threshold_percent: u8,
    pub is_active: bool,
    pub allocations: Vec<BudgetAllocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A budget together with its spending, recomputed on every read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetWithStats {
    #[serde(flatten)]
    pub budget: Budget,
    pub stats: BudgetStats,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BudgetNew {
    pub name: String,
    pub family_id: Option<Uuid>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_budget: Option<Money>,
    pub needs_budget: Option<Money>,
    pub wants_budget: Option<Money>,
    pub savings_budget: Option<Money>,
    pub alert_threshold_percent: Option<u8>,
    pub is_active: Option<bool>,
    pub allocations: Vec<BudgetAllocation>,
}

/// Partial update of a budget. `Some(None)` clears a nullable amount;
/// `allocations`, when present, replaces the whole list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_budget: Option<Option<Money>>,
    pub needs_budget: Option<Option<Money>>,
    pub wants_budget: Option<Option<Money>>,
    pub savings_budget: Option<Option<Money>>,
    pub alert_threshold_percent: Option<u8>,
    pub is_active: Option<bool>,
    pub allocations: Option<Vec<BudgetAllocation>>,
}

impl BudgetPatch {
    pub fn apply(self, budget: &mut Budget) {
        if let Some(name) = self.name {
            budget.name = name;
        }
        if let Some(start) = self.period_start {
            budget.period_start = start;
        }
        if let Some(end) = self.period_end {
            budget.period_end = end;
        }
        if let Some(total) = self.total_budget {
            budget.total_budget = total;
        }
        if let Some(needs) = self.needs_budget {
            budget.needs_budget = needs;
        }
        if let Some(wants) = self.wants_budget {
            budget.wants_budget = wants;
        }
        if let Some(savings) = self.savings_budget {
            budget.savings_budget = savings;
        }
        if let Some(threshold) = self.alert_threshold_percent {
            budget.alert_threshold_percent = threshold;
        }
        if let Some(active) = self.is_active {
            budget.is_active = active;
        }
        if let Some(allocations) = self.allocations {
            budget.allocations = allocations;
        }
    }
}

impl Budget {
    /// Row-level rules: name, period ordering, threshold range, non-negative
    /// amounts, unique allocation categories and allocations fitting in the
    /// total.
    pub fn validate(&self) -> ResultEngine<()> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_BUDGET_NAME_LEN {
            return Err(EngineError::InvalidName(format!(
                "budget name must be 1..={MAX_BUDGET_NAME_LEN} characters"
            )));
        }
        if self.period_end <= self.period_start {
            return Err(EngineError::InvalidPeriod(
                "period_end must be after period_start".to_string(),
            ));
        }
        if !(1..=100).contains(&self.alert_threshold_percent) {
            return Err(EngineError::InvalidValue(
                "alert_threshold_percent must be between 1 and 100".to_string(),
            ));
        }
        for (label, amount) in [
            ("total_budget", self.total_budget),
            ("needs_budget", self.needs_budget),
            ("wants_budget", self.wants_budget),
            ("savings_budget", self.savings_budget),
        ] {
            if amount.is_some_and(Money::is_negative) {
                return Err(EngineError::InvalidAmount(format!("{label} must be >= 0")));
            }
        }

        let mut seen = HashSet::with_capacity(self.allocations.len());
        for allocation in &self.allocations {
            if allocation.allocated.is_negative() {
                return Err(EngineError::InvalidAmount(
                    "allocated amount must be >= 0".to_string(),
                ));
            }
            if !seen.insert(allocation.category_id) {
                return Err(EngineError::InvalidReference(format!(
                    "category {} allocated more than once",
                    allocation.category_id
                )));
            }
        }

        if let Some(total) = self.total_budget {
            let allocated = self
                .allocations
                .iter()
                .try_fold(Money::ZERO, |acc, a| acc.checked_add(a.allocated))
                .ok_or_else(|| {
                    EngineError::InvalidAmount("allocations are too large".to_string())
                })?;
            if allocated > total {
                return Err(EngineError::InvalidAmount(format!(
                    "allocations ({allocated}) exceed total_budget ({total})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_budget_minor: Option<i64>,
    pub needs_budget_minor: Option<i64>,
    pub wants_budget_minor: Option<i64>,
    pub savings_budget_minor: Option<i64>,
    pub alert_threshold_percent: i16,
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
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    Allocations,
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id),
            user_id: ActiveValue::Set(budget.user_id),
            family_id: ActiveValue::Set(budget.family_id),
            name: ActiveValue::Set(budget.name.clone()),
            period_start: ActiveValue::Set(budget.period_start),
            period_end: ActiveValue::Set(budget.period_end),
            total_budget_minor: ActiveValue::Set(budget.total_budget.map(Money::minor)),
            needs_budget_minor: ActiveValue::Set(budget.needs_budget.map(Money::minor)),
            wants_budget_minor: ActiveValue::Set(budget.wants_budget.map(Money::minor)),
            savings_budget_minor: ActiveValue::Set(budget.savings_budget.map(Money::minor)),
            alert_threshold_percent: ActiveValue::Set(i16::from(budget.alert_threshold_percent)),
            is_active: ActiveValue::Set(budget.is_active),
            created_at: ActiveValue::Set(budget.created_at),
            updated_at: ActiveValue::Set(budget.updated_at),
        }
    }
}

impl Budget {
    pub(crate) fn from_model(
        model: Model,
        allocations: Vec<BudgetAllocation>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            name: model.name,
            period_start: model.period_start,
            period_end: model.period_end,
            total_budget: model.total_budget_minor.map(Money::new),
            needs_budget: model.needs_budget_minor.map(Money::new),
            wants_budget: model.wants_budget_minor.map(Money::new),
            savings_budget: model.savings_budget_minor.map(Money::new),
            alert_threshold_percent: u8::try_from(model.alert_threshold_percent).map_err(|_| {
                EngineError::InvalidValue("invalid stored alert_threshold_percent".to_string())
            })?,
            is_active: model.is_active,
            allocations,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn january() -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_id: None,
            name: "January".to_string(),
            period_start: day(1, 1),
            period_end: day(1, 31),
            total_budget: Some(Money::new(100_000)),
            needs_budget: None,
            wants_budget: None,
            savings_budget: None,
            alert_threshold_percent: DEFAULT_ALERT_THRESHOLD_PERCENT,
            is_active: true,
            allocations: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn period_end_must_follow_start() {
        let mut budget = january();
        budget.period_end = budget.period_start;
        assert!(matches!(budget.validate(), Err(EngineError::InvalidPeriod(_))));
    }

    #[test]
    fn allocations_cannot_exceed_total() {
        let mut budget = january();
        budget.allocations = vec![BudgetAllocation {
            category_id: Uuid::new_v4(),
            allocated: Money::new(120_000),
        }];
        assert!(matches!(budget.validate(), Err(EngineError::InvalidAmount(_))));

        budget.allocations[0].allocated = Money::new(100_000);
        assert!(budget.validate().is_ok());

        budget.total_budget = None;
        budget.allocations[0].allocated = Money::new(900_000);
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn duplicate_allocation_category_is_rejected() {
        let mut budget = january();
        let category_id = Uuid::new_v4();
        budget.allocations = vec![
            BudgetAllocation {
                category_id,
                allocated: Money::new(10),
            },
            BudgetAllocation {
                category_id,
                allocated: Money::new(20),
            },
        ];
        assert!(matches!(
            budget.validate(),
            Err(EngineError::InvalidReference(_))
        ));
    }

    #[test]
    fn threshold_must_be_a_percentage() {
        let mut budget = january();
        budget.alert_threshold_percent = 0;
        assert!(budget.validate().is_err());
        budget.alert_threshold_percent = 101;
        assert!(budget.validate().is_err());
        budget.alert_threshold_percent = 100;
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn allocation_sum_overflow_is_rejected() {
        let mut budget = january();
        budget.total_budget = Some(Money::new(1_000));
        budget.allocations = vec![
            BudgetAllocation {
                category_id: Uuid::new_v4(),
                allocated: Money::new(i64::MAX),
            },
            BudgetAllocation {
                category_id: Uuid::new_v4(),
                allocated: Money::new(i64::MAX),
            },
        ];
        assert!(matches!(budget.validate(), Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn patch_replaces_allocations_and_clears_total() {
        let mut budget = january();
        let category_id = Uuid::new_v4();
        BudgetPatch {
            total_budget: Some(None),
            allocations: Some(vec![BudgetAllocation {
                category_id,
                allocated: Money::new(5_000),
            }]),
            ..Default::default()
        }
        .apply(&mut budget);
        assert_eq!(budget.total_budget, None);
        assert_eq!(budget.allocations.len(), 1);
        assert_eq!(budget.name, "January");
    }
}
