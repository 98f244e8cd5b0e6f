//! Spending against a budget.
//!
//! The database sums expenses (see `Engine::budget_spend`); this module turns
//! those sums into remaining amounts and utilization percentages. Nothing is
//! persisted.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{Budget, Money};

/// Expense sums for one budget period.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpendTotals {
    pub total: Money,
    pub by_category: HashMap<Uuid, Money>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub allocated: Money,
    pub spent: Money,
    pub remaining: Money,
    pub utilization_percent: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetStats {
    pub total_spent: Money,
    pub total_remaining: Option<Money>,
    pub overall_utilization_percent: Option<f64>,
    pub alert_triggered: bool,
    pub categories: Vec<CategorySpend>,
}

pub fn compute_budget_stats(
    budget: &Budget,
    spend: &SpendTotals,
    category_names: &HashMap<Uuid, String>,
) -> BudgetStats {
    let total_spent = spend.total;
    let total_remaining = budget.total_budget.map(|total| total - total_spent);
    let overall_utilization_percent = budget
        .total_budget
        .and_then(|total| total_spent.percent_of(total));
    let alert_triggered = overall_utilization_percent
        .is_some_and(|pct| pct >= f64::from(budget.alert_threshold_percent));

    let categories = budget
        .allocations
        .iter()
        .map(|allocation| {
            let spent = spend
                .by_category
                .get(&allocation.category_id)
                .copied()
                .unwrap_or(Money::ZERO);
            CategorySpend {
                category_id: allocation.category_id,
                category_name: category_names.get(&allocation.category_id).cloned(),
                allocated: allocation.allocated,
                spent,
                remaining: allocation.allocated - spent,
                utilization_percent: spent.percent_of(allocation.allocated),
            }
        })
        .collect();

    BudgetStats {
        total_spent,
        total_remaining,
        overall_utilization_percent,
        alert_triggered,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::BudgetAllocation;

    fn budget(total: Option<i64>, allocations: Vec<BudgetAllocation>) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_id: None,
            name: "January".to_string(),
            period_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            total_budget: total.map(Money::new),
            needs_budget: None,
            wants_budget: None,
            savings_budget: None,
            alert_threshold_percent: 80,
            is_active: true,
            allocations,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn groceries_and_dining_month() {
        let groceries = Uuid::new_v4();
        let dining = Uuid::new_v4();
        let b = budget(
            Some(500_000),
            vec![BudgetAllocation {
                category_id: groceries,
                allocated: Money::new(200_000),
            }],
        );
        let spend = SpendTotals {
            total: Money::new(230_000),
            by_category: HashMap::from([
                (groceries, Money::new(150_000)),
                (dining, Money::new(80_000)),
            ]),
        };
        let names = HashMap::from([(groceries, "Groceries".to_string())]);

        let stats = compute_budget_stats(&b, &spend, &names);
        assert_eq!(stats.total_spent, Money::new(230_000));
        assert_eq!(stats.total_remaining, Some(Money::new(270_000)));
        assert_eq!(stats.overall_utilization_percent, Some(46.0));
        assert!(!stats.alert_triggered);

        assert_eq!(stats.categories.len(), 1);
        let line = &stats.categories[0];
        assert_eq!(line.category_name.as_deref(), Some("Groceries"));
        assert_eq!(line.spent, Money::new(150_000));
        assert_eq!(line.remaining, Money::new(50_000));
        assert_eq!(line.utilization_percent, Some(75.0));
    }

    #[test]
    fn no_expenses_means_nothing_used() {
        let b = budget(Some(100_000), Vec::new());
        let stats = compute_budget_stats(&b, &SpendTotals::default(), &HashMap::new());
        assert_eq!(stats.total_spent, Money::ZERO);
        assert_eq!(stats.total_remaining, Some(Money::new(100_000)));
        assert_eq!(stats.overall_utilization_percent, Some(0.0));
    }

    #[test]
    fn missing_or_zero_total_has_no_percentages() {
        let spend = SpendTotals {
            total: Money::new(10_000),
            by_category: HashMap::new(),
        };

        let stats = compute_budget_stats(&budget(None, Vec::new()), &spend, &HashMap::new());
        assert_eq!(stats.total_remaining, None);
        assert_eq!(stats.overall_utilization_percent, None);

        let stats = compute_budget_stats(&budget(Some(0), Vec::new()), &spend, &HashMap::new());
        assert_eq!(stats.total_remaining, Some(Money::new(-10_000)));
        assert_eq!(stats.overall_utilization_percent, None);
        assert!(!stats.alert_triggered);
    }

    #[test]
    fn zero_allocation_has_no_utilization() {
        let category_id = Uuid::new_v4();
        let b = budget(
            Some(1_000),
            vec![BudgetAllocation {
                category_id,
                allocated: Money::ZERO,
            }],
        );
        let spend = SpendTotals {
            total: Money::new(900),
            by_category: HashMap::from([(category_id, Money::new(300))]),
        };
        let stats = compute_budget_stats(&b, &spend, &HashMap::new());
        assert_eq!(stats.categories[0].remaining, Money::new(-300));
        assert_eq!(stats.categories[0].utilization_percent, None);
        assert!(stats.alert_triggered);
    }
}
