//! Request bodies and query strings of the HTTP API.
//!
//! Amounts are integer minor units (`*_minor`). Enum-like values travel as
//! snake_case strings and are validated by the server. Update bodies use
//! `Option<Option<T>>` for nullable fields: a missing key leaves the field
//! alone, an explicit `null` clears it.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguishes `"field": null` (`Some(None)`) from a missing field (`None`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `?page=&page_size=`, shared by paged listings.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Paging {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub email: String,
        pub full_name: String,
        pub password: String,
        pub default_currency: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub full_name: Option<String>,
        pub default_currency: Option<String>,
    }

    /// Resolved scope of the caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ScopeView {
        /// `personal` or `family`.
        pub kind: String,
        pub user_id: Uuid,
        pub family_id: Option<Uuid>,
    }
}

pub mod family {
    use super::*;

    /// Which personal records move into a family, and the transaction date
    /// window (inclusive).
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ImportRequest {
        #[serde(default)]
        pub transactions: bool,
        #[serde(default)]
        pub budgets: bool,
        #[serde(default)]
        pub credit_sources: bool,
        #[serde(default)]
        pub assets: bool,
        #[serde(default)]
        pub income_streams: bool,
        #[serde(default)]
        pub goals: bool,
        #[serde(default)]
        pub tags: bool,
        pub from_date: Option<NaiveDate>,
        pub to_date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyNew {
        pub name: String,
        pub import: Option<ImportRequest>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyRename {
        pub name: String,
    }

    /// `admin`, `member` or `viewer`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberRoleUpdate {
        pub role: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InviteNew {
        pub email: String,
        pub role: String,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AllocationInput {
        pub category_id: Uuid,
        pub allocated_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub name: String,
        pub family_id: Option<Uuid>,
        pub period_start: NaiveDate,
        pub period_end: NaiveDate,
        pub total_budget_minor: Option<i64>,
        pub needs_budget_minor: Option<i64>,
        pub wants_budget_minor: Option<i64>,
        pub savings_budget_minor: Option<i64>,
        pub alert_threshold_percent: Option<u8>,
        pub is_active: Option<bool>,
        #[serde(default)]
        pub category_allocations: Vec<AllocationInput>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub name: Option<String>,
        pub period_start: Option<NaiveDate>,
        pub period_end: Option<NaiveDate>,
        #[serde(default, deserialize_with = "double_option")]
        pub total_budget_minor: Option<Option<i64>>,
        #[serde(default, deserialize_with = "double_option")]
        pub needs_budget_minor: Option<Option<i64>>,
        #[serde(default, deserialize_with = "double_option")]
        pub wants_budget_minor: Option<Option<i64>>,
        #[serde(default, deserialize_with = "double_option")]
        pub savings_budget_minor: Option<Option<i64>>,
        pub alert_threshold_percent: Option<u8>,
        pub is_active: Option<bool>,
        /// Replaces every allocation when present.
        pub category_allocations: Option<Vec<AllocationInput>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetList {
        pub is_active: Option<bool>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    /// Day to look up; defaults to today (UTC).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ActiveBudgetQuery {
        pub date: Option<NaiveDate>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub family_id: Option<Uuid>,
        pub amount_minor: i64,
        pub currency: Option<String>,
        pub transaction_type: String,
        pub payment_method: String,
        pub category_id: Uuid,
        pub subcategory_id: Option<Uuid>,
        pub payee: Option<String>,
        pub merchant_type: Option<String>,
        pub mcc_code: Option<String>,
        pub t_date: NaiveDate,
        pub notes: Option<String>,
        pub credit_source_id: Option<Uuid>,
        pub is_paid: Option<bool>,
        pub payment_due_date: Option<NaiveDate>,
        #[serde(default)]
        pub tag_ids: Vec<Uuid>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount_minor: Option<i64>,
        pub currency: Option<String>,
        pub transaction_type: Option<String>,
        pub payment_method: Option<String>,
        pub category_id: Option<Uuid>,
        #[serde(default, deserialize_with = "double_option")]
        pub subcategory_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "double_option")]
        pub payee: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub merchant_type: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub mcc_code: Option<Option<String>>,
        pub t_date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "double_option")]
        pub notes: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub credit_source_id: Option<Option<Uuid>>,
        pub is_paid: Option<bool>,
        #[serde(default, deserialize_with = "double_option")]
        pub payment_due_date: Option<Option<NaiveDate>>,
        pub tag_ids: Option<Vec<Uuid>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub transaction_type: Option<String>,
        pub category_id: Option<Uuid>,
        pub payment_method: Option<String>,
        pub search: Option<String>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub parent_category_id: Option<Uuid>,
        pub category_type: String,
        pub budget_classification: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub display_order: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub budget_classification: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub icon: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
        pub display_order: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryList {
        pub category_type: Option<String>,
    }
}

pub mod tag {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagNew {
        pub name: String,
        pub family_id: Option<Uuid>,
        pub color: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TagUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
    }
}

pub mod credit_source {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditSourceNew {
        pub family_id: Option<Uuid>,
        pub card_name: String,
        pub card_last4: String,
        pub card_network: String,
        pub credit_limit_minor: i64,
        pub billing_day: u8,
        pub due_day: u8,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CreditSourceUpdate {
        pub card_name: Option<String>,
        pub card_last4: Option<String>,
        pub card_network: Option<String>,
        pub credit_limit_minor: Option<i64>,
        pub billing_day: Option<u8>,
        pub due_day: Option<u8>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CreditSourceList {
        #[serde(default)]
        pub active_only: bool,
    }
}

pub mod asset {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssetNew {
        pub family_id: Option<Uuid>,
        pub asset_type: String,
        pub name: String,
        pub symbol_isin: Option<String>,
        /// Thousandths of a unit.
        pub quantity_milli: i64,
        pub purchase_price_minor: i64,
        pub current_price_minor: Option<i64>,
        pub purchase_date: Option<NaiveDate>,
        pub maturity_date: Option<NaiveDate>,
        pub interest_rate_bps: Option<i32>,
        pub risk_level: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AssetUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub symbol_isin: Option<Option<String>>,
        pub quantity_milli: Option<i64>,
        pub purchase_price_minor: Option<i64>,
        #[serde(default, deserialize_with = "double_option")]
        pub current_price_minor: Option<Option<i64>>,
        #[serde(default, deserialize_with = "double_option")]
        pub purchase_date: Option<Option<NaiveDate>>,
        #[serde(default, deserialize_with = "double_option")]
        pub maturity_date: Option<Option<NaiveDate>>,
        #[serde(default, deserialize_with = "double_option")]
        pub interest_rate_bps: Option<Option<i32>>,
        #[serde(default, deserialize_with = "double_option")]
        pub risk_level: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub notes: Option<Option<String>>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AssetList {
        pub asset_type: Option<String>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ValuationNew {
        pub valuation_date: NaiveDate,
        pub price_per_unit_minor: i64,
        pub source: Option<String>,
    }
}

pub mod income {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeStreamNew {
        pub family_id: Option<Uuid>,
        pub source: String,
        pub category_id: Option<Uuid>,
        pub amount_minor: i64,
        pub currency: Option<String>,
        pub frequency: String,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub is_taxable: Option<bool>,
        pub tax_rate_bps: Option<i32>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct IncomeStreamUpdate {
        pub source: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub category_id: Option<Option<Uuid>>,
        pub amount_minor: Option<i64>,
        pub currency: Option<String>,
        pub frequency: Option<String>,
        pub start_date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "double_option")]
        pub end_date: Option<Option<NaiveDate>>,
        pub is_taxable: Option<bool>,
        #[serde(default, deserialize_with = "double_option")]
        pub tax_rate_bps: Option<Option<i32>>,
        pub is_active: Option<bool>,
        #[serde(default, deserialize_with = "double_option")]
        pub notes: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct IncomeStreamList {
        pub is_active: Option<bool>,
        pub frequency: Option<String>,
    }
}

pub mod goal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        pub family_id: Option<Uuid>,
        pub goal_name: String,
        pub goal_type: String,
        pub target_amount_minor: i64,
        pub current_amount_minor: Option<i64>,
        pub target_date: Option<NaiveDate>,
        pub priority: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub goal_name: Option<String>,
        pub goal_type: Option<String>,
        pub target_amount_minor: Option<i64>,
        pub current_amount_minor: Option<i64>,
        #[serde(default, deserialize_with = "double_option")]
        pub target_date: Option<Option<NaiveDate>>,
        pub priority: Option<String>,
        pub status: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub notes: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalList {
        pub status: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_clears_and_missing_keeps() {
        let update: transaction::TransactionUpdate =
            serde_json::from_str(r#"{"notes": null, "amount_minor": 500}"#).unwrap();
        assert_eq!(update.notes, Some(None));
        assert_eq!(update.payee, None);
        assert_eq!(update.amount_minor, Some(500));
    }

    #[test]
    fn import_flags_default_to_false() {
        let import: family::ImportRequest =
            serde_json::from_str(r#"{"transactions": true}"#).unwrap();
        assert!(import.transactions);
        assert!(!import.budgets);
        assert_eq!(import.from_date, None);
    }
}
