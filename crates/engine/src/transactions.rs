//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense dated on a calendar day.
//! Expenses feed budget spending.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine, merchant_categories::is_mcc_code};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidValue(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    Upi,
    Neft,
    Imps,
    Rtgs,
    Cheque,
    DebitCard,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::Upi => "upi",
            Self::Neft => "neft",
            Self::Imps => "imps",
            Self::Rtgs => "rtgs",
            Self::Cheque => "cheque",
            Self::DebitCard => "debit_card",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "credit_card" => Ok(Self::CreditCard),
            "upi" => Ok(Self::Upi),
            "neft" => Ok(Self::Neft),
            "imps" => Ok(Self::Imps),
            "rtgs" => Ok(Self::Rtgs),
            "cheque" => Ok(Self::Cheque),
            "debit_card" => Ok(Self::DebitCard),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidValue(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub amount: Money,
    pub currency: Currency,
    pub transaction_type: TransactionType,
    pub payment_method: PaymentMethod,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    pub payee: Option<String>,
    pub merchant_type: Option<String>,
    pub mcc_code: Option<String>,
    pub t_date: NaiveDate,
    pub notes: Option<String>,
    pub credit_source_id: Option<Uuid>,
    pub is_paid: bool,
    pub payment_due_date: Option<NaiveDate>,
    pub tag_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionNew {
    pub family_id: Option<Uuid>,
    pub amount: Money,
    pub currency: Option<Currency>,
    pub transaction_type: TransactionType,
    pub payment_method: PaymentMethod,
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
    pub tag_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Money>,
    pub currency: Option<Currency>,
    pub transaction_type: Option<TransactionType>,
    pub payment_method: Option<PaymentMethod>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Option<Uuid>>,
    pub payee: Option<Option<String>>,
    pub merchant_type: Option<Option<String>>,
    pub mcc_code: Option<Option<String>>,
    pub t_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
    pub credit_source_id: Option<Option<Uuid>>,
    pub is_paid: Option<bool>,
    pub payment_due_date: Option<Option<NaiveDate>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl TransactionPatch {
    pub fn apply(self, tx: &mut Transaction) {
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(currency) = self.currency {
            tx.currency = currency;
        }
        if let Some(kind) = self.transaction_type {
            tx.transaction_type = kind;
        }
        if let Some(method) = self.payment_method {
            tx.payment_method = method;
        }
        if let Some(category_id) = self.category_id {
            tx.category_id = category_id;
        }
        if let Some(subcategory_id) = self.subcategory_id {
            tx.subcategory_id = subcategory_id;
        }
        if let Some(payee) = self.payee {
            tx.payee = payee;
        }
        if let Some(merchant_type) = self.merchant_type {
            tx.merchant_type = merchant_type;
        }
        if let Some(mcc_code) = self.mcc_code {
            tx.mcc_code = mcc_code;
        }
        if let Some(t_date) = self.t_date {
            tx.t_date = t_date;
        }
        if let Some(notes) = self.notes {
            tx.notes = notes;
        }
        if let Some(credit_source_id) = self.credit_source_id {
            tx.credit_source_id = credit_source_id;
        }
        if let Some(is_paid) = self.is_paid {
            tx.is_paid = is_paid;
        }
        if let Some(due) = self.payment_due_date {
            tx.payment_due_date = due;
        }
        if let Some(tag_ids) = self.tag_ids {
            tx.tag_ids = tag_ids;
        }
    }
}

impl Transaction {
    /// Checks the row-level constraints that do not need the database.
    pub fn validate(&self) -> ResultEngine<()> {
        if !self.amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if self.payment_method == PaymentMethod::CreditCard && self.credit_source_id.is_none() {
            return Err(EngineError::InvalidReference(
                "credit card payments require credit_source_id".to_string(),
            ));
        }
        if let Some(mcc) = &self.mcc_code
            && !is_mcc_code(mcc)
        {
            return Err(EngineError::InvalidValue(
                "mcc_code must be 4 digits".to_string(),
            ));
        }
        if self.payee.as_deref().is_some_and(|p| p.chars().count() > 200) {
            return Err(EngineError::InvalidName(
                "payee must be at most 200 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
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
    pub is_paid: bool,
    pub payment_due_date: Option<NaiveDate>,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(has_many = "super::transaction_tags::Entity")]
    Tags,
}

impl Related<super::transaction_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id),
            family_id: ActiveValue::Set(tx.family_id),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            transaction_type: ActiveValue::Set(tx.transaction_type.as_str().to_string()),
            payment_method: ActiveValue::Set(tx.payment_method.as_str().to_string()),
            category_id: ActiveValue::Set(tx.category_id),
            subcategory_id: ActiveValue::Set(tx.subcategory_id),
            payee: ActiveValue::Set(tx.payee.clone()),
            merchant_type: ActiveValue::Set(tx.merchant_type.clone()),
            mcc_code: ActiveValue::Set(tx.mcc_code.clone()),
            t_date: ActiveValue::Set(tx.t_date),
            notes: ActiveValue::Set(tx.notes.clone()),
            credit_source_id: ActiveValue::Set(tx.credit_source_id),
            is_paid: ActiveValue::Set(tx.is_paid),
            payment_due_date: ActiveValue::Set(tx.payment_due_date),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl Transaction {
    pub(crate) fn from_model(model: Model, tag_ids: Vec<Uuid>) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            family_id: model.family_id,
            amount: Money::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            payment_method: PaymentMethod::try_from(model.payment_method.as_str())?,
            category_id: model.category_id,
            subcategory_id: model.subcategory_id,
            payee: model.payee,
            merchant_type: model.merchant_type,
            mcc_code: model.mcc_code,
            t_date: model.t_date,
            notes: model.notes,
            credit_source_id: model.credit_source_id,
            is_paid: model.is_paid,
            payment_due_date: model.payment_due_date,
            tag_ids,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Income against expenses over a date window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub net_savings: Money,
    pub income_count: u64,
    pub expense_count: u64,
    pub total_transactions: u64,
}

impl TransactionSummary {
    /// `income` and `expenses` are `(sum, count)` pairs; both sums are
    /// non-negative since every amount is.
    pub(crate) fn new(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        income: (Money, u64),
        expenses: (Money, u64),
    ) -> Self {
        Self {
            start_date,
            end_date,
            total_income: income.0,
            total_expenses: expenses.0,
            net_savings: income.0 - expenses.0,
            income_count: income.1,
            expense_count: expenses.1,
            total_transactions: income.1 + expenses.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense() -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_id: None,
            amount: Money::new(150_000),
            currency: Currency::Inr,
            transaction_type: TransactionType::Expense,
            payment_method: PaymentMethod::Upi,
            category_id: Uuid::new_v4(),
            subcategory_id: None,
            payee: Some("Fresh Mart".to_string()),
            merchant_type: None,
            mcc_code: None,
            t_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            notes: None,
            credit_source_id: None,
            is_paid: true,
            payment_due_date: None,
            tag_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn credit_card_needs_source() {
        let mut tx = expense();
        TransactionPatch {
            payment_method: Some(PaymentMethod::CreditCard),
            ..Default::default()
        }
        .apply(&mut tx);
        assert!(matches!(tx.validate(), Err(EngineError::InvalidReference(_))));

        TransactionPatch {
            credit_source_id: Some(Some(Uuid::new_v4())),
            ..Default::default()
        }
        .apply(&mut tx);
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn patch_clears_nullable_fields_only_when_asked() {
        let mut tx = expense();
        TransactionPatch {
            notes: Some(Some("weekly groceries".to_string())),
            ..Default::default()
        }
        .apply(&mut tx);
        assert_eq!(tx.payee.as_deref(), Some("Fresh Mart"));
        assert_eq!(tx.notes.as_deref(), Some("weekly groceries"));

        TransactionPatch {
            payee: Some(None),
            ..Default::default()
        }
        .apply(&mut tx);
        assert_eq!(tx.payee, None);
        assert_eq!(tx.notes.as_deref(), Some("weekly groceries"));
    }

    #[test]
    fn rejects_non_positive_amount_and_bad_mcc() {
        let mut tx = expense();
        tx.amount = Money::ZERO;
        assert!(matches!(tx.validate(), Err(EngineError::InvalidAmount(_))));

        let mut tx = expense();
        tx.mcc_code = Some("54A1".to_string());
        assert!(matches!(tx.validate(), Err(EngineError::InvalidValue(_))));
    }

    #[test]
    fn summary_nets_income_against_expenses() {
        let summary = TransactionSummary::new(
            None,
            None,
            (Money::new(50_000), 1),
            (Money::new(80_000), 3),
        );
        assert_eq!(summary.net_savings, Money::new(-30_000));
        assert_eq!(summary.total_transactions, 4);
    }
}
