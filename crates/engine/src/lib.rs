//! Family finance engine.
//!
//! Records (transactions, budgets, credit sources, assets, income streams,
//! goals, tags) belong to a user and optionally to a family. Every operation
//! resolves the caller's [`Scope`] and runs inside one database transaction.

pub use assets::{Asset, AssetNew, AssetPatch, AssetType, RiskLevel};
pub use asset_valuations::{AssetValuation, AssetValuationNew, ValuationSource};
pub use budget_stats::{BudgetStats, CategorySpend, SpendTotals, compute_budget_stats};
pub use budgets::{Budget, BudgetAllocation, BudgetNew, BudgetPatch, BudgetWithStats};
pub use categories::{BudgetClassification, Category, CategoryNew, CategoryPatch, CategoryType};
pub use credit_sources::{CardNetwork, CreditSource, CreditSourceNew, CreditSourcePatch};
pub use currency::Currency;
pub use error::EngineError;
pub use families::{Family, FamilyDetail, FamilySummary};
pub use family_invites::{FamilyInvite, InvitePreview, InviteStatus};
pub use family_members::{FamilyMember, FamilyRole};
pub use goals::{
    FinancialGoal, FinancialGoalNew, FinancialGoalPatch, GoalPriority, GoalStatus, GoalType,
};
pub use income_streams::{IncomeFrequency, IncomeStream, IncomeStreamNew, IncomeStreamPatch};
pub use merchant_categories::MerchantCategory;
pub use money::Money;
pub use notifier::{InviteNotice, InviteNotifier, LogNotifier, NotifyFuture, WebhookNotifier};
pub use ops::{
    AssetFilter, BudgetFilter, DEFAULT_TRANSACTION_PAGE_SIZE, Engine, EngineBuilder, FamilyCreated,
    GoalFilter, IncomeStreamFilter, TransactionFilter,
};
pub use ownership_migrations::{ImportOptions, ImportReport};
pub use scope::{Scope, resolve_scope};
pub use tags::{Tag, TagNew, TagPatch};
pub use transactions::{
    PaymentMethod, Transaction, TransactionNew, TransactionPatch, TransactionSummary,
    TransactionType,
};
pub use users::User;
pub use util::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};

mod asset_valuations;
mod assets;
mod budget_categories;
mod budget_scope_guards;
mod budget_stats;
mod budgets;
mod categories;
mod credit_sources;
mod currency;
mod error;
mod families;
mod family_invites;
mod family_members;
mod goals;
mod income_streams;
mod merchant_categories;
mod money;
mod notifier;
mod ops;
mod ownership_migrations;
mod scope;
mod tags;
mod transaction_tags;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
