//! Planning tables: budgets with their category allocations, assets with
//! valuation history, income streams and financial goals.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Families {
    Table,
    Id,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    UserId,
    FamilyId,
    Name,
    PeriodStart,
    PeriodEnd,
    TotalBudgetMinor,
    NeedsBudgetMinor,
    WantsBudgetMinor,
    SavingsBudgetMinor,
    AlertThresholdPercent,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetCategories {
    Table,
    Id,
    BudgetId,
    CategoryId,
    AllocatedMinor,
}

#[derive(Iden)]
enum Assets {
    Table,
    Id,
    UserId,
    FamilyId,
    AssetType,
    Name,
    SymbolIsin,
    QuantityMilli,
    PurchasePriceMinor,
    CurrentPriceMinor,
    PurchaseDate,
    MaturityDate,
    InterestRateBps,
    RiskLevel,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AssetValuations {
    Table,
    Id,
    AssetId,
    ValuationDate,
    PricePerUnitMinor,
    TotalValueMinor,
    Source,
    CreatedAt,
}

#[derive(Iden)]
enum IncomeStreams {
    Table,
    Id,
    UserId,
    FamilyId,
    Source,
    CategoryId,
    AmountMinor,
    Currency,
    Frequency,
    StartDate,
    EndDate,
    IsTaxable,
    TaxRateBps,
    IsActive,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum FinancialGoals {
    Table,
    Id,
    UserId,
    FamilyId,
    GoalName,
    GoalType,
    TargetAmountMinor,
    CurrentAmountMinor,
    TargetDate,
    Priority,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

/// `user_id` and `family_id` references shared by every owned planning table.
fn owner_keys(table: &str) -> [ForeignKeyCreateStatement; 2] {
    [
        ForeignKey::create()
            .name(format!("fk-{table}-user_id"))
            .from(Alias::new(table), Alias::new("user_id"))
            .to(Users::Table, Users::Id)
            .on_delete(ForeignKeyAction::Cascade)
            .to_owned(),
        ForeignKey::create()
            .name(format!("fk-{table}-family_id"))
            .from(Alias::new(table), Alias::new("family_id"))
            .to(Families::Table, Families::Id)
            .on_delete(ForeignKeyAction::Cascade)
            .to_owned(),
    ]
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Budgets
        // ───────────────────────────────────────────────────────────────────
        let [mut user_fk, mut family_fk] = owner_keys("budgets");
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::UserId).blob().not_null())
                    .col(ColumnDef::new(Budgets::FamilyId).blob())
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(ColumnDef::new(Budgets::PeriodStart).date().not_null())
                    .col(ColumnDef::new(Budgets::PeriodEnd).date().not_null())
                    .col(ColumnDef::new(Budgets::TotalBudgetMinor).big_integer())
                    .col(ColumnDef::new(Budgets::NeedsBudgetMinor).big_integer())
                    .col(ColumnDef::new(Budgets::WantsBudgetMinor).big_integer())
                    .col(ColumnDef::new(Budgets::SavingsBudgetMinor).big_integer())
                    .col(
                        ColumnDef::new(Budgets::AlertThresholdPercent)
                            .small_integer()
                            .not_null()
                            .default(80)
                            .check(Expr::col(Budgets::AlertThresholdPercent).between(1, 100)),
                    )
                    .col(
                        ColumnDef::new(Budgets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Budgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(Expr::col(Budgets::PeriodEnd).gte(Expr::col(Budgets::PeriodStart)))
                    .foreign_key(&mut user_fk)
                    .foreign_key(&mut family_fk)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-family_id-period")
                    .table(Budgets::Table)
                    .col(Budgets::FamilyId)
                    .col(Budgets::PeriodStart)
                    .col(Budgets::PeriodEnd)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id-period")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::PeriodStart)
                    .col(Budgets::PeriodEnd)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Budget category allocations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetCategories::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetCategories::BudgetId).blob().not_null())
                    .col(
                        ColumnDef::new(BudgetCategories::CategoryId)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::AllocatedMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(BudgetCategories::AllocatedMinor).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-budget_id")
                            .from(BudgetCategories::Table, BudgetCategories::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-category_id")
                            .from(BudgetCategories::Table, BudgetCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_categories-budget_id-category_id-unique")
                    .table(BudgetCategories::Table)
                    .col(BudgetCategories::BudgetId)
                    .col(BudgetCategories::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Assets
        // ───────────────────────────────────────────────────────────────────
        let [mut user_fk, mut family_fk] = owner_keys("assets");
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assets::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Assets::UserId).blob().not_null())
                    .col(ColumnDef::new(Assets::FamilyId).blob())
                    .col(ColumnDef::new(Assets::AssetType).string().not_null())
                    .col(ColumnDef::new(Assets::Name).string().not_null())
                    .col(ColumnDef::new(Assets::SymbolIsin).string())
                    .col(
                        ColumnDef::new(Assets::QuantityMilli)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Assets::QuantityMilli).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Assets::PurchasePriceMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Assets::PurchasePriceMinor).gte(0)),
                    )
                    .col(ColumnDef::new(Assets::CurrentPriceMinor).big_integer())
                    .col(ColumnDef::new(Assets::PurchaseDate).date())
                    .col(ColumnDef::new(Assets::MaturityDate).date())
                    .col(ColumnDef::new(Assets::InterestRateBps).integer())
                    .col(ColumnDef::new(Assets::RiskLevel).string())
                    .col(ColumnDef::new(Assets::Notes).string())
                    .col(
                        ColumnDef::new(Assets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Assets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut user_fk)
                    .foreign_key(&mut family_fk)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Asset valuations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AssetValuations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetValuations::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssetValuations::AssetId).blob().not_null())
                    .col(
                        ColumnDef::new(AssetValuations::ValuationDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetValuations::PricePerUnitMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetValuations::TotalValueMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetValuations::Source)
                            .string()
                            .not_null()
                            .default("manual"),
                    )
                    .col(
                        ColumnDef::new(AssetValuations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-asset_valuations-asset_id")
                            .from(AssetValuations::Table, AssetValuations::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-asset_valuations-asset_id-valuation_date-unique")
                    .table(AssetValuations::Table)
                    .col(AssetValuations::AssetId)
                    .col(AssetValuations::ValuationDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Income streams
        // ───────────────────────────────────────────────────────────────────
        let [mut user_fk, mut family_fk] = owner_keys("income_streams");
        manager
            .create_table(
                Table::create()
                    .table(IncomeStreams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IncomeStreams::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IncomeStreams::UserId).blob().not_null())
                    .col(ColumnDef::new(IncomeStreams::FamilyId).blob())
                    .col(ColumnDef::new(IncomeStreams::Source).string().not_null())
                    .col(ColumnDef::new(IncomeStreams::CategoryId).blob())
                    .col(
                        ColumnDef::new(IncomeStreams::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(IncomeStreams::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(IncomeStreams::Currency).string().not_null())
                    .col(ColumnDef::new(IncomeStreams::Frequency).string().not_null())
                    .col(ColumnDef::new(IncomeStreams::StartDate).date().not_null())
                    .col(ColumnDef::new(IncomeStreams::EndDate).date())
                    .col(
                        ColumnDef::new(IncomeStreams::IsTaxable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(IncomeStreams::TaxRateBps).integer())
                    .col(
                        ColumnDef::new(IncomeStreams::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(IncomeStreams::Notes).string())
                    .col(
                        ColumnDef::new(IncomeStreams::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IncomeStreams::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut user_fk)
                    .foreign_key(&mut family_fk)
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-income_streams-category_id")
                            .from(IncomeStreams::Table, IncomeStreams::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Financial goals
        // ───────────────────────────────────────────────────────────────────
        let [mut user_fk, mut family_fk] = owner_keys("financial_goals");
        manager
            .create_table(
                Table::create()
                    .table(FinancialGoals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialGoals::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialGoals::UserId).blob().not_null())
                    .col(ColumnDef::new(FinancialGoals::FamilyId).blob())
                    .col(ColumnDef::new(FinancialGoals::GoalName).string().not_null())
                    .col(ColumnDef::new(FinancialGoals::GoalType).string().not_null())
                    .col(
                        ColumnDef::new(FinancialGoals::TargetAmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(FinancialGoals::TargetAmountMinor).gt(0)),
                    )
                    .col(
                        ColumnDef::new(FinancialGoals::CurrentAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(FinancialGoals::CurrentAmountMinor).gte(0)),
                    )
                    .col(ColumnDef::new(FinancialGoals::TargetDate).date())
                    .col(
                        ColumnDef::new(FinancialGoals::Priority)
                            .string()
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(FinancialGoals::Status)
                            .string()
                            .not_null()
                            .default("in_progress"),
                    )
                    .col(ColumnDef::new(FinancialGoals::Notes).string())
                    .col(
                        ColumnDef::new(FinancialGoals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialGoals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut user_fk)
                    .foreign_key(&mut family_fk)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FinancialGoals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IncomeStreams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssetValuations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        Ok(())
    }
}
