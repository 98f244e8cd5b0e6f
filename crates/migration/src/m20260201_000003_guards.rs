//! Bookkeeping tables: per-scope budget write guards and the audit trail of
//! personal-to-family ownership migrations.

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
enum BudgetScopeGuards {
    Table,
    ScopeKey,
    Revision,
}

#[derive(Iden)]
enum OwnershipMigrations {
    Table,
    Id,
    UserId,
    FamilyId,
    FromDate,
    ToDate,
    Transactions,
    Budgets,
    BudgetsSkipped,
    CreditSources,
    Assets,
    IncomeStreams,
    Goals,
    Tags,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per budget scope; bumping `revision` takes the write lock.
        manager
            .create_table(
                Table::create()
                    .table(BudgetScopeGuards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetScopeGuards::ScopeKey)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BudgetScopeGuards::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        let counter = |column: OwnershipMigrations| {
            ColumnDef::new(column)
                .big_integer()
                .not_null()
                .default(0)
                .to_owned()
        };
        manager
            .create_table(
                Table::create()
                    .table(OwnershipMigrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OwnershipMigrations::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OwnershipMigrations::UserId).blob().not_null())
                    .col(
                        ColumnDef::new(OwnershipMigrations::FamilyId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OwnershipMigrations::FromDate).date())
                    .col(ColumnDef::new(OwnershipMigrations::ToDate).date())
                    .col(counter(OwnershipMigrations::Transactions))
                    .col(counter(OwnershipMigrations::Budgets))
                    .col(counter(OwnershipMigrations::BudgetsSkipped))
                    .col(counter(OwnershipMigrations::CreditSources))
                    .col(counter(OwnershipMigrations::Assets))
                    .col(counter(OwnershipMigrations::IncomeStreams))
                    .col(counter(OwnershipMigrations::Goals))
                    .col(counter(OwnershipMigrations::Tags))
                    .col(
                        ColumnDef::new(OwnershipMigrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ownership_migrations-user_id")
                            .from(OwnershipMigrations::Table, OwnershipMigrations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ownership_migrations-family_id")
                            .from(OwnershipMigrations::Table, OwnershipMigrations::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ownership_migrations-user_id-family_id-unique")
                    .table(OwnershipMigrations::Table)
                    .col(OwnershipMigrations::UserId)
                    .col(OwnershipMigrations::FamilyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OwnershipMigrations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetScopeGuards::Table).to_owned())
            .await?;
        Ok(())
    }
}
