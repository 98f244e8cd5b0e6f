//! Identity, family and ledger tables.
//!
//! - `users`: accounts, with the currently active family
//! - `families`, `family_members`, `family_invites`: shared spaces
//! - `categories`: global system categories and family custom ones
//! - `tags`, `credit_sources`: per-scope lookups
//! - `transactions`, `transaction_tags`: the ledger itself

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    FullName,
    PasswordHash,
    DefaultCurrency,
    ActiveFamilyId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Families {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum FamilyMembers {
    Table,
    Id,
    FamilyId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum FamilyInvites {
    Table,
    Id,
    FamilyId,
    InvitedEmail,
    InvitedByUserId,
    Role,
    Token,
    Accepted,
    AcceptedByUserId,
    CreatedAt,
    AcceptedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    FamilyId,
    ParentCategoryId,
    CategoryType,
    BudgetClassification,
    Icon,
    Color,
    IsSystem,
    DisplayOrder,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
    UserId,
    FamilyId,
    Name,
    Color,
    CreatedAt,
}

#[derive(Iden)]
enum CreditSources {
    Table,
    Id,
    UserId,
    FamilyId,
    CardName,
    CardLast4,
    CardNetwork,
    CreditLimitMinor,
    BillingDay,
    DueDay,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    FamilyId,
    AmountMinor,
    Currency,
    TransactionType,
    PaymentMethod,
    CategoryId,
    SubcategoryId,
    Payee,
    MerchantType,
    MccCode,
    TDate,
    Notes,
    CreditSourceId,
    IsPaid,
    PaymentDueDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TransactionTags {
    Table,
    TransactionId,
    TagId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        // SQLite resolves the families reference lazily, so the cycle
        // between users and families needs no deferred constraint.
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::DefaultCurrency)
                            .string()
                            .not_null()
                            .default("INR"),
                    )
                    .col(ColumnDef::new(Users::ActiveFamilyId).blob())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-active_family_id")
                            .from(Users::Table, Users::ActiveFamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Families
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Families::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Families::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Families::Name).string().not_null())
                    .col(ColumnDef::new(Families::CreatedBy).blob().not_null())
                    .col(
                        ColumnDef::new(Families::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-families-created_by")
                            .from(Families::Table, Families::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Family members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FamilyMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FamilyMembers::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FamilyMembers::FamilyId).blob().not_null())
                    .col(ColumnDef::new(FamilyMembers::UserId).blob().not_null())
                    .col(
                        ColumnDef::new(FamilyMembers::Role)
                            .string()
                            .not_null()
                            .check(Expr::col(FamilyMembers::Role).is_in([
                                "admin", "member", "viewer",
                            ])),
                    )
                    .col(
                        ColumnDef::new(FamilyMembers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_members-family_id")
                            .from(FamilyMembers::Table, FamilyMembers::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_members-user_id")
                            .from(FamilyMembers::Table, FamilyMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-family_members-family_id-user_id-unique")
                    .table(FamilyMembers::Table)
                    .col(FamilyMembers::FamilyId)
                    .col(FamilyMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-family_members-user_id")
                    .table(FamilyMembers::Table)
                    .col(FamilyMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Family invites
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FamilyInvites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FamilyInvites::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FamilyInvites::FamilyId).blob().not_null())
                    .col(
                        ColumnDef::new(FamilyInvites::InvitedEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FamilyInvites::InvitedByUserId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FamilyInvites::Role).string().not_null())
                    .col(
                        ColumnDef::new(FamilyInvites::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(FamilyInvites::Accepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FamilyInvites::AcceptedByUserId).blob())
                    .col(
                        ColumnDef::new(FamilyInvites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FamilyInvites::AcceptedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(FamilyInvites::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_invites-family_id")
                            .from(FamilyInvites::Table, FamilyInvites::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_invites-invited_by_user_id")
                            .from(FamilyInvites::Table, FamilyInvites::InvitedByUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-family_invites-family_id-invited_email")
                    .table(FamilyInvites::Table)
                    .col(FamilyInvites::FamilyId)
                    .col(FamilyInvites::InvitedEmail)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::FamilyId).blob())
                    .col(ColumnDef::new(Categories::ParentCategoryId).blob())
                    .col(
                        ColumnDef::new(Categories::CategoryType)
                            .string()
                            .not_null()
                            .check(Expr::col(Categories::CategoryType).is_in(["income", "expense"])),
                    )
                    .col(ColumnDef::new(Categories::BudgetClassification).string())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(ColumnDef::new(Categories::Color).string())
                    .col(
                        ColumnDef::new(Categories::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Categories::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-family_id")
                            .from(Categories::Table, Categories::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-parent_category_id")
                            .from(Categories::Table, Categories::ParentCategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-family_id")
                    .table(Categories::Table)
                    .col(Categories::FamilyId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Tags
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Tags::UserId).blob().not_null())
                    .col(ColumnDef::new(Tags::FamilyId).blob())
                    .col(ColumnDef::new(Tags::Name).string().not_null())
                    .col(ColumnDef::new(Tags::Color).string())
                    .col(
                        ColumnDef::new(Tags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tags-user_id")
                            .from(Tags::Table, Tags::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tags-family_id")
                            .from(Tags::Table, Tags::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tags-name-user_id-family_id-unique")
                    .table(Tags::Table)
                    .col(Tags::Name)
                    .col(Tags::UserId)
                    .col(Tags::FamilyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Credit sources
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditSources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditSources::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditSources::UserId).blob().not_null())
                    .col(ColumnDef::new(CreditSources::FamilyId).blob())
                    .col(ColumnDef::new(CreditSources::CardName).string().not_null())
                    .col(ColumnDef::new(CreditSources::CardLast4).string().not_null())
                    .col(
                        ColumnDef::new(CreditSources::CardNetwork)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditSources::CreditLimitMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(CreditSources::CreditLimitMinor).gt(0)),
                    )
                    .col(
                        ColumnDef::new(CreditSources::BillingDay)
                            .small_integer()
                            .not_null()
                            .check(Expr::col(CreditSources::BillingDay).between(1, 31)),
                    )
                    .col(
                        ColumnDef::new(CreditSources::DueDay)
                            .small_integer()
                            .not_null()
                            .check(Expr::col(CreditSources::DueDay).between(1, 31)),
                    )
                    .col(
                        ColumnDef::new(CreditSources::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CreditSources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_sources-user_id")
                            .from(CreditSources::Table, CreditSources::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_sources-family_id")
                            .from(CreditSources::Table, CreditSources::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).blob().not_null())
                    .col(ColumnDef::new(Transactions::FamilyId).blob())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(Transactions::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string()
                            .not_null()
                            .check(
                                Expr::col(Transactions::TransactionType)
                                    .is_in(["income", "expense"]),
                            ),
                    )
                    .col(
                        ColumnDef::new(Transactions::PaymentMethod)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CategoryId).blob().not_null())
                    .col(ColumnDef::new(Transactions::SubcategoryId).blob())
                    .col(ColumnDef::new(Transactions::Payee).string())
                    .col(ColumnDef::new(Transactions::MerchantType).string())
                    .col(ColumnDef::new(Transactions::MccCode).string())
                    .col(ColumnDef::new(Transactions::TDate).date().not_null())
                    .col(ColumnDef::new(Transactions::Notes).string())
                    .col(ColumnDef::new(Transactions::CreditSourceId).blob())
                    .col(
                        ColumnDef::new(Transactions::IsPaid)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Transactions::PaymentDueDate).date())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-family_id")
                            .from(Transactions::Table, Transactions::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // Checked at statement end so a family delete can drop
                    // the family's categories and transactions together.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-subcategory_id")
                            .from(Transactions::Table, Transactions::SubcategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-credit_source_id")
                            .from(Transactions::Table, Transactions::CreditSourceId)
                            .to(CreditSources::Table, CreditSources::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-family_id-t_date")
                    .table(Transactions::Table)
                    .col(Transactions::FamilyId)
                    .col(Transactions::TDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-t_date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::TDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-category_id")
                    .table(Transactions::Table)
                    .col(Transactions::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Transaction tags
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TransactionTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionTags::TransactionId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionTags::TagId).blob().not_null())
                    .primary_key(
                        Index::create()
                            .col(TransactionTags::TransactionId)
                            .col(TransactionTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_tags-transaction_id")
                            .from(TransactionTags::Table, TransactionTags::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_tags-tag_id")
                            .from(TransactionTags::Table, TransactionTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation
        manager
            .drop_table(Table::drop().table(TransactionTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditSources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FamilyInvites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FamilyMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Families::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
