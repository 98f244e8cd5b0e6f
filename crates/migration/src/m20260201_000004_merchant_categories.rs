//! Card network merchant category codes with a suggested spending category.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    Id,
}

#[derive(Iden)]
enum MerchantCategories {
    Table,
    MccCode,
    Description,
    CategoryRange,
    SuggestedCategoryId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MerchantCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MerchantCategories::MccCode)
                            .string_len(4)
                            .not_null()
                            .primary_key()
                            .check(Expr::cust("length(mcc_code) = 4")),
                    )
                    .col(
                        ColumnDef::new(MerchantCategories::Description)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MerchantCategories::CategoryRange).string_len(50))
                    .col(ColumnDef::new(MerchantCategories::SuggestedCategoryId).blob())
                    .col(
                        ColumnDef::new(MerchantCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-merchant_categories-suggested_category_id")
                            .from(
                                MerchantCategories::Table,
                                MerchantCategories::SuggestedCategoryId,
                            )
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MerchantCategories::Table).to_owned())
            .await
    }
}
