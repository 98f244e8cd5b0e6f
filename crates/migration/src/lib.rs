pub use sea_orm_migration::prelude::*;

mod m20260201_000001_init;
mod m20260201_000002_planning;
mod m20260201_000003_guards;
mod m20260201_000004_merchant_categories;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260201_000001_init::Migration),
            Box::new(m20260201_000002_planning::Migration),
            Box::new(m20260201_000003_guards::Migration),
            Box::new(m20260201_000004_merchant_categories::Migration),
        ]
    }
}
