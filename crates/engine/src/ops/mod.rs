use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{InviteNotifier, LogNotifier, ResultEngine};

mod access;
mod assets;
mod budgets;
mod categories;
mod credit_sources;
mod families;
mod goals;
mod import;
mod income_streams;
mod invites;
mod merchant_categories;
mod tags;
mod transactions;
mod users;

pub use assets::AssetFilter;
pub use budgets::BudgetFilter;
pub use goals::GoalFilter;
pub use income_streams::IncomeStreamFilter;
pub use families::FamilyCreated;
pub use transactions::{DEFAULT_TRANSACTION_PAGE_SIZE, TransactionFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn InviteNotifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn InviteNotifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Where invite emails go. Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn InviteNotifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
        })
    }
}
