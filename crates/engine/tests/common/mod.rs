#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Category, CategoryType, Currency, Engine, InviteNotice, InviteNotifier, Money, PaymentMethod,
    Transaction, TransactionNew, TransactionType, User,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// Keeps every invite notice instead of mailing it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<InviteNotice>>,
}

impl InviteNotifier for RecordingNotifier {
    fn notify_invite<'a>(&'a self, notice: &'a InviteNotice) -> engine::NotifyFuture<'a> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(notice.clone());
            true
        })
    }
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection, Arc<RecordingNotifier>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier.clone())
        .build()
        .await
        .unwrap();
    engine.seed_system_categories().await.unwrap();
    engine.seed_merchant_categories().await.unwrap();
    (engine, db, notifier)
}

pub async fn register(engine: &Engine, email: &str) -> User {
    engine
        .register_user(email, "Test User", "correct horse", Some(Currency::Inr))
        .await
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn rupees(major: i64) -> Money {
    Money::new(major * 100)
}

pub async fn system_category(engine: &Engine, actor: Uuid, name: &str) -> Category {
    engine
        .list_categories(actor, Some(CategoryType::Expense))
        .await
        .unwrap()
        .into_iter()
        .find(|category| category.name == name)
        .unwrap()
}

pub fn expense(category_id: Uuid, amount: Money, t_date: NaiveDate) -> TransactionNew {
    TransactionNew {
        family_id: None,
        amount,
        currency: None,
        transaction_type: TransactionType::Expense,
        payment_method: PaymentMethod::Upi,
        category_id,
        subcategory_id: None,
        payee: None,
        merchant_type: None,
        mcc_code: None,
        t_date,
        notes: None,
        credit_source_id: None,
        is_paid: None,
        payment_due_date: None,
        tag_ids: Vec::new(),
    }
}

pub async fn spend(
    engine: &Engine,
    actor: Uuid,
    category_id: Uuid,
    amount: Money,
    t_date: NaiveDate,
) -> Transaction {
    engine
        .create_transaction(actor, expense(category_id, amount, t_date))
        .await
        .unwrap()
}
