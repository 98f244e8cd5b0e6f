use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, Page, PageRequest, PaymentMethod, ResultEngine, Transaction,
    TransactionNew, TransactionPatch, TransactionSummary, TransactionType, transaction_tags,
    transactions, util,
};

use super::{Engine, access::scope_condition, with_tx};

pub const DEFAULT_TRANSACTION_PAGE_SIZE: u64 = 50;

/// Filters for [`Engine::list_transactions`]. Date bounds are inclusive;
/// `search` matches payee, notes and merchant type case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub search: Option<String>,
}

impl TransactionFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(start) = self.start_date {
            condition = condition.add(transactions::Column::TDate.gte(start));
        }
        if let Some(end) = self.end_date {
            condition = condition.add(transactions::Column::TDate.lte(end));
        }
        if let Some(kind) = self.transaction_type {
            condition = condition.add(transactions::Column::TransactionType.eq(kind.as_str()));
        }
        if let Some(category_id) = self.category_id {
            condition = condition.add(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(method) = self.payment_method {
            condition = condition.add(transactions::Column::PaymentMethod.eq(method.as_str()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let pattern = format!("%{}%", search.to_lowercase());
            let lower = |column: transactions::Column| Expr::expr(Func::lower(Expr::col(column)));
            condition = condition.add(
                Condition::any()
                    .add(lower(transactions::Column::Payee).like(pattern.clone()))
                    .add(lower(transactions::Column::Notes).like(pattern.clone()))
                    .add(lower(transactions::Column::MerchantType).like(pattern)),
            );
        }
        condition
    }
}

impl Engine {
    pub async fn create_transaction(
        &self,
        actor: Uuid,
        new: TransactionNew,
    ) -> ResultEngine<Transaction> {
        let created = with_tx!(self, |db_tx| {
            let (user, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;

            let now = Utc::now();
            let currency = match new.currency {
                Some(currency) => currency,
                None => Currency::try_from(user.default_currency.as_str())?,
            };
            let tx = Transaction {
                id: Uuid::new_v4(),
                user_id: actor,
                family_id,
                amount: new.amount,
                currency,
                transaction_type: new.transaction_type,
                payment_method: new.payment_method,
                category_id: new.category_id,
                subcategory_id: new.subcategory_id,
                payee: util::normalize_optional_text(new.payee),
                merchant_type: util::normalize_optional_text(new.merchant_type),
                mcc_code: util::normalize_optional_text(new.mcc_code),
                t_date: new.t_date,
                notes: util::normalize_optional_text(new.notes),
                credit_source_id: new.credit_source_id,
                is_paid: new.is_paid.unwrap_or(true),
                payment_due_date: new.payment_due_date,
                tag_ids: dedup(new.tag_ids),
                created_at: now,
                updated_at: now,
            };
            tx.validate()?;
            self.check_transaction_refs(&db_tx, actor, &tx).await?;

            let model: transactions::ActiveModel = (&tx).into();
            model.insert(&db_tx).await?;
            self.store_transaction_tags(&db_tx, tx.id, &tx.tag_ids)
                .await?;
            Ok(tx)
        })?;

        tracing::debug!("transaction {} created by {actor}", created.id);
        Ok(created)
    }

    /// Transactions of the actor's scope, newest first.
    pub async fn list_transactions(
        &self,
        actor: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Transaction>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let paginator = transactions::Entity::find()
                .filter(scope_condition::<transactions::Entity>(scope))
                .filter(filter.condition())
                .order_by_desc(transactions::Column::TDate)
                .order_by_desc(transactions::Column::CreatedAt)
                .paginate(&db_tx, page.page_size());
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page.offset_page()).await?;

            let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();
            let mut tags = self.tags_by_transaction(&db_tx, ids).await?;
            let items = models
                .into_iter()
                .map(|model| {
                    let tag_ids = tags.remove(&model.id).unwrap_or_default();
                    Transaction::from_model(model, tag_ids)
                })
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(Page::new(items, total, page))
        })
    }

    /// Income and expense totals of the actor's scope, `start_date` and
    /// `end_date` inclusive.
    pub async fn transaction_summary(
        &self,
        actor: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ResultEngine<TransactionSummary> {
        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            return Err(EngineError::InvalidPeriod(
                "start_date must not be after end_date".to_string(),
            ));
        }
        let filter = TransactionFilter {
            start_date,
            end_date,
            ..TransactionFilter::default()
        };

        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let rows: Vec<(String, Option<i64>, i64)> = transactions::Entity::find()
                .filter(scope_condition::<transactions::Entity>(scope))
                .filter(filter.condition())
                .select_only()
                .column(transactions::Column::TransactionType)
                .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
                .column_as(Expr::col(transactions::Column::Id).count(), "count")
                .group_by(transactions::Column::TransactionType)
                .into_tuple()
                .all(&db_tx)
                .await?;

            let mut income = (Money::ZERO, 0);
            let mut expenses = (Money::ZERO, 0);
            for (kind, total, count) in rows {
                let totals = (
                    Money::new(total.unwrap_or_default()),
                    u64::try_from(count).unwrap_or_default(),
                );
                match TransactionType::try_from(kind.as_str())? {
                    TransactionType::Income => income = totals,
                    TransactionType::Expense => expenses = totals,
                }
            }
            Ok(TransactionSummary::new(start_date, end_date, income, expenses))
        })
    }

    pub async fn get_transaction(
        &self,
        actor: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_read(&db_tx, actor, transaction_id)
                .await?;
            self.load_transaction(&db_tx, model).await
        })
    }

    pub async fn update_transaction(
        &self,
        actor: Uuid,
        transaction_id: Uuid,
        mut patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        patch.payee = patch.payee.map(util::normalize_optional_text);
        patch.notes = patch.notes.map(util::normalize_optional_text);
        patch.merchant_type = patch.merchant_type.map(util::normalize_optional_text);
        patch.mcc_code = patch.mcc_code.map(util::normalize_optional_text);
        patch.tag_ids = patch.tag_ids.map(dedup);

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_write(&db_tx, actor, transaction_id)
                .await?;
            let mut tx = self.load_transaction(&db_tx, model).await?;
            let replaces_tags = patch.tag_ids.is_some();
            patch.apply(&mut tx);
            tx.updated_at = Utc::now();
            tx.validate()?;
            self.check_transaction_refs(&db_tx, actor, &tx).await?;

            let model: transactions::ActiveModel = (&tx).into();
            model.update(&db_tx).await?;
            if replaces_tags {
                transaction_tags::Entity::delete_many()
                    .filter(transaction_tags::Column::TransactionId.eq(tx.id))
                    .exec(&db_tx)
                    .await?;
                self.store_transaction_tags(&db_tx, tx.id, &tx.tag_ids)
                    .await?;
            }
            Ok(tx)
        })
    }

    pub async fn delete_transaction(&self, actor: Uuid, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_transaction_write(&db_tx, actor, transaction_id)
                .await?;
            transactions::Entity::delete_by_id(transaction_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Category, subcategory, credit source and tags must all be visible to
    /// the actor and usable in the transaction's family.
    async fn check_transaction_refs(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        self.require_usable_category(db, tx.category_id, tx.family_id)
            .await?;
        if let Some(subcategory_id) = tx.subcategory_id {
            self.require_usable_category(db, subcategory_id, tx.family_id)
                .await?;
        }
        if let Some(credit_source_id) = tx.credit_source_id {
            self.require_credit_source_read(db, actor, credit_source_id)
                .await?;
        }
        for tag_id in &tx.tag_ids {
            self.require_tag_read(db, actor, *tag_id).await?;
        }
        Ok(())
    }

    async fn store_transaction_tags(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
        tag_ids: &[Uuid],
    ) -> ResultEngine<()> {
        for tag_id in tag_ids {
            transaction_tags::ActiveModel {
                transaction_id: ActiveValue::Set(transaction_id),
                tag_id: ActiveValue::Set(*tag_id),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    async fn load_transaction(
        &self,
        db: &DatabaseTransaction,
        model: transactions::Model,
    ) -> ResultEngine<Transaction> {
        let mut tags = self.tags_by_transaction(db, vec![model.id]).await?;
        let tag_ids = tags.remove(&model.id).unwrap_or_default();
        Transaction::from_model(model, tag_ids)
    }

    async fn tags_by_transaction(
        &self,
        db: &DatabaseTransaction,
        transaction_ids: Vec<Uuid>,
    ) -> ResultEngine<HashMap<Uuid, Vec<Uuid>>> {
        let mut tags: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if transaction_ids.is_empty() {
            return Ok(tags);
        }
        let rows = transaction_tags::Entity::find()
            .filter(transaction_tags::Column::TransactionId.is_in(transaction_ids))
            .all(db)
            .await?;
        for row in rows {
            tags.entry(row.transaction_id).or_default().push(row.tag_id);
        }
        Ok(tags)
    }
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    #[test]
    fn search_lowercases_both_sides() {
        let filter = TransactionFilter {
            search: Some("  Big Bazaar ".to_string()),
            ..TransactionFilter::default()
        };
        let sql = transactions::Entity::find()
            .filter(filter.condition())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("LOWER("));
        assert!(sql.contains("'%big bazaar%'"));
        assert!(sql.contains("merchant_type"));
    }

    #[test]
    fn blank_search_adds_nothing() {
        let filter = TransactionFilter {
            search: Some("   ".to_string()),
            ..TransactionFilter::default()
        };
        let sql = transactions::Entity::find()
            .filter(filter.condition())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(!sql.contains("LIKE"));
    }
}
