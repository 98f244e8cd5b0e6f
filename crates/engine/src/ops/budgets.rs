use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    Budget, BudgetAllocation, BudgetNew, BudgetPatch, BudgetWithStats, EngineError, Money, Page,
    PageRequest, ResultEngine, Scope, SpendTotals, TransactionType, budget_categories,
    budget_scope_guards, budgets, categories, compute_budget_stats, transactions, util,
};

use super::{Engine, access::scope_condition, with_tx};

/// Filters for [`Engine::list_budgets`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BudgetFilter {
    pub is_active: Option<bool>,
}

impl Engine {
    /// Creates a budget in the actor's scope (or the explicit family).
    ///
    /// An active budget must not overlap another active budget of the same
    /// user in the same family (or in personal scope).
    pub async fn create_budget(
        &self,
        actor: Uuid,
        new: BudgetNew,
    ) -> ResultEngine<BudgetWithStats> {
        let name = util::normalize_required_name(&new.name, "budget", budgets::MAX_BUDGET_NAME_LEN)?;

        let created = with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;

            let now = Utc::now();
            let budget = Budget {
                id: Uuid::new_v4(),
                user_id: actor,
                family_id,
                name,
                period_start: new.period_start,
                period_end: new.period_end,
                total_budget: new.total_budget,
                needs_budget: new.needs_budget,
                wants_budget: new.wants_budget,
                savings_budget: new.savings_budget,
                alert_threshold_percent: new
                    .alert_threshold_percent
                    .unwrap_or(budgets::DEFAULT_ALERT_THRESHOLD_PERCENT),
                is_active: new.is_active.unwrap_or(true),
                allocations: new.allocations,
                created_at: now,
                updated_at: now,
            };
            budget.validate()?;
            self.check_allocation_categories(&db_tx, &budget).await?;

            self.lock_budget_scope(&db_tx, actor, family_id).await?;
            if budget.is_active {
                self.ensure_no_overlap(&db_tx, &budget).await?;
            }

            let model: budgets::ActiveModel = (&budget).into();
            model.insert(&db_tx).await?;
            self.store_allocations(&db_tx, budget.id, &budget.allocations)
                .await?;

            self.with_stats(&db_tx, budget).await
        })?;

        tracing::info!(
            "budget {} created by {actor} for {}..{}",
            created.budget.id,
            created.budget.period_start,
            created.budget.period_end
        );
        Ok(created)
    }

    /// Budgets of the actor's scope, newest period first.
    pub async fn list_budgets(
        &self,
        actor: Uuid,
        filter: BudgetFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<BudgetWithStats>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let mut query = budgets::Entity::find()
                .filter(scope_condition::<budgets::Entity>(scope))
                .order_by_desc(budgets::Column::PeriodStart)
                .order_by_desc(budgets::Column::CreatedAt);
            if let Some(is_active) = filter.is_active {
                query = query.filter(budgets::Column::IsActive.eq(is_active));
            }

            let paginator = query.paginate(&db_tx, page.page_size());
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page.offset_page()).await?;

            let mut items = Vec::with_capacity(models.len());
            for model in models {
                let budget = self.load_budget(&db_tx, model).await?;
                items.push(self.with_stats(&db_tx, budget).await?);
            }
            Ok(Page::new(items, total, page))
        })
    }

    pub async fn get_budget(&self, actor: Uuid, budget_id: Uuid) -> ResultEngine<BudgetWithStats> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_read(&db_tx, actor, budget_id).await?;
            let budget = self.load_budget(&db_tx, model).await?;
            self.with_stats(&db_tx, budget).await
        })
    }

    /// The active budget of the actor's scope whose period contains `today`.
    pub async fn active_budget(
        &self,
        actor: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Option<BudgetWithStats>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let model = budgets::Entity::find()
                .filter(scope_condition::<budgets::Entity>(scope))
                .filter(budgets::Column::IsActive.eq(true))
                .filter(budgets::Column::PeriodStart.lte(today))
                .filter(budgets::Column::PeriodEnd.gte(today))
                .order_by_desc(budgets::Column::PeriodStart)
                .one(&db_tx)
                .await?;
            match model {
                Some(model) => {
                    let budget = self.load_budget(&db_tx, model).await?;
                    Ok(Some(self.with_stats(&db_tx, budget).await?))
                }
                None => Ok(None),
            }
        })
    }

    /// Applies `patch` and revalidates the merged budget, overlap included
    /// when it ends up active.
    pub async fn update_budget(
        &self,
        actor: Uuid,
        budget_id: Uuid,
        mut patch: BudgetPatch,
    ) -> ResultEngine<BudgetWithStats> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(util::normalize_required_name(
                &name,
                "budget",
                budgets::MAX_BUDGET_NAME_LEN,
            )?);
        }

        with_tx!(self, |db_tx| {
            let model = self.require_budget_write(&db_tx, actor, budget_id).await?;
            let mut budget = self.load_budget(&db_tx, model).await?;
            let replaces_allocations = patch.allocations.is_some();
            patch.apply(&mut budget);
            budget.updated_at = Utc::now();
            budget.validate()?;
            if replaces_allocations {
                self.check_allocation_categories(&db_tx, &budget).await?;
            }

            self.lock_budget_scope(&db_tx, budget.user_id, budget.family_id)
                .await?;
            if budget.is_active {
                self.ensure_no_overlap(&db_tx, &budget).await?;
            }

            let model: budgets::ActiveModel = (&budget).into();
            model.update(&db_tx).await?;
            if replaces_allocations {
                budget_categories::Entity::delete_many()
                    .filter(budget_categories::Column::BudgetId.eq(budget.id))
                    .exec(&db_tx)
                    .await?;
                self.store_allocations(&db_tx, budget.id, &budget.allocations)
                    .await?;
            }

            self.with_stats(&db_tx, budget).await
        })
    }

    pub async fn delete_budget(&self, actor: Uuid, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_budget_write(&db_tx, actor, budget_id).await?;
            budgets::Entity::delete_by_id(budget_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        tracing::info!("budget {budget_id} deleted by {actor}");
        Ok(())
    }

    /// Bumps the guard row of the `(user, family)` bucket. Concurrent budget
    /// writers in one bucket queue on this write.
    pub(super) async fn lock_budget_scope(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        family_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let guard = budget_scope_guards::ActiveModel {
            scope_key: ActiveValue::Set(Scope::budget_key(user_id, family_id)),
            revision: ActiveValue::Set(1),
        };
        budget_scope_guards::Entity::insert(guard)
            .on_conflict(
                OnConflict::column(budget_scope_guards::Column::ScopeKey)
                    .value(
                        budget_scope_guards::Column::Revision,
                        Expr::col(budget_scope_guards::Column::Revision).add(1),
                    )
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    /// First active budget of the bucket intersecting `[start, end]`.
    pub(super) async fn overlapping_budget(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        family_id: Option<Uuid>,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> ResultEngine<Option<budgets::Model>> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::IsActive.eq(true))
            .filter(budgets::Column::PeriodStart.lte(end))
            .filter(budgets::Column::PeriodEnd.gte(start));
        query = match family_id {
            Some(family_id) => query.filter(budgets::Column::FamilyId.eq(family_id)),
            None => query.filter(budgets::Column::FamilyId.is_null()),
        };
        if let Some(exclude) = exclude {
            query = query.filter(budgets::Column::Id.ne(exclude));
        }
        Ok(query.one(db).await?)
    }

    async fn ensure_no_overlap(&self, db: &DatabaseTransaction, budget: &Budget) -> ResultEngine<()> {
        let conflict = self
            .overlapping_budget(
                db,
                budget.user_id,
                budget.family_id,
                budget.period_start,
                budget.period_end,
                Some(budget.id),
            )
            .await?;
        match conflict {
            Some(existing) => Err(EngineError::ExistingKey(format!(
                "budget overlaps \"{}\" ({}..{})",
                existing.name, existing.period_start, existing.period_end
            ))),
            None => Ok(()),
        }
    }

    async fn check_allocation_categories(
        &self,
        db: &DatabaseTransaction,
        budget: &Budget,
    ) -> ResultEngine<()> {
        for allocation in &budget.allocations {
            self.require_usable_category(db, allocation.category_id, budget.family_id)
                .await?;
        }
        Ok(())
    }

    async fn store_allocations(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        allocations: &[BudgetAllocation],
    ) -> ResultEngine<()> {
        for allocation in allocations {
            budget_categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                budget_id: ActiveValue::Set(budget_id),
                category_id: ActiveValue::Set(allocation.category_id),
                allocated_minor: ActiveValue::Set(allocation.allocated.minor()),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    async fn load_budget(
        &self,
        db: &DatabaseTransaction,
        model: budgets::Model,
    ) -> ResultEngine<Budget> {
        let allocations = budget_categories::Entity::find()
            .filter(budget_categories::Column::BudgetId.eq(model.id))
            .order_by_asc(budget_categories::Column::CategoryId)
            .all(db)
            .await?
            .into_iter()
            .map(BudgetAllocation::from)
            .collect();
        Budget::from_model(model, allocations)
    }

    async fn with_stats(
        &self,
        db: &DatabaseTransaction,
        budget: Budget,
    ) -> ResultEngine<BudgetWithStats> {
        let spend = self.budget_spend(db, &budget).await?;
        let category_ids: Vec<Uuid> = budget.allocations.iter().map(|a| a.category_id).collect();
        let names: HashMap<Uuid, String> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            categories::Entity::find()
                .filter(categories::Column::Id.is_in(category_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|category| (category.id, category.name))
                .collect()
        };
        let stats = compute_budget_stats(&budget, &spend, &names);
        Ok(BudgetWithStats { budget, stats })
    }

    /// Expense sums of the budget's creator over the period, restricted to
    /// the budget's family when it has one.
    async fn budget_spend(
        &self,
        db: &DatabaseTransaction,
        budget: &Budget,
    ) -> ResultEngine<SpendTotals> {
        let expenses = || {
            let query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(budget.user_id))
                .filter(transactions::Column::TransactionType.eq(TransactionType::Expense.as_str()))
                .filter(transactions::Column::TDate.gte(budget.period_start))
                .filter(transactions::Column::TDate.lte(budget.period_end));
            match budget.family_id {
                Some(family_id) => query.filter(transactions::Column::FamilyId.eq(family_id)),
                None => query,
            }
        };

        let total = expenses()
            .select_only()
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?
            .flatten()
            .unwrap_or_default();

        let category_ids: Vec<Uuid> = budget.allocations.iter().map(|a| a.category_id).collect();
        let mut by_category = HashMap::with_capacity(category_ids.len());
        if !category_ids.is_empty() {
            let rows: Vec<(Uuid, Option<i64>)> = expenses()
                .filter(transactions::Column::CategoryId.is_in(category_ids))
                .select_only()
                .column(transactions::Column::CategoryId)
                .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
                .group_by(transactions::Column::CategoryId)
                .into_tuple()
                .all(db)
                .await?;
            for (category_id, spent) in rows {
                by_category.insert(category_id, Money::new(spent.unwrap_or_default()));
            }
        }

        Ok(SpendTotals {
            total: Money::new(total),
            by_category,
        })
    }
}
