//! Moving personal records into a family.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, ImportOptions, ImportReport, ResultEngine, Scope, assets, budgets,
    credit_sources, goals, income_streams, ownership_migrations, tags, transactions,
};

use super::{
    Engine,
    access::{ScopedEntity, scope_condition},
    with_tx,
};

/// Stamps every personal row of `E` owned by `actor` with `family_id`.
async fn restamp<E: ScopedEntity>(
    db: &DatabaseTransaction,
    actor: Uuid,
    family_id: Uuid,
) -> ResultEngine<u64> {
    let result = E::update_many()
        .col_expr(E::family_column(), Expr::value(Some(family_id)))
        .filter(scope_condition::<E>(Scope::Personal(actor)))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

impl Engine {
    /// Moves the actor's personal records into `family_id`. Admin only.
    ///
    /// Runs once per `(user, family)`: later calls return the first report.
    pub async fn migrate_ownership(
        &self,
        actor: Uuid,
        family_id: Uuid,
        options: ImportOptions,
    ) -> ResultEngine<ImportReport> {
        with_tx!(self, |db_tx| {
            self.require_family_admin(&db_tx, family_id, actor).await?;
            self.import_personal_records(&db_tx, actor, family_id, options)
                .await
        })
    }

    pub(super) async fn import_personal_records(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        family_id: Uuid,
        options: ImportOptions,
    ) -> ResultEngine<ImportReport> {
        if let (Some(from), Some(to)) = (options.from_date, options.to_date)
            && from > to
        {
            return Err(EngineError::InvalidPeriod(
                "import from_date must not be after to_date".to_string(),
            ));
        }

        let previous = ownership_migrations::Entity::find()
            .filter(ownership_migrations::Column::UserId.eq(actor))
            .filter(ownership_migrations::Column::FamilyId.eq(family_id))
            .one(db)
            .await?;
        if let Some(previous) = previous {
            tracing::info!("ownership of {actor} already moved into {family_id}");
            return Ok(ImportReport::from(previous));
        }

        let mut report = ImportReport {
            id: Uuid::new_v4(),
            user_id: actor,
            family_id,
            from_date: options.from_date,
            to_date: options.to_date,
            transactions: 0,
            budgets: 0,
            budgets_skipped: 0,
            credit_sources: 0,
            assets: 0,
            income_streams: 0,
            goals: 0,
            tags: 0,
            created_at: Utc::now(),
        };

        if options.transactions {
            let mut query = transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::FamilyId,
                    Expr::value(Some(family_id)),
                )
                .filter(scope_condition::<transactions::Entity>(Scope::Personal(
                    actor,
                )));
            if let Some(from) = options.from_date {
                query = query.filter(transactions::Column::TDate.gte(from));
            }
            if let Some(to) = options.to_date {
                query = query.filter(transactions::Column::TDate.lte(to));
            }
            report.transactions = query.exec(db).await?.rows_affected;
        }
        if options.budgets {
            let (moved, skipped) = self.import_budgets(db, actor, family_id).await?;
            report.budgets = moved;
            report.budgets_skipped = skipped;
        }
        if options.credit_sources {
            report.credit_sources = restamp::<credit_sources::Entity>(db, actor, family_id).await?;
        } else if options.transactions {
            report.credit_sources = self
                .import_referenced_credit_sources(db, actor, family_id)
                .await?;
        }
        if options.assets {
            report.assets = restamp::<assets::Entity>(db, actor, family_id).await?;
        }
        if options.income_streams {
            report.income_streams = restamp::<income_streams::Entity>(db, actor, family_id).await?;
        }
        if options.goals {
            report.goals = restamp::<goals::Entity>(db, actor, family_id).await?;
        }
        if options.tags {
            report.tags = self.import_tags(db, actor, family_id).await?;
        }

        let count = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
        ownership_migrations::ActiveModel {
            id: ActiveValue::Set(report.id),
            user_id: ActiveValue::Set(actor),
            family_id: ActiveValue::Set(family_id),
            from_date: ActiveValue::Set(report.from_date),
            to_date: ActiveValue::Set(report.to_date),
            transactions: ActiveValue::Set(count(report.transactions)),
            budgets: ActiveValue::Set(count(report.budgets)),
            budgets_skipped: ActiveValue::Set(count(report.budgets_skipped)),
            credit_sources: ActiveValue::Set(count(report.credit_sources)),
            assets: ActiveValue::Set(count(report.assets)),
            income_streams: ActiveValue::Set(count(report.income_streams)),
            goals: ActiveValue::Set(count(report.goals)),
            tags: ActiveValue::Set(count(report.tags)),
            created_at: ActiveValue::Set(report.created_at),
        }
        .insert(db)
        .await?;

        tracing::info!(
            transactions = report.transactions,
            budgets = report.budgets,
            budgets_skipped = report.budgets_skipped,
            "moved personal records of {actor} into family {family_id}"
        );
        Ok(report)
    }

    /// Active budgets that would overlap one the actor already has in the
    /// family stay personal.
    async fn import_budgets(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        family_id: Uuid,
    ) -> ResultEngine<(u64, u64)> {
        self.lock_budget_scope(db, actor, Some(family_id)).await?;

        let personal = budgets::Entity::find()
            .filter(scope_condition::<budgets::Entity>(Scope::Personal(actor)))
            .all(db)
            .await?;

        let mut moved = 0;
        let mut skipped = 0;
        for budget in personal {
            if budget.is_active
                && self
                    .overlapping_budget(
                        db,
                        actor,
                        Some(family_id),
                        budget.period_start,
                        budget.period_end,
                        None,
                    )
                    .await?
                    .is_some()
            {
                skipped += 1;
                continue;
            }
            let mut active: budgets::ActiveModel = budget.into();
            active.family_id = ActiveValue::Set(Some(family_id));
            active.update(db).await?;
            moved += 1;
        }
        Ok((moved, skipped))
    }

    /// Personal cards charged by transactions that now live in the family
    /// follow them, so every member can resolve `credit_source_id`.
    async fn import_referenced_credit_sources(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        family_id: Uuid,
    ) -> ResultEngine<u64> {
        let referenced: Vec<Uuid> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::CreditSourceId)
            .distinct()
            .filter(transactions::Column::UserId.eq(actor))
            .filter(transactions::Column::FamilyId.eq(family_id))
            .filter(transactions::Column::CreditSourceId.is_not_null())
            .into_tuple::<Option<Uuid>>()
            .all(db)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if referenced.is_empty() {
            return Ok(0);
        }

        let result = credit_sources::Entity::update_many()
            .col_expr(credit_sources::Column::FamilyId, Expr::value(Some(family_id)))
            .filter(scope_condition::<credit_sources::Entity>(Scope::Personal(actor)))
            .filter(credit_sources::Column::Id.is_in(referenced))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Tags whose name the actor already uses in the family stay personal.
    async fn import_tags(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        family_id: Uuid,
    ) -> ResultEngine<u64> {
        let taken: Vec<String> = tags::Entity::find()
            .filter(tags::Column::UserId.eq(actor))
            .filter(tags::Column::FamilyId.eq(family_id))
            .all(db)
            .await?
            .into_iter()
            .map(|tag| tag.name)
            .collect();

        let personal = tags::Entity::find()
            .filter(scope_condition::<tags::Entity>(Scope::Personal(actor)))
            .all(db)
            .await?;

        let mut moved = 0;
        for tag in personal {
            if taken.contains(&tag.name) {
                continue;
            }
            let mut active: tags::ActiveModel = tag.into();
            active.family_id = ActiveValue::Set(Some(family_id));
            active.update(db).await?;
            moved += 1;
        }
        Ok(moved)
    }
}
