use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreditSource, CreditSourceNew, CreditSourcePatch, EngineError, ResultEngine, credit_sources,
    transactions, util,
};

use super::{Engine, access::scope_condition, with_tx};

const MAX_CARD_NAME_LEN: usize = 100;

impl Engine {
    pub async fn create_credit_source(
        &self,
        actor: Uuid,
        new: CreditSourceNew,
    ) -> ResultEngine<CreditSource> {
        let card_name = util::normalize_required_name(&new.card_name, "card", MAX_CARD_NAME_LEN)?;
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;

            let source = CreditSource {
                id: Uuid::new_v4(),
                user_id: actor,
                family_id,
                card_name,
                card_last4: new.card_last4.trim().to_string(),
                card_network: new.card_network,
                credit_limit: new.credit_limit,
                billing_day: new.billing_day,
                due_day: new.due_day,
                is_active: true,
                created_at: Utc::now(),
            };
            source.validate()?;

            let model: credit_sources::ActiveModel = (&source).into();
            model.insert(&db_tx).await?;
            Ok(source)
        })
    }

    /// Credit sources of the actor's scope, by card name.
    pub async fn list_credit_sources(
        &self,
        actor: Uuid,
        active_only: bool,
    ) -> ResultEngine<Vec<CreditSource>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let mut query = credit_sources::Entity::find()
                .filter(scope_condition::<credit_sources::Entity>(scope))
                .order_by_asc(credit_sources::Column::CardName);
            if active_only {
                query = query.filter(credit_sources::Column::IsActive.eq(true));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(CreditSource::try_from)
                .collect()
        })
    }

    pub async fn get_credit_source(
        &self,
        actor: Uuid,
        credit_source_id: Uuid,
    ) -> ResultEngine<CreditSource> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_credit_source_read(&db_tx, actor, credit_source_id)
                .await?;
            CreditSource::try_from(model)
        })
    }

    pub async fn update_credit_source(
        &self,
        actor: Uuid,
        credit_source_id: Uuid,
        mut patch: CreditSourcePatch,
    ) -> ResultEngine<CreditSource> {
        if let Some(name) = patch.card_name.take() {
            patch.card_name = Some(util::normalize_required_name(
                &name,
                "card",
                MAX_CARD_NAME_LEN,
            )?);
        }
        patch.card_last4 = patch.card_last4.map(|last4| last4.trim().to_string());

        with_tx!(self, |db_tx| {
            let model = self
                .require_credit_source_write(&db_tx, actor, credit_source_id)
                .await?;
            let mut source = CreditSource::try_from(model)?;
            patch.apply(&mut source);
            source.validate()?;

            let model: credit_sources::ActiveModel = (&source).into();
            model.update(&db_tx).await?;
            Ok(source)
        })
    }

    /// Cards still referenced by transactions cannot be deleted; deactivate
    /// them instead.
    pub async fn delete_credit_source(
        &self,
        actor: Uuid,
        credit_source_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_credit_source_write(&db_tx, actor, credit_source_id)
                .await?;
            let in_use = transactions::Entity::find()
                .filter(transactions::Column::CreditSourceId.eq(credit_source_id))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "credit source is used by {in_use} transactions"
                )));
            }
            credit_sources::Entity::delete_by_id(credit_source_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
