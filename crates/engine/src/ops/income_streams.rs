use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, IncomeFrequency, IncomeStream, IncomeStreamNew, IncomeStreamPatch, ResultEngine,
    income_streams, util,
};

use super::{Engine, access::scope_condition, with_tx};

const MAX_SOURCE_LEN: usize = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IncomeStreamFilter {
    pub is_active: Option<bool>,
    pub frequency: Option<IncomeFrequency>,
}

impl Engine {
    pub async fn create_income_stream(
        &self,
        actor: Uuid,
        new: IncomeStreamNew,
    ) -> ResultEngine<IncomeStream> {
        let source = util::normalize_required_name(&new.source, "income source", MAX_SOURCE_LEN)?;
        with_tx!(self, |db_tx| {
            let (user, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;
            if let Some(category_id) = new.category_id {
                self.require_usable_category(&db_tx, category_id, family_id)
                    .await?;
            }

            let currency = match new.currency {
                Some(currency) => currency,
                None => Currency::try_from(user.default_currency.as_str())?,
            };
            let now = Utc::now();
            let stream = IncomeStream {
                id: Uuid::new_v4(),
                user_id: actor,
                family_id,
                source,
                category_id: new.category_id,
                amount: new.amount,
                currency,
                frequency: new.frequency,
                start_date: new.start_date,
                end_date: new.end_date,
                is_taxable: new.is_taxable.unwrap_or(true),
                tax_rate_bps: new.tax_rate_bps,
                is_active: true,
                notes: util::normalize_optional_text(new.notes),
                created_at: now,
                updated_at: now,
            };
            stream.validate()?;

            let model: income_streams::ActiveModel = (&stream).into();
            model.insert(&db_tx).await?;
            Ok(stream)
        })
    }

    pub async fn list_income_streams(
        &self,
        actor: Uuid,
        filter: IncomeStreamFilter,
    ) -> ResultEngine<Vec<IncomeStream>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let mut query = income_streams::Entity::find()
                .filter(scope_condition::<income_streams::Entity>(scope))
                .order_by_desc(income_streams::Column::StartDate);
            if let Some(is_active) = filter.is_active {
                query = query.filter(income_streams::Column::IsActive.eq(is_active));
            }
            if let Some(frequency) = filter.frequency {
                query = query.filter(income_streams::Column::Frequency.eq(frequency.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(IncomeStream::try_from)
                .collect()
        })
    }

    pub async fn get_income_stream(
        &self,
        actor: Uuid,
        stream_id: Uuid,
    ) -> ResultEngine<IncomeStream> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_income_stream_read(&db_tx, actor, stream_id)
                .await?;
            IncomeStream::try_from(model)
        })
    }

    pub async fn update_income_stream(
        &self,
        actor: Uuid,
        stream_id: Uuid,
        mut patch: IncomeStreamPatch,
    ) -> ResultEngine<IncomeStream> {
        if let Some(source) = patch.source.take() {
            patch.source = Some(util::normalize_required_name(
                &source,
                "income source",
                MAX_SOURCE_LEN,
            )?);
        }
        patch.notes = patch.notes.map(util::normalize_optional_text);

        with_tx!(self, |db_tx| {
            let model = self
                .require_income_stream_write(&db_tx, actor, stream_id)
                .await?;
            let mut stream = IncomeStream::try_from(model)?;
            patch.apply(&mut stream);
            stream.updated_at = Utc::now();
            stream.validate()?;
            if let Some(category_id) = stream.category_id {
                self.require_usable_category(&db_tx, category_id, stream.family_id)
                    .await?;
            }

            let model: income_streams::ActiveModel = (&stream).into();
            model.update(&db_tx).await?;
            Ok(stream)
        })
    }

    pub async fn delete_income_stream(&self, actor: Uuid, stream_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_income_stream_write(&db_tx, actor, stream_id)
                .await?;
            income_streams::Entity::delete_by_id(stream_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
