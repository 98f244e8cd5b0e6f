use chrono::Utc;
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Asset, AssetNew, AssetPatch, AssetType, AssetValuation, AssetValuationNew, EngineError,
    ResultEngine, asset_valuations, assets, util,
};

use super::{Engine, access::scope_condition, with_tx};

const MAX_ASSET_NAME_LEN: usize = 200;

/// Filters for [`Engine::list_assets`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetFilter {
    pub asset_type: Option<AssetType>,
    pub is_active: Option<bool>,
}

impl Engine {
    pub async fn create_asset(&self, actor: Uuid, new: AssetNew) -> ResultEngine<Asset> {
        let name = util::normalize_required_name(&new.name, "asset", MAX_ASSET_NAME_LEN)?;
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;

            let now = Utc::now();
            let asset = Asset {
                id: Uuid::new_v4(),
                user_id: actor,
                family_id,
                asset_type: new.asset_type,
                name,
                symbol_isin: util::normalize_optional_text(new.symbol_isin),
                quantity_milli: new.quantity_milli,
                purchase_price: new.purchase_price,
                current_price: new.current_price,
                purchase_date: new.purchase_date,
                maturity_date: new.maturity_date,
                interest_rate_bps: new.interest_rate_bps,
                risk_level: new.risk_level,
                notes: util::normalize_optional_text(new.notes),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            asset.validate()?;

            let model: assets::ActiveModel = (&asset).into();
            model.insert(&db_tx).await?;
            Ok(asset)
        })
    }

    pub async fn list_assets(&self, actor: Uuid, filter: AssetFilter) -> ResultEngine<Vec<Asset>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let mut query = assets::Entity::find()
                .filter(scope_condition::<assets::Entity>(scope))
                .order_by_asc(assets::Column::AssetType)
                .order_by_asc(assets::Column::Name);
            if let Some(asset_type) = filter.asset_type {
                query = query.filter(assets::Column::AssetType.eq(asset_type.as_str()));
            }
            if let Some(is_active) = filter.is_active {
                query = query.filter(assets::Column::IsActive.eq(is_active));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Asset::try_from)
                .collect()
        })
    }

    pub async fn get_asset(&self, actor: Uuid, asset_id: Uuid) -> ResultEngine<Asset> {
        with_tx!(self, |db_tx| {
            let model = self.require_asset_read(&db_tx, actor, asset_id).await?;
            Asset::try_from(model)
        })
    }

    pub async fn update_asset(
        &self,
        actor: Uuid,
        asset_id: Uuid,
        mut patch: AssetPatch,
    ) -> ResultEngine<Asset> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(util::normalize_required_name(
                &name,
                "asset",
                MAX_ASSET_NAME_LEN,
            )?);
        }
        patch.symbol_isin = patch.symbol_isin.map(util::normalize_optional_text);
        patch.notes = patch.notes.map(util::normalize_optional_text);

        with_tx!(self, |db_tx| {
            let model = self.require_asset_write(&db_tx, actor, asset_id).await?;
            let mut asset = Asset::try_from(model)?;
            patch.apply(&mut asset);
            asset.updated_at = Utc::now();
            asset.validate()?;

            let model: assets::ActiveModel = (&asset).into();
            model.update(&db_tx).await?;
            Ok(asset)
        })
    }

    /// Deletes the asset together with its valuation history.
    pub async fn delete_asset(&self, actor: Uuid, asset_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_asset_write(&db_tx, actor, asset_id).await?;
            assets::Entity::delete_by_id(asset_id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Records a price point. The newest valuation also becomes the asset's
    /// current price.
    pub async fn add_valuation(
        &self,
        actor: Uuid,
        asset_id: Uuid,
        new: AssetValuationNew,
    ) -> ResultEngine<AssetValuation> {
        if new.price_per_unit.is_negative() {
            return Err(EngineError::InvalidAmount(
                "price_per_unit must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = self.require_asset_write(&db_tx, actor, asset_id).await?;
            let asset = Asset::try_from(model)?;

            let same_day = asset_valuations::Entity::find()
                .filter(asset_valuations::Column::AssetId.eq(asset_id))
                .filter(asset_valuations::Column::ValuationDate.eq(new.valuation_date))
                .count(&db_tx)
                .await?;
            if same_day > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "valuation for {}",
                    new.valuation_date
                )));
            }
            let newer = asset_valuations::Entity::find()
                .filter(asset_valuations::Column::AssetId.eq(asset_id))
                .filter(asset_valuations::Column::ValuationDate.gt(new.valuation_date))
                .count(&db_tx)
                .await?;

            let now = Utc::now();
            let valuation = asset_valuations::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                asset_id: ActiveValue::Set(asset_id),
                valuation_date: ActiveValue::Set(new.valuation_date),
                price_per_unit_minor: ActiveValue::Set(new.price_per_unit.minor()),
                total_value_minor: ActiveValue::Set(asset.value_at(new.price_per_unit).minor()),
                source: ActiveValue::Set(new.source.unwrap_or_default().as_str().to_string()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            if newer == 0 {
                assets::ActiveModel {
                    id: ActiveValue::Unchanged(asset_id),
                    current_price_minor: ActiveValue::Set(Some(new.price_per_unit.minor())),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }
            AssetValuation::try_from(valuation)
        })
    }

    /// Valuation history of an asset, newest first.
    pub async fn list_valuations(
        &self,
        actor: Uuid,
        asset_id: Uuid,
    ) -> ResultEngine<Vec<AssetValuation>> {
        with_tx!(self, |db_tx| {
            self.require_asset_read(&db_tx, actor, asset_id).await?;
            asset_valuations::Entity::find()
                .filter(asset_valuations::Column::AssetId.eq(asset_id))
                .order_by_desc(asset_valuations::Column::ValuationDate)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(AssetValuation::try_from)
                .collect()
        })
    }
}
