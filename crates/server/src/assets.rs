//! Asset endpoints, including the valuation history.

use api_types::asset::{AssetList, AssetNew, AssetUpdate, ValuationNew};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Asset, AssetFilter, AssetPatch, AssetValuation, AssetValuationNew, Money, User};
use uuid::Uuid;

use crate::{ServerError, parse_nullable, parse_optional, parse_value, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<AssetNew>,
) -> Result<(StatusCode, Json<Asset>), ServerError> {
    let new = engine::AssetNew {
        family_id: payload.family_id,
        asset_type: parse_value(&payload.asset_type)?,
        name: payload.name,
        symbol_isin: payload.symbol_isin,
        quantity_milli: payload.quantity_milli,
        purchase_price: Money::new(payload.purchase_price_minor),
        current_price: payload.current_price_minor.map(Money::new),
        purchase_date: payload.purchase_date,
        maturity_date: payload.maturity_date,
        interest_rate_bps: payload.interest_rate_bps,
        risk_level: parse_optional(payload.risk_level)?,
        notes: payload.notes,
    };
    Ok((
        StatusCode::CREATED,
        Json(state.engine.create_asset(user.id, new).await?),
    ))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<AssetList>,
) -> Result<Json<Vec<Asset>>, ServerError> {
    let filter = AssetFilter {
        asset_type: parse_optional(query.asset_type)?,
        is_active: query.is_active,
    };
    Ok(Json(state.engine.list_assets(user.id, filter).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<Asset>, ServerError> {
    Ok(Json(state.engine.get_asset(user.id, asset_id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(asset_id): Path<Uuid>,
    Json(payload): Json<AssetUpdate>,
) -> Result<Json<Asset>, ServerError> {
    let patch = AssetPatch {
        name: payload.name,
        symbol_isin: payload.symbol_isin,
        quantity_milli: payload.quantity_milli,
        purchase_price: payload.purchase_price_minor.map(Money::new),
        current_price: payload
            .current_price_minor
            .map(|price| price.map(Money::new)),
        purchase_date: payload.purchase_date,
        maturity_date: payload.maturity_date,
        interest_rate_bps: payload.interest_rate_bps,
        risk_level: parse_nullable(payload.risk_level)?,
        notes: payload.notes,
        is_active: payload.is_active,
    };
    Ok(Json(
        state.engine.update_asset(user.id, asset_id, patch).await?,
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(asset_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_asset(user.id, asset_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn valuations(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<Vec<AssetValuation>>, ServerError> {
    Ok(Json(state.engine.list_valuations(user.id, asset_id).await?))
}

pub async fn add_valuation(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(asset_id): Path<Uuid>,
    Json(payload): Json<ValuationNew>,
) -> Result<(StatusCode, Json<AssetValuation>), ServerError> {
    let new = AssetValuationNew {
        valuation_date: payload.valuation_date,
        price_per_unit: Money::new(payload.price_per_unit_minor),
        source: parse_optional(payload.source)?,
    };
    Ok((
        StatusCode::CREATED,
        Json(state.engine.add_valuation(user.id, asset_id, new).await?),
    ))
}
