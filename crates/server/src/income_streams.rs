use api_types::income::{IncomeStreamList, IncomeStreamNew, IncomeStreamUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{IncomeStream, IncomeStreamFilter, IncomeStreamPatch, Money, User};
use uuid::Uuid;

use crate::{ServerError, parse_optional, parse_value, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<IncomeStreamNew>,
) -> Result<(StatusCode, Json<IncomeStream>), ServerError> {
    let new = engine::IncomeStreamNew {
        family_id: payload.family_id,
        source: payload.source,
        category_id: payload.category_id,
        amount: Money::new(payload.amount_minor),
        currency: parse_optional(payload.currency)?,
        frequency: parse_value(&payload.frequency)?,
        start_date: payload.start_date,
        end_date: payload.end_date,
        is_taxable: payload.is_taxable,
        tax_rate_bps: payload.tax_rate_bps,
        notes: payload.notes,
    };
    Ok((
        StatusCode::CREATED,
        Json(state.engine.create_income_stream(user.id, new).await?),
    ))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<IncomeStreamList>,
) -> Result<Json<Vec<IncomeStream>>, ServerError> {
    let filter = IncomeStreamFilter {
        is_active: query.is_active,
        frequency: parse_optional(query.frequency)?,
    };
    Ok(Json(state.engine.list_income_streams(user.id, filter).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(stream_id): Path<Uuid>,
) -> Result<Json<IncomeStream>, ServerError> {
    Ok(Json(state.engine.get_income_stream(user.id, stream_id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(stream_id): Path<Uuid>,
    Json(payload): Json<IncomeStreamUpdate>,
) -> Result<Json<IncomeStream>, ServerError> {
    let patch = IncomeStreamPatch {
        source: payload.source,
        category_id: payload.category_id,
        amount: payload.amount_minor.map(Money::new),
        currency: parse_optional(payload.currency)?,
        frequency: parse_optional(payload.frequency)?,
        start_date: payload.start_date,
        end_date: payload.end_date,
        is_taxable: payload.is_taxable,
        tax_rate_bps: payload.tax_rate_bps,
        is_active: payload.is_active,
        notes: payload.notes,
    };
    Ok(Json(
        state
            .engine
            .update_income_stream(user.id, stream_id, patch)
            .await?,
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(stream_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_income_stream(user.id, stream_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
