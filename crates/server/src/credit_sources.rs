use api_types::credit_source::{CreditSourceList, CreditSourceNew, CreditSourceUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreditSource, CreditSourcePatch, Money, User};
use uuid::Uuid;

use crate::{ServerError, parse_optional, parse_value, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<CreditSourceNew>,
) -> Result<(StatusCode, Json<CreditSource>), ServerError> {
    let new = engine::CreditSourceNew {
        family_id: payload.family_id,
        card_name: payload.card_name,
        card_last4: payload.card_last4,
        card_network: parse_value(&payload.card_network)?,
        credit_limit: Money::new(payload.credit_limit_minor),
        billing_day: payload.billing_day,
        due_day: payload.due_day,
    };
    let source = state.engine.create_credit_source(user.id, new).await?;

    Ok((StatusCode::CREATED, Json(source)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<CreditSourceList>,
) -> Result<Json<Vec<CreditSource>>, ServerError> {
    Ok(Json(
        state
            .engine
            .list_credit_sources(user.id, query.active_only)
            .await?,
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(credit_source_id): Path<Uuid>,
) -> Result<Json<CreditSource>, ServerError> {
    Ok(Json(
        state
            .engine
            .get_credit_source(user.id, credit_source_id)
            .await?,
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(credit_source_id): Path<Uuid>,
    Json(payload): Json<CreditSourceUpdate>,
) -> Result<Json<CreditSource>, ServerError> {
    let patch = CreditSourcePatch {
        card_name: payload.card_name,
        card_last4: payload.card_last4,
        card_network: parse_optional(payload.card_network)?,
        credit_limit: payload.credit_limit_minor.map(Money::new),
        billing_day: payload.billing_day,
        due_day: payload.due_day,
        is_active: payload.is_active,
    };
    Ok(Json(
        state
            .engine
            .update_credit_source(user.id, credit_source_id, patch)
            .await?,
    ))
}

/// Fails with 409 while transactions still reference the card.
pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(credit_source_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_credit_source(user.id, credit_source_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
