//! Transactions API endpoints

use api_types::transaction::{SummaryQuery, TransactionList, TransactionNew, TransactionUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    DEFAULT_TRANSACTION_PAGE_SIZE, Money, Page, PageRequest, Transaction, TransactionFilter,
    TransactionPatch, TransactionSummary, User,
};
use uuid::Uuid;

use crate::{ServerError, parse_optional, parse_value, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let new = engine::TransactionNew {
        family_id: payload.family_id,
        amount: Money::new(payload.amount_minor),
        currency: parse_optional(payload.currency)?,
        transaction_type: parse_value(&payload.transaction_type)?,
        payment_method: parse_value(&payload.payment_method)?,
        category_id: payload.category_id,
        subcategory_id: payload.subcategory_id,
        payee: payload.payee,
        merchant_type: payload.merchant_type,
        mcc_code: payload.mcc_code,
        t_date: payload.t_date,
        notes: payload.notes,
        credit_source_id: payload.credit_source_id,
        is_paid: payload.is_paid,
        payment_due_date: payload.payment_due_date,
        tag_ids: payload.tag_ids,
    };
    let created = state.engine.create_transaction(user.id, new).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<Page<Transaction>>, ServerError> {
    let page = PageRequest::new(query.page, query.page_size, DEFAULT_TRANSACTION_PAGE_SIZE)?;
    let filter = TransactionFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        transaction_type: parse_optional(query.transaction_type)?,
        category_id: query.category_id,
        payment_method: parse_optional(query.payment_method)?,
        search: query.search,
    };

    Ok(Json(
        state
            .engine
            .list_transactions(user.id, &filter, page)
            .await?,
    ))
}

/// Income, expenses and net savings over an optional date window.
pub async fn summary(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<TransactionSummary>, ServerError> {
    Ok(Json(
        state
            .engine
            .transaction_summary(user.id, query.start_date, query.end_date)
            .await?,
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<Transaction>, ServerError> {
    Ok(Json(
        state.engine.get_transaction(user.id, transaction_id).await?,
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<Transaction>, ServerError> {
    let patch = TransactionPatch {
        amount: payload.amount_minor.map(Money::new),
        currency: parse_optional(payload.currency)?,
        transaction_type: parse_optional(payload.transaction_type)?,
        payment_method: parse_optional(payload.payment_method)?,
        category_id: payload.category_id,
        subcategory_id: payload.subcategory_id,
        payee: payload.payee,
        merchant_type: payload.merchant_type,
        mcc_code: payload.mcc_code,
        t_date: payload.t_date,
        notes: payload.notes,
        credit_source_id: payload.credit_source_id,
        is_paid: payload.is_paid,
        payment_due_date: payload.payment_due_date,
        tag_ids: payload.tag_ids,
    };

    Ok(Json(
        state
            .engine
            .update_transaction(user.id, transaction_id, patch)
            .await?,
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(user.id, transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
