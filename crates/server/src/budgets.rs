//! Budget endpoints. Every response carries the computed spend stats.

use api_types::budget::{ActiveBudgetQuery, AllocationInput, BudgetList, BudgetNew, BudgetUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    BudgetAllocation, BudgetFilter, BudgetPatch, BudgetWithStats, DEFAULT_PAGE_SIZE, Money, Page,
    PageRequest, User,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn allocations(inputs: Vec<AllocationInput>) -> Vec<BudgetAllocation> {
    inputs
        .into_iter()
        .map(|input| BudgetAllocation {
            category_id: input.category_id,
            allocated: Money::new(input.allocated_minor),
        })
        .collect()
}

fn money(minor: Option<i64>) -> Option<Money> {
    minor.map(Money::new)
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetWithStats>), ServerError> {
    let new = engine::BudgetNew {
        name: payload.name,
        family_id: payload.family_id,
        period_start: payload.period_start,
        period_end: payload.period_end,
        total_budget: money(payload.total_budget_minor),
        needs_budget: money(payload.needs_budget_minor),
        wants_budget: money(payload.wants_budget_minor),
        savings_budget: money(payload.savings_budget_minor),
        alert_threshold_percent: payload.alert_threshold_percent,
        is_active: payload.is_active,
        allocations: allocations(payload.category_allocations),
    };
    let created = state.engine.create_budget(user.id, new).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetList>,
) -> Result<Json<Page<BudgetWithStats>>, ServerError> {
    let page = PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE)?;
    let filter = BudgetFilter {
        is_active: query.is_active,
    };
    Ok(Json(state.engine.list_budgets(user.id, filter, page).await?))
}

/// The active budget covering `date` (today by default), or `null`.
pub async fn active(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<ActiveBudgetQuery>,
) -> Result<Json<Option<BudgetWithStats>>, ServerError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.engine.active_budget(user.id, date).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<BudgetWithStats>, ServerError> {
    Ok(Json(state.engine.get_budget(user.id, budget_id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetWithStats>, ServerError> {
    let patch = BudgetPatch {
        name: payload.name,
        period_start: payload.period_start,
        period_end: payload.period_end,
        total_budget: payload.total_budget_minor.map(money),
        needs_budget: payload.needs_budget_minor.map(money),
        wants_budget: payload.wants_budget_minor.map(money),
        savings_budget: payload.savings_budget_minor.map(money),
        alert_threshold_percent: payload.alert_threshold_percent,
        is_active: payload.is_active,
        allocations: payload.category_allocations.map(allocations),
    };
    Ok(Json(
        state.engine.update_budget(user.id, budget_id, patch).await?,
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(user.id, budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
