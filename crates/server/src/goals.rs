use api_types::goal::{GoalList, GoalNew, GoalUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{FinancialGoal, FinancialGoalNew, FinancialGoalPatch, GoalFilter, Money, User};
use uuid::Uuid;

use crate::{ServerError, parse_optional, parse_value, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<FinancialGoal>), ServerError> {
    let new = FinancialGoalNew {
        family_id: payload.family_id,
        goal_name: payload.goal_name,
        goal_type: parse_value(&payload.goal_type)?,
        target_amount: Money::new(payload.target_amount_minor),
        current_amount: payload.current_amount_minor.map(Money::new),
        target_date: payload.target_date,
        priority: parse_optional(payload.priority)?,
        notes: payload.notes,
    };
    Ok((
        StatusCode::CREATED,
        Json(state.engine.create_goal(user.id, new).await?),
    ))
}

/// Goals by target date, undated ones last.
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<GoalList>,
) -> Result<Json<Vec<FinancialGoal>>, ServerError> {
    let filter = GoalFilter {
        status: parse_optional(query.status)?,
    };
    Ok(Json(state.engine.list_goals(user.id, filter).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<FinancialGoal>, ServerError> {
    Ok(Json(state.engine.get_goal(user.id, goal_id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<FinancialGoal>, ServerError> {
    let patch = FinancialGoalPatch {
        goal_name: payload.goal_name,
        goal_type: parse_optional(payload.goal_type)?,
        target_amount: payload.target_amount_minor.map(Money::new),
        current_amount: payload.current_amount_minor.map(Money::new),
        target_date: payload.target_date,
        priority: parse_optional(payload.priority)?,
        status: parse_optional(payload.status)?,
        notes: payload.notes,
    };
    Ok(Json(state.engine.update_goal(user.id, goal_id, patch).await?))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_goal(user.id, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
