//! Categories API endpoints.

use api_types::category::{CategoryList, CategoryNew, CategoryUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Category, CategoryPatch, User};
use uuid::Uuid;

use crate::{ServerError, parse_nullable, parse_optional, parse_value, server::ServerState};

/// System categories plus the custom ones of the caller's active family.
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryList>,
) -> Result<Json<Vec<Category>>, ServerError> {
    let category_type = parse_optional(query.category_type)?;
    Ok(Json(
        state.engine.list_categories(user.id, category_type).await?,
    ))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<Category>), ServerError> {
    let new = engine::CategoryNew {
        name: payload.name,
        parent_category_id: payload.parent_category_id,
        category_type: parse_value(&payload.category_type)?,
        budget_classification: parse_optional(payload.budget_classification)?,
        icon: payload.icon,
        color: payload.color,
        display_order: payload.display_order,
    };
    let category = state.engine.create_category(user.id, new).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<Category>, ServerError> {
    let patch = CategoryPatch {
        name: payload.name,
        budget_classification: parse_nullable(payload.budget_classification)?,
        icon: payload.icon,
        color: payload.color,
        display_order: payload.display_order,
    };
    Ok(Json(
        state
            .engine
            .update_category(user.id, category_id, patch)
            .await?,
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(user.id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
