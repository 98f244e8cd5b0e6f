//! Family endpoints: lifecycle, active family, members and data import.

use api_types::family::{FamilyNew, FamilyRename, ImportRequest, MemberRoleUpdate};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    Family, FamilyCreated, FamilyDetail, FamilyMember, FamilyRole, FamilySummary, ImportOptions,
    ImportReport, User,
};
use uuid::Uuid;

use crate::{ServerError, parse_value, server::ServerState};

fn import_options(request: ImportRequest) -> ImportOptions {
    ImportOptions {
        transactions: request.transactions,
        budgets: request.budgets,
        credit_sources: request.credit_sources,
        assets: request.assets,
        income_streams: request.income_streams,
        goals: request.goals,
        tags: request.tags,
        from_date: request.from_date,
        to_date: request.to_date,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<FamilySummary>>, ServerError> {
    Ok(Json(state.engine.list_families(user.id).await?))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<FamilyNew>,
) -> Result<(StatusCode, Json<FamilyCreated>), ServerError> {
    let created = state
        .engine
        .create_family(user.id, &payload.name, payload.import.map(import_options))
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn detail(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<FamilyDetail>, ServerError> {
    Ok(Json(state.engine.family_detail(user.id, family_id).await?))
}

pub async fn rename(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
    Json(payload): Json<FamilyRename>,
) -> Result<Json<Family>, ServerError> {
    let family = state
        .engine
        .rename_family(user.id, family_id, &payload.name)
        .await?;
    Ok(Json(family))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_family(user.id, family_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<Family>, ServerError> {
    Ok(Json(state.engine.set_active_family(user.id, family_id).await?))
}

pub async fn active(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Option<Family>>, ServerError> {
    Ok(Json(state.engine.active_family(user.id).await?))
}

/// Switches the caller back to personal scope.
pub async fn clear_active(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.clear_active_family(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.leave_family(user.id, family_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn import(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportReport>, ServerError> {
    let report = state
        .engine
        .migrate_ownership(user.id, family_id, import_options(payload))
        .await?;
    Ok(Json(report))
}

pub async fn members(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<Vec<FamilyMember>>, ServerError> {
    Ok(Json(state.engine.list_members(user.id, family_id).await?))
}

pub async fn update_member(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((family_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MemberRoleUpdate>,
) -> Result<Json<FamilyMember>, ServerError> {
    let role: FamilyRole = parse_value(&payload.role)?;
    let member = state
        .engine
        .update_member_role(user.id, family_id, member_id, role)
        .await?;
    Ok(Json(member))
}

pub async fn remove_member(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((family_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(user.id, family_id, member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
