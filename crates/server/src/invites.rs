use api_types::family::InviteNew;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Family, FamilyInvite, FamilyRole, InvitePreview, User};
use uuid::Uuid;

use crate::{ServerError, parse_value, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
    Json(payload): Json<InviteNew>,
) -> Result<(StatusCode, Json<FamilyInvite>), ServerError> {
    let role: FamilyRole = parse_value(&payload.role)?;
    let invite = state
        .engine
        .create_invite(user.id, family_id, &payload.email, role)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<Vec<FamilyInvite>>, ServerError> {
    Ok(Json(state.engine.list_invites(user.id, family_id).await?))
}

pub async fn cancel(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((family_id, invite_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .cancel_invite(user.id, family_id, invite_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public: lets an invitee look at the invite before signing up.
pub async fn preview(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<InvitePreview>, ServerError> {
    Ok(Json(state.engine.invite_preview(&token).await?))
}

pub async fn accept(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<Family>, ServerError> {
    Ok(Json(state.engine.accept_invite(user.id, &token).await?))
}

pub async fn pending(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<InvitePreview>>, ServerError> {
    Ok(Json(state.engine.pending_invites(user.id).await?))
}
