use api_types::tag::{TagNew, TagUpdate};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Tag, TagPatch, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<TagNew>,
) -> Result<(StatusCode, Json<Tag>), ServerError> {
    let new = engine::TagNew {
        name: payload.name,
        family_id: payload.family_id,
        color: payload.color,
    };
    Ok((StatusCode::CREATED, Json(state.engine.create_tag(user.id, new).await?)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Tag>>, ServerError> {
    Ok(Json(state.engine.list_tags(user.id).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(tag_id): Path<Uuid>,
) -> Result<Json<Tag>, ServerError> {
    Ok(Json(state.engine.get_tag(user.id, tag_id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(tag_id): Path<Uuid>,
    Json(payload): Json<TagUpdate>,
) -> Result<Json<Tag>, ServerError> {
    let patch = TagPatch {
        name: payload.name,
        color: payload.color,
    };
    Ok(Json(state.engine.update_tag(user.id, tag_id, patch).await?))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(tag_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_tag(user.id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
