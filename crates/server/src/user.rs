//! Account endpoints: registration, profile and the resolved scope.

use api_types::user::{ProfileUpdate, RegisterUser, ScopeView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Currency, Scope, User};

use crate::{ServerError, parse_optional, server::ServerState};

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let currency: Option<Currency> = parse_optional(payload.default_currency)?;
    let user = state
        .engine
        .register_user(&payload.email, &payload.full_name, &payload.password, currency)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(state.engine.user(user.id).await?))
}

pub async fn update_me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, ServerError> {
    let currency: Option<Currency> = parse_optional(payload.default_currency)?;
    let user = state
        .engine
        .update_profile(user.id, payload.full_name.as_deref(), currency)
        .await?;

    Ok(Json(user))
}

pub async fn scope(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<ScopeView>, ServerError> {
    let view = match state.engine.current_scope(user.id).await? {
        Scope::Personal(user_id) => ScopeView {
            kind: "personal".to_string(),
            user_id,
            family_id: None,
        },
        Scope::Family(family_id) => ScopeView {
            kind: "family".to_string(),
            user_id: user.id,
            family_id: Some(family_id),
        },
    };

    Ok(Json(view))
}
