use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use serde_json::{Value, json};

use std::sync::Arc;

use crate::{
    assets, budgets, categories, credit_sources, families, goals, income_streams, invites,
    merchant_categories, tags, transactions, user,
};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves the caller from HTTP basic credentials (email, password) and
/// stores the [`engine::User`] in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = match state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
    {
        Ok(user) => user,
        Err(EngineError::InvalidCredentials) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            tracing::error!("authentication failed: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(user::register))
        .route("/invites/{token}", get(invites::preview));

    let authenticated = Router::new()
        .route("/me", get(user::me).patch(user::update_me))
        .route("/scope", get(user::scope))
        .route(
            "/me/active-family",
            get(families::active).delete(families::clear_active),
        )
        .route("/me/invites", get(invites::pending))
        .route("/families", get(families::list).post(families::create))
        .route(
            "/families/{id}",
            get(families::detail)
                .patch(families::rename)
                .delete(families::delete),
        )
        .route("/families/{id}/activate", post(families::activate))
        .route("/families/{id}/leave", post(families::leave))
        .route("/families/{id}/import", post(families::import))
        .route("/families/{id}/members", get(families::members))
        .route(
            "/families/{id}/members/{member_id}",
            patch(families::update_member).delete(families::remove_member),
        )
        .route(
            "/families/{id}/invites",
            get(invites::list).post(invites::create),
        )
        .route(
            "/families/{id}/invites/{invite_id}",
            delete(invites::cancel),
        )
        .route("/invites/{token}/accept", post(invites::accept))
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/active", get(budgets::active))
        .route(
            "/budgets/{id}",
            get(budgets::get).patch(budgets::update).delete(budgets::delete),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/stats/summary", get(transactions::summary))
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            patch(categories::update).delete(categories::delete),
        )
        .route("/merchant-categories", get(merchant_categories::list))
        .route(
            "/merchant-categories/{mcc_code}",
            get(merchant_categories::get),
        )
        .route("/tags", get(tags::list).post(tags::create))
        .route(
            "/tags/{id}",
            get(tags::get).patch(tags::update).delete(tags::delete),
        )
        .route(
            "/credit-sources",
            get(credit_sources::list).post(credit_sources::create),
        )
        .route(
            "/credit-sources/{id}",
            get(credit_sources::get)
                .patch(credit_sources::update)
                .delete(credit_sources::delete),
        )
        .route("/assets", get(assets::list).post(assets::create))
        .route(
            "/assets/{id}",
            get(assets::get).patch(assets::update).delete(assets::delete),
        )
        .route(
            "/assets/{id}/valuations",
            get(assets::valuations).post(assets::add_valuation),
        )
        .route(
            "/income-streams",
            get(income_streams::list).post(income_streams::create),
        )
        .route(
            "/income-streams/{id}",
            get(income_streams::get)
                .patch(income_streams::update)
                .delete(income_streams::delete),
        )
        .route("/goals", get(goals::list).post(goals::create))
        .route(
            "/goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    public.merge(authenticated).with_state(state)
}

pub async fn run(engine: Engine, address: &str) {
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {address}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
