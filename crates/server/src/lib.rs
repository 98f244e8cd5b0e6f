use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod assets;
mod budgets;
mod categories;
mod credit_sources;
mod families;
mod goals;
mod income_streams;
mod invites;
mod merchant_categories;
mod server;
mod tags;
mod transactions;
mod user;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Expired(_) => StatusCode::GONE,
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::Database(_) | EngineError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::InvalidAmount(_)
        | EngineError::InvalidPeriod(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidValue(_)
        | EngineError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("password hashing error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses a snake_case wire value into one of the engine's enums.
pub(crate) fn parse_value<T>(value: &str) -> Result<T, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = EngineError>,
{
    T::try_from(value).map_err(ServerError::from)
}

pub(crate) fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = EngineError>,
{
    value.as_deref().map(parse_value).transpose()
}

/// Like [`parse_optional`] for clearable patch fields.
pub(crate) fn parse_nullable<T>(
    value: Option<Option<String>>,
) -> Result<Option<Option<T>>, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = EngineError>,
{
    value.map(parse_optional).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_expired_maps_to_410() {
        let res = ServerError::from(EngineError::Expired("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::GONE);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidPeriod("x".to_string()),
            EngineError::InvalidRole("x".to_string()),
            EngineError::InvalidValue("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn bad_credentials_map_to_401() {
        let res = ServerError::from(EngineError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_enum_value_is_a_validation_error() {
        let res = parse_value::<engine::PaymentMethod>("barter");
        assert!(matches!(
            res,
            Err(ServerError::Engine(EngineError::InvalidValue(_)))
        ));
    }
}
