use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, Scope, User, users, util};

use super::{Engine, with_tx};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_FULL_NAME_LEN: usize = 100;

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

impl Engine {
    /// Creates an account with a password login.
    pub async fn register_user(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
        default_currency: Option<Currency>,
    ) -> ResultEngine<User> {
        let email = util::normalize_email(email)?;
        let full_name = util::normalize_required_name(full_name, "full", MAX_FULL_NAME_LEN)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EngineError::InvalidValue(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let password_hash = hash_password(password)?;

        let model = with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let now = Utc::now();
            let active = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                email: ActiveValue::Set(email.clone()),
                full_name: ActiveValue::Set(full_name),
                password_hash: ActiveValue::Set(password_hash),
                default_currency: ActiveValue::Set(
                    default_currency.unwrap_or_default().code().to_string(),
                ),
                active_family_id: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            Ok(active.insert(&db_tx).await?)
        })?;

        tracing::info!("registered user {}", model.id);
        User::try_from(model)
    }

    /// Checks an email/password pair. Unknown emails and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = email.trim().to_lowercase();
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or(EngineError::InvalidCredentials)?;
        if !verify_password(password, &model.password_hash) {
            return Err(EngineError::InvalidCredentials);
        }
        User::try_from(model)
    }

    pub async fn user(&self, actor: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, actor).await?;
            User::try_from(model)
        })
    }

    pub async fn update_profile(
        &self,
        actor: Uuid,
        full_name: Option<&str>,
        default_currency: Option<Currency>,
    ) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, actor).await?;
            let mut active: users::ActiveModel = model.into();
            if let Some(name) = full_name {
                let name = util::normalize_required_name(name, "full", MAX_FULL_NAME_LEN)?;
                active.full_name = ActiveValue::Set(name);
            }
            if let Some(currency) = default_currency {
                active.default_currency = ActiveValue::Set(currency.code().to_string());
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    /// The scope the actor's requests currently run in.
    pub async fn current_scope(&self, actor: Uuid) -> ResultEngine<Scope> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            Ok(scope)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_same_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not a hash"));
    }
}
