//! Visibility and role checks shared by every operation.
//!
//! Reads: a personal record is visible to its creator only; a family record
//! to every member of that family. Writes additionally need the creator or a
//! family admin, and never a viewer. Invisible records are reported as
//! missing.

use sea_orm::{Condition, DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, FamilyRole, ResultEngine, Scope, assets, budgets, credit_sources, families,
    family_members, goals, income_streams, resolve_scope, tags, transactions, users,
};

use super::Engine;

/// Entities carrying `user_id` and `family_id` columns.
pub(super) trait ScopedEntity: EntityTrait {
    fn user_column() -> Self::Column;
    fn family_column() -> Self::Column;
}

macro_rules! impl_scoped_entity {
    ($($module:ident),* $(,)?) => {
        $(
            impl ScopedEntity for $module::Entity {
                fn user_column() -> Self::Column {
                    $module::Column::UserId
                }

                fn family_column() -> Self::Column {
                    $module::Column::FamilyId
                }
            }
        )*
    };
}

impl_scoped_entity!(
    transactions,
    budgets,
    credit_sources,
    assets,
    income_streams,
    goals,
    tags,
);

/// Rows listed for `scope`: the user's personal rows, or every row of the
/// family.
pub(super) fn scope_condition<E: ScopedEntity>(scope: Scope) -> Condition {
    match scope {
        Scope::Personal(user_id) => Condition::all()
            .add(E::user_column().eq(user_id))
            .add(E::family_column().is_null()),
        Scope::Family(family_id) => Condition::all().add(E::family_column().eq(family_id)),
    }
}

/// Generates `require_<entity>_read` and `require_<entity>_write` for an
/// owned entity.
macro_rules! impl_owned_access {
    ($read_fn:ident, $write_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $read_fn(
            &self,
            db: &DatabaseTransaction,
            actor: Uuid,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            let model = $module::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("{} not exists", $label)))?;
            if !self
                .can_read(db, actor, model.user_id, model.family_id)
                .await?
            {
                return Err(EngineError::KeyNotFound(format!("{} not exists", $label)));
            }
            Ok(model)
        }

        pub(super) async fn $write_fn(
            &self,
            db: &DatabaseTransaction,
            actor: Uuid,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            let model = self.$read_fn(db, actor, id).await?;
            self.ensure_can_mutate(db, actor, model.user_id, model.family_id, $label)
                .await?;
            Ok(model)
        }
    };
}

impl Engine {
    impl_owned_access!(
        require_transaction_read,
        require_transaction_write,
        transactions,
        "transaction"
    );

    impl_owned_access!(
        require_budget_read,
        require_budget_write,
        budgets,
        "budget"
    );

    impl_owned_access!(
        require_credit_source_read,
        require_credit_source_write,
        credit_sources,
        "credit_source"
    );

    impl_owned_access!(require_asset_read, require_asset_write, assets, "asset");

    impl_owned_access!(
        require_income_stream_read,
        require_income_stream_write,
        income_streams,
        "income_stream"
    );

    impl_owned_access!(require_goal_read, require_goal_write, goals, "goal");

    impl_owned_access!(require_tag_read, require_tag_write, tags, "tag");

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn family_membership(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Option<family_members::Model>> {
        family_members::Entity::find()
            .filter(family_members::Column::FamilyId.eq(family_id))
            .filter(family_members::Column::UserId.eq(user_id))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn family_role(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Option<FamilyRole>> {
        self.family_membership(db, family_id, user_id)
            .await?
            .as_ref()
            .map(family_members::Model::family_role)
            .transpose()
    }

    /// Loads the actor and resolves its scope. An active family the actor no
    /// longer belongs to falls back to the personal scope.
    pub(super) async fn actor_scope(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
    ) -> ResultEngine<(users::Model, Scope)> {
        let model = self.require_user(db, actor).await?;
        let user = crate::User::try_from(model.clone())?;
        let scope = resolve_scope(&user);
        if let Scope::Family(family_id) = scope
            && self.family_role(db, family_id, actor).await?.is_none()
        {
            return Ok((model, Scope::Personal(actor)));
        }
        Ok((model, scope))
    }

    /// The family must exist and the user must belong to it.
    pub(super) async fn require_family_member(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<(families::Model, FamilyRole)> {
        let family = families::Entity::find_by_id(family_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("family not exists".to_string()))?;
        let role = self
            .family_role(db, family_id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("family not exists".to_string()))?;
        Ok((family, role))
    }

    pub(super) async fn require_family_admin(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<families::Model> {
        let (family, role) = self.require_family_member(db, family_id, user_id).await?;
        if !role.is_admin() {
            return Err(EngineError::Forbidden(
                "only family admins can do this".to_string(),
            ));
        }
        Ok(family)
    }

    /// Family stamped on a new record: the explicit one, else the scope's.
    /// Creating inside a family needs a writing role.
    pub(super) async fn creation_family(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        scope: Scope,
        explicit: Option<Uuid>,
    ) -> ResultEngine<Option<Uuid>> {
        let family_id = explicit.or(scope.family_id());
        if let Some(family_id) = family_id {
            let (_, role) = self.require_family_member(db, family_id, actor).await?;
            if !role.can_write() {
                return Err(EngineError::Forbidden(
                    "viewers cannot create family records".to_string(),
                ));
            }
        }
        Ok(family_id)
    }

    pub(super) async fn can_read(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        owner: Uuid,
        family_id: Option<Uuid>,
    ) -> ResultEngine<bool> {
        match family_id {
            None => Ok(owner == actor),
            Some(family_id) => Ok(self.family_role(db, family_id, actor).await?.is_some()),
        }
    }

    pub(super) async fn ensure_can_mutate(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        owner: Uuid,
        family_id: Option<Uuid>,
        label: &str,
    ) -> ResultEngine<()> {
        let Some(family_id) = family_id else {
            return Ok(());
        };
        let role = self
            .family_role(db, family_id, actor)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("{label} not exists")))?;
        if !role.can_write() {
            return Err(EngineError::Forbidden(format!(
                "viewers cannot modify this {label}"
            )));
        }
        if owner != actor && !role.is_admin() {
            return Err(EngineError::Forbidden(format!(
                "only the creator or a family admin can modify this {label}"
            )));
        }
        Ok(())
    }
}
