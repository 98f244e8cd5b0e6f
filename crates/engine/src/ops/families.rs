use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, Family, FamilyDetail, FamilyInvite, FamilyMember, FamilyRole, FamilySummary,
    ImportOptions, ImportReport, ResultEngine, Scope, families, family_invites, family_members,
    users, util,
};

use super::{Engine, with_tx};

const MAX_FAMILY_NAME_LEN: usize = 100;

/// Result of [`Engine::create_family`]: the family and, when requested, the
/// report of the personal data moved into it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FamilyCreated {
    pub family: Family,
    pub import: Option<ImportReport>,
}

impl Engine {
    /// Creates a family with `actor` as its admin and makes it the actor's
    /// active family.
    pub async fn create_family(
        &self,
        actor: Uuid,
        name: &str,
        import: Option<ImportOptions>,
    ) -> ResultEngine<FamilyCreated> {
        let name = util::normalize_required_name(name, "family", MAX_FAMILY_NAME_LEN)?;

        let created = with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, actor).await?;
            let now = Utc::now();

            let family = families::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                name: ActiveValue::Set(name),
                created_by: ActiveValue::Set(actor),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            family_members::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                family_id: ActiveValue::Set(family.id),
                user_id: ActiveValue::Set(actor),
                role: ActiveValue::Set(FamilyRole::Admin.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let mut active_user: users::ActiveModel = user.into();
            active_user.active_family_id = ActiveValue::Set(Some(family.id));
            active_user.updated_at = ActiveValue::Set(now);
            active_user.update(&db_tx).await?;

            let import = match import {
                Some(options) => Some(
                    self.import_personal_records(&db_tx, actor, family.id, options)
                        .await?,
                ),
                None => None,
            };

            Ok(FamilyCreated {
                family: Family::from(family),
                import,
            })
        })?;

        tracing::info!("family {} created by {actor}", created.family.id);
        Ok(created)
    }

    /// Families the actor belongs to, by name.
    pub async fn list_families(&self, actor: Uuid) -> ResultEngine<Vec<FamilySummary>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, actor).await?;
            let rows = family_members::Entity::find()
                .filter(family_members::Column::UserId.eq(actor))
                .find_also_related(families::Entity)
                .order_by_asc(families::Column::Name)
                .all(&db_tx)
                .await?;

            let mut summaries = Vec::with_capacity(rows.len());
            for (membership, family) in rows {
                let Some(family) = family else {
                    continue;
                };
                let member_count = family_members::Entity::find()
                    .filter(family_members::Column::FamilyId.eq(family.id))
                    .count(&db_tx)
                    .await?;
                summaries.push(FamilySummary {
                    is_active: user.active_family_id == Some(family.id),
                    role: membership.family_role()?,
                    member_count,
                    family: Family::from(family),
                });
            }
            Ok(summaries)
        })
    }

    /// Family with its members. Admins also get the pending invites.
    pub async fn family_detail(&self, actor: Uuid, family_id: Uuid) -> ResultEngine<FamilyDetail> {
        with_tx!(self, |db_tx| {
            let (family, role) = self.require_family_member(&db_tx, family_id, actor).await?;
            let members = self.members_of(&db_tx, family_id).await?;
            let pending_invites = if role.is_admin() {
                self.pending_family_invites(&db_tx, family_id).await?
            } else {
                Vec::new()
            };
            Ok(FamilyDetail {
                family: Family::from(family),
                role,
                members,
                pending_invites,
            })
        })
    }

    pub async fn rename_family(
        &self,
        actor: Uuid,
        family_id: Uuid,
        name: &str,
    ) -> ResultEngine<Family> {
        let name = util::normalize_required_name(name, "family", MAX_FAMILY_NAME_LEN)?;
        with_tx!(self, |db_tx| {
            let family = self.require_family_admin(&db_tx, family_id, actor).await?;
            let mut active: families::ActiveModel = family.into();
            active.name = ActiveValue::Set(name);
            let family = active.update(&db_tx).await?;
            Ok(Family::from(family))
        })
    }

    /// Deletes the family and every family-owned record. Creator only.
    pub async fn delete_family(&self, actor: Uuid, family_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (family, _) = self.require_family_member(&db_tx, family_id, actor).await?;
            if family.created_by != actor {
                return Err(EngineError::Forbidden(
                    "only the family creator can delete it".to_string(),
                ));
            }

            users::Entity::update_many()
                .col_expr(
                    users::Column::ActiveFamilyId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(users::Column::ActiveFamilyId.eq(family_id))
                .exec(&db_tx)
                .await?;
            families::Entity::delete_by_id(family_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        tracing::info!("family {family_id} deleted by {actor}");
        Ok(())
    }

    pub async fn set_active_family(&self, actor: Uuid, family_id: Uuid) -> ResultEngine<Family> {
        with_tx!(self, |db_tx| {
            let (family, _) = self.require_family_member(&db_tx, family_id, actor).await?;
            self.store_active_family(&db_tx, actor, Some(family_id))
                .await?;
            Ok(Family::from(family))
        })
    }

    /// Switches the actor back to personal scope.
    pub async fn clear_active_family(&self, actor: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.store_active_family(&db_tx, actor, None).await?;
            Ok(())
        })
    }

    /// The family the actor currently works in, if any.
    pub async fn active_family(&self, actor: Uuid) -> ResultEngine<Option<Family>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let Scope::Family(family_id) = scope else {
                return Ok(None);
            };
            let family = families::Entity::find_by_id(family_id)
                .one(&db_tx)
                .await?
                .map(Family::from);
            Ok(family)
        })
    }

    pub async fn list_members(
        &self,
        actor: Uuid,
        family_id: Uuid,
    ) -> ResultEngine<Vec<FamilyMember>> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, actor).await?;
            self.members_of(&db_tx, family_id).await
        })
    }

    /// Changes the role of a membership. The family must keep one admin.
    pub async fn update_member_role(
        &self,
        actor: Uuid,
        family_id: Uuid,
        member_id: Uuid,
        role: FamilyRole,
    ) -> ResultEngine<FamilyMember> {
        with_tx!(self, |db_tx| {
            self.require_family_admin(&db_tx, family_id, actor).await?;
            let member = self.require_member(&db_tx, family_id, member_id).await?;

            if member.family_role()?.is_admin() && !role.is_admin() {
                let admins = family_members::Entity::find()
                    .filter(family_members::Column::FamilyId.eq(family_id))
                    .filter(family_members::Column::Role.eq(FamilyRole::Admin.as_str()))
                    .count(&db_tx)
                    .await?;
                if admins <= 1 {
                    return Err(EngineError::InvalidRole(
                        "a family needs at least one admin".to_string(),
                    ));
                }
            }

            let mut active: family_members::ActiveModel = member.into();
            active.role = ActiveValue::Set(role.as_str().to_string());
            let member = active.update(&db_tx).await?;
            self.member_view(&db_tx, member).await
        })
    }

    /// Removes a membership. The creator cannot be removed.
    pub async fn remove_member(
        &self,
        actor: Uuid,
        family_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let family = self.require_family_admin(&db_tx, family_id, actor).await?;
            let member = self.require_member(&db_tx, family_id, member_id).await?;
            if member.user_id == family.created_by {
                return Err(EngineError::Forbidden(
                    "the family creator cannot be removed".to_string(),
                ));
            }
            self.drop_membership(&db_tx, member).await
        })?;

        tracing::info!("member {member_id} removed from family {family_id}");
        Ok(())
    }

    pub async fn leave_family(&self, actor: Uuid, family_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (family, _) = self.require_family_member(&db_tx, family_id, actor).await?;
            if family.created_by == actor {
                return Err(EngineError::Forbidden(
                    "the family creator cannot leave; delete the family instead".to_string(),
                ));
            }
            let member = self
                .family_membership(&db_tx, family_id, actor)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("family not exists".to_string()))?;
            self.drop_membership(&db_tx, member).await
        })
    }

    async fn store_active_family(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        family_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let user = self.require_user(db, actor).await?;
        let mut active: users::ActiveModel = user.into();
        active.active_family_id = ActiveValue::Set(family_id);
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }

    async fn require_member(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<family_members::Model> {
        family_members::Entity::find_by_id(member_id)
            .filter(family_members::Column::FamilyId.eq(family_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }

    /// Deletes the membership and clears the user's active family when it
    /// pointed here.
    async fn drop_membership(
        &self,
        db: &DatabaseTransaction,
        member: family_members::Model,
    ) -> ResultEngine<()> {
        users::Entity::update_many()
            .col_expr(
                users::Column::ActiveFamilyId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(users::Column::Id.eq(member.user_id))
            .filter(users::Column::ActiveFamilyId.eq(member.family_id))
            .exec(db)
            .await?;
        family_members::Entity::delete_by_id(member.id)
            .exec(db)
            .await?;
        Ok(())
    }

    async fn members_of(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
    ) -> ResultEngine<Vec<FamilyMember>> {
        let rows = family_members::Entity::find()
            .filter(family_members::Column::FamilyId.eq(family_id))
            .find_also_related(users::Entity)
            .order_by_asc(family_members::Column::JoinedAt)
            .all(db)
            .await?;
        rows.into_iter()
            .filter_map(|(member, user)| user.map(|user| (member, user)))
            .map(|(member, user)| member_from_parts(member, user))
            .collect()
    }

    async fn member_view(
        &self,
        db: &DatabaseTransaction,
        member: family_members::Model,
    ) -> ResultEngine<FamilyMember> {
        let user = self.require_user(db, member.user_id).await?;
        member_from_parts(member, user)
    }

    /// Unaccepted, unexpired invites of a family, newest first.
    pub(super) async fn pending_family_invites(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
    ) -> ResultEngine<Vec<FamilyInvite>> {
        let now = Utc::now();
        family_invites::Entity::find()
            .filter(family_invites::Column::FamilyId.eq(family_id))
            .filter(family_invites::Column::Accepted.eq(false))
            .filter(family_invites::Column::ExpiresAt.gt(now))
            .order_by_desc(family_invites::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(|model| FamilyInvite::from_model(model, now))
            .collect()
    }
}

fn member_from_parts(
    member: family_members::Model,
    user: users::Model,
) -> ResultEngine<FamilyMember> {
    Ok(FamilyMember {
        id: member.id,
        user_id: member.user_id,
        email: user.email,
        full_name: user.full_name,
        role: member.family_role()?,
        joined_at: member.joined_at,
    })
}
