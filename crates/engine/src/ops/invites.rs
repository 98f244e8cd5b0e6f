use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Family, FamilyInvite, FamilyRole, InviteNotice, InvitePreview, InviteStatus,
    ResultEngine, families, family_invites, family_members, users, util,
};

use super::{Engine, with_tx};

impl Engine {
    /// Invites `email` into the family. The notifier runs after commit and
    /// its failure does not undo the invite.
    pub async fn create_invite(
        &self,
        actor: Uuid,
        family_id: Uuid,
        email: &str,
        role: FamilyRole,
    ) -> ResultEngine<FamilyInvite> {
        let email = util::normalize_email(email)?;

        let (invite, notice) = with_tx!(self, |db_tx| {
            let family = self.require_family_admin(&db_tx, family_id, actor).await?;
            let inviter = self.require_user(&db_tx, actor).await?;
            let now = Utc::now();

            let invitee = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?;
            if let Some(invitee) = invitee
                && self
                    .family_membership(&db_tx, family_id, invitee.id)
                    .await?
                    .is_some()
            {
                return Err(EngineError::ExistingKey(format!(
                    "{email} is already a member"
                )));
            }

            let pending = family_invites::Entity::find()
                .filter(family_invites::Column::FamilyId.eq(family_id))
                .filter(family_invites::Column::InvitedEmail.eq(email.clone()))
                .filter(family_invites::Column::Accepted.eq(false))
                .filter(family_invites::Column::ExpiresAt.gt(now))
                .one(&db_tx)
                .await?;
            if pending.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "{email} already has a pending invite"
                )));
            }

            let model = family_invites::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                family_id: ActiveValue::Set(family_id),
                invited_email: ActiveValue::Set(email.clone()),
                invited_by_user_id: ActiveValue::Set(actor),
                role: ActiveValue::Set(role.as_str().to_string()),
                token: ActiveValue::Set(util::generate_token()),
                accepted: ActiveValue::Set(false),
                accepted_by_user_id: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
                accepted_at: ActiveValue::Set(None),
                expires_at: ActiveValue::Set(family_invites::invite_expiry(now)),
            }
            .insert(&db_tx)
            .await?;

            let notice = InviteNotice {
                invited_email: model.invited_email.clone(),
                family_name: family.name,
                inviter_name: inviter.full_name,
                role,
                token: model.token.clone(),
                expires_at: model.expires_at,
            };
            Ok((FamilyInvite::from_model(model, now)?, notice))
        })?;

        tracing::info!("invite {} created for family {family_id}", invite.id);
        if !self.notifier.notify_invite(&notice).await {
            tracing::warn!("invite {} was not delivered", invite.id);
        }
        Ok(invite)
    }

    /// Pending invites of a family, newest first. Admin only.
    pub async fn list_invites(
        &self,
        actor: Uuid,
        family_id: Uuid,
    ) -> ResultEngine<Vec<FamilyInvite>> {
        with_tx!(self, |db_tx| {
            self.require_family_admin(&db_tx, family_id, actor).await?;
            self.pending_family_invites(&db_tx, family_id).await
        })
    }

    pub async fn cancel_invite(
        &self,
        actor: Uuid,
        family_id: Uuid,
        invite_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_family_admin(&db_tx, family_id, actor).await?;
            let invite = family_invites::Entity::find_by_id(invite_id)
                .filter(family_invites::Column::FamilyId.eq(family_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))?;
            if invite.accepted {
                return Err(EngineError::ExistingKey(
                    "invite already accepted".to_string(),
                ));
            }
            family_invites::Entity::delete_by_id(invite.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// What the holder of `token` is invited to. Needs no account.
    pub async fn invite_preview(&self, token: &str) -> ResultEngine<InvitePreview> {
        with_tx!(self, |db_tx| {
            let (invite, family) = self.usable_invite(&db_tx, token).await?;
            self.preview_of(&db_tx, invite, family).await
        })
    }

    /// Joins the invited family with the invite's role and makes it active.
    pub async fn accept_invite(&self, actor: Uuid, token: &str) -> ResultEngine<Family> {
        let family = with_tx!(self, |db_tx| {
            let (invite, family) = self.usable_invite(&db_tx, token).await?;
            let user = self.require_user(&db_tx, actor).await?;
            if !user.email.eq_ignore_ascii_case(&invite.invited_email) {
                return Err(EngineError::Forbidden(
                    "invite was sent to another email".to_string(),
                ));
            }
            if self
                .family_membership(&db_tx, family.id, actor)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(
                    "already a member of this family".to_string(),
                ));
            }

            let now = Utc::now();
            family_members::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                family_id: ActiveValue::Set(family.id),
                user_id: ActiveValue::Set(actor),
                role: ActiveValue::Set(invite.role.clone()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let mut accepted: family_invites::ActiveModel = invite.into();
            accepted.accepted = ActiveValue::Set(true);
            accepted.accepted_by_user_id = ActiveValue::Set(Some(actor));
            accepted.accepted_at = ActiveValue::Set(Some(now));
            accepted.update(&db_tx).await?;

            let mut active_user: users::ActiveModel = user.into();
            active_user.active_family_id = ActiveValue::Set(Some(family.id));
            active_user.updated_at = ActiveValue::Set(now);
            active_user.update(&db_tx).await?;

            Ok(Family::from(family))
        })?;

        tracing::info!("user {actor} joined family {}", family.id);
        Ok(family)
    }

    /// Unaccepted, unexpired invites addressed to the actor's email.
    pub async fn pending_invites(&self, actor: Uuid) -> ResultEngine<Vec<InvitePreview>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, actor).await?;
            let rows = family_invites::Entity::find()
                .filter(family_invites::Column::InvitedEmail.eq(user.email))
                .filter(family_invites::Column::Accepted.eq(false))
                .filter(family_invites::Column::ExpiresAt.gt(Utc::now()))
                .find_also_related(families::Entity)
                .order_by_desc(family_invites::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut previews = Vec::with_capacity(rows.len());
            for (invite, family) in rows {
                if let Some(family) = family {
                    previews.push(self.preview_of(&db_tx, invite, family).await?);
                }
            }
            Ok(previews)
        })
    }

    /// Looks up an invite that can still be accepted.
    async fn usable_invite(
        &self,
        db: &DatabaseTransaction,
        token: &str,
    ) -> ResultEngine<(family_invites::Model, families::Model)> {
        let (invite, family) = family_invites::Entity::find()
            .filter(family_invites::Column::Token.eq(token))
            .find_also_related(families::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))?;
        let family =
            family.ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))?;

        match invite.status_at(Utc::now()) {
            InviteStatus::Accepted => Err(EngineError::ExistingKey(
                "invite already accepted".to_string(),
            )),
            InviteStatus::Expired => Err(EngineError::Expired("invite has expired".to_string())),
            InviteStatus::Pending => Ok((invite, family)),
        }
    }

    async fn preview_of(
        &self,
        db: &DatabaseTransaction,
        invite: family_invites::Model,
        family: families::Model,
    ) -> ResultEngine<InvitePreview> {
        let inviter = self.require_user(db, invite.invited_by_user_id).await?;
        Ok(InvitePreview {
            family_id: family.id,
            family_name: family.name,
            invited_email: invite.invited_email,
            invited_by: inviter.full_name,
            role: FamilyRole::try_from(invite.role.as_str())?,
            token: invite.token,
            expires_at: invite.expires_at,
        })
    }
}
