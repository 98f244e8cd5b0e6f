//! Invitations to join a family.
//!
//! An invite is `pending` until accepted. Expiry is derived from
//! `expires_at`; cancelling deletes the row.

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, FamilyRole};

/// Lifetime of an invite token.
pub const INVITE_TTL_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FamilyInvite {
    pub id: Uuid,
    pub family_id: Uuid,
    pub invited_email: String,
    pub invited_by_user_id: Uuid,
    pub role: FamilyRole,
    pub token: String,
    pub status: InviteStatus,
    pub accepted_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// What an invitee sees before accepting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvitePreview {
    pub family_id: Uuid,
    pub family_name: String,
    pub invited_email: String,
    pub invited_by: String,
    pub role: FamilyRole,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "family_invites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub family_id: Uuid,
    pub invited_email: String,
    pub invited_by_user_id: Uuid,
    pub role: String,
    #[sea_orm(unique)]
    pub token: String,
    pub accepted: bool,
    pub accepted_by_user_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub accepted_at: Option<DateTimeUtc>,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::families::Entity",
        from = "Column::FamilyId",
        to = "super::families::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Family,
}

impl Related<super::families::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn status_at(&self, now: DateTime<Utc>) -> InviteStatus {
        invite_status(self.accepted, self.expires_at, now)
    }
}

/// Accepted wins over expired: an invite used in time stays accepted.
#[must_use]
pub fn invite_status(accepted: bool, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> InviteStatus {
    if accepted {
        InviteStatus::Accepted
    } else if now > expires_at {
        InviteStatus::Expired
    } else {
        InviteStatus::Pending
    }
}

#[must_use]
pub fn invite_expiry(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(INVITE_TTL_DAYS)
}

impl FamilyInvite {
    pub(crate) fn from_model(model: Model, now: DateTime<Utc>) -> Result<Self, EngineError> {
        let status = model.status_at(now);
        Ok(Self {
            id: model.id,
            family_id: model.family_id,
            invited_email: model.invited_email,
            invited_by_user_id: model.invited_by_user_id,
            role: FamilyRole::try_from(model.role.as_str())?,
            token: model.token,
            status,
            accepted_by_user_id: model.accepted_by_user_id,
            created_at: model.created_at,
            accepted_at: model.accepted_at,
            expires_at: model.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_derived_from_expiry() {
        let created = Utc::now();
        let expires = invite_expiry(created);
        assert_eq!(expires - created, Duration::days(30));
        assert_eq!(invite_status(false, expires, created), InviteStatus::Pending);
        assert_eq!(
            invite_status(false, expires, expires + Duration::seconds(1)),
            InviteStatus::Expired
        );
        assert_eq!(
            invite_status(true, expires, expires + Duration::days(1)),
            InviteStatus::Accepted
        );
    }
}
