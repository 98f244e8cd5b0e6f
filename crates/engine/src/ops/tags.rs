use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Tag, TagNew, TagPatch, tags, util};

use super::{Engine, access::scope_condition, with_tx};

const MAX_TAG_NAME_LEN: usize = 50;

impl Engine {
    pub async fn create_tag(&self, actor: Uuid, new: TagNew) -> ResultEngine<Tag> {
        let name = util::normalize_required_name(&new.name, "tag", MAX_TAG_NAME_LEN)?;
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;
            self.ensure_tag_name_free(&db_tx, actor, family_id, &name, None)
                .await?;

            let model = tags::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(actor),
                family_id: ActiveValue::Set(family_id),
                name: ActiveValue::Set(name),
                color: ActiveValue::Set(util::normalize_optional_text(new.color)),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(Tag::from(model))
        })
    }

    pub async fn list_tags(&self, actor: Uuid) -> ResultEngine<Vec<Tag>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let tags = tags::Entity::find()
                .filter(scope_condition::<tags::Entity>(scope))
                .order_by_asc(tags::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Tag::from)
                .collect();
            Ok(tags)
        })
    }

    pub async fn get_tag(&self, actor: Uuid, tag_id: Uuid) -> ResultEngine<Tag> {
        with_tx!(self, |db_tx| {
            let model = self.require_tag_read(&db_tx, actor, tag_id).await?;
            Ok(Tag::from(model))
        })
    }

    pub async fn update_tag(
        &self,
        actor: Uuid,
        tag_id: Uuid,
        mut patch: TagPatch,
    ) -> ResultEngine<Tag> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(util::normalize_required_name(
                &name,
                "tag",
                MAX_TAG_NAME_LEN,
            )?);
        }
        patch.color = patch.color.map(util::normalize_optional_text);

        with_tx!(self, |db_tx| {
            let model = self.require_tag_write(&db_tx, actor, tag_id).await?;
            let mut tag = Tag::from(model);
            patch.apply(&mut tag);
            self.ensure_tag_name_free(
                &db_tx,
                tag.user_id,
                tag.family_id,
                &tag.name,
                Some(tag.id),
            )
            .await?;

            let model = tags::ActiveModel {
                id: ActiveValue::Unchanged(tag.id),
                name: ActiveValue::Set(tag.name),
                color: ActiveValue::Set(tag.color),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(Tag::from(model))
        })
    }

    /// Deleting a tag detaches it from every transaction.
    pub async fn delete_tag(&self, actor: Uuid, tag_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_tag_write(&db_tx, actor, tag_id).await?;
            tags::Entity::delete_by_id(tag_id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn ensure_tag_name_free(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        family_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = tags::Entity::find()
            .filter(tags::Column::UserId.eq(user_id))
            .filter(tags::Column::Name.eq(name));
        query = match family_id {
            Some(family_id) => query.filter(tags::Column::FamilyId.eq(family_id)),
            None => query.filter(tags::Column::FamilyId.is_null()),
        };
        if let Some(exclude) = exclude {
            query = query.filter(tags::Column::Id.ne(exclude));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
