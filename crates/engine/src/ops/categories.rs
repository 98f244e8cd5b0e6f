use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BudgetClassification, Category, CategoryNew, CategoryPatch, CategoryType, EngineError,
    ResultEngine, categories, transactions, util,
};

use super::{Engine, with_tx};

const MAX_CATEGORY_NAME_LEN: usize = 100;

use BudgetClassification::{Needs, Savings, Wants};
use CategoryType::{Expense, Income};

/// Global categories shipped with every installation, split along the
/// 50/30/20 rule.
const SYSTEM_CATEGORIES: &[(&str, CategoryType, Option<BudgetClassification>, &str, &str)] = &[
    ("Housing", Expense, Some(Needs), "🏠", "#FF6B6B"),
    ("Utilities", Expense, Some(Needs), "💡", "#FFA07A"),
    ("Groceries & Food", Expense, Some(Needs), "🛒", "#4ECDC4"),
    ("Transportation", Expense, Some(Needs), "🚗", "#45B7D1"),
    ("Healthcare & Medical", Expense, Some(Needs), "⚕️", "#98D8C8"),
    ("Insurance", Expense, Some(Needs), "🛡️", "#A8D8EA"),
    ("Debt Payments & EMIs", Expense, Some(Needs), "💳", "#FFD93D"),
    ("Childcare & Education", Expense, Some(Needs), "👶", "#FCBAD3"),
    ("Dining & Restaurants", Expense, Some(Wants), "🍽️", "#F38181"),
    ("Entertainment", Expense, Some(Wants), "🎬", "#AA96DA"),
    ("Shopping & Clothing", Expense, Some(Wants), "🛍️", "#FFB6C1"),
    ("Personal Care & Beauty", Expense, Some(Wants), "💅", "#C3AED6"),
    ("Subscriptions", Expense, Some(Wants), "📱", "#B8E6B8"),
    ("Travel & Vacation", Expense, Some(Wants), "✈️", "#4D96FF"),
    ("Hobbies & Recreation", Expense, Some(Wants), "🎨", "#DDA0DD"),
    ("Gifts & Donations", Expense, Some(Wants), "🎁", "#FF6B9D"),
    ("Pet Care", Expense, Some(Wants), "🐾", "#87CEEB"),
    ("Investments", Expense, Some(Savings), "📈", "#6BCB77"),
    ("Emergency Fund", Expense, Some(Savings), "🏦", "#27AE60"),
    ("Retirement Savings", Expense, Some(Savings), "👴", "#2ECC71"),
    ("Professional Services", Expense, Some(Needs), "💼", "#8E44AD"),
    ("Technology & Gadgets", Expense, Some(Wants), "💻", "#3498DB"),
    ("Home Maintenance", Expense, Some(Needs), "🔧", "#E67E22"),
    ("Taxes", Expense, Some(Needs), "📋", "#95A5A6"),
    ("Miscellaneous", Expense, Some(Needs), "📦", "#BDC3C7"),
    ("Salary & Wages", Income, None, "💼", "#27AE60"),
    ("Freelance & Business Income", Income, None, "🚀", "#2ECC71"),
    ("Investment Returns", Income, None, "📊", "#16A085"),
    ("Rental Income", Income, None, "🏘️", "#1ABC9C"),
    ("Gifts Received", Income, None, "🎉", "#3498DB"),
    ("Other Income", Income, None, "💵", "#9B59B6"),
];

impl Engine {
    /// Global categories plus the custom ones of the actor's active family,
    /// by `display_order` then name.
    pub async fn list_categories(
        &self,
        actor: Uuid,
        category_type: Option<CategoryType>,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let mut visible = Condition::any().add(categories::Column::FamilyId.is_null());
            if let Some(family_id) = scope.family_id() {
                visible = visible.add(categories::Column::FamilyId.eq(family_id));
            }
            let mut query = categories::Entity::find()
                .filter(visible)
                .order_by_asc(categories::Column::DisplayOrder)
                .order_by_asc(categories::Column::Name);
            if let Some(kind) = category_type {
                query = query.filter(categories::Column::CategoryType.eq(kind.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect()
        })
    }

    /// Adds a custom category to the actor's active family.
    pub async fn create_category(&self, actor: Uuid, new: CategoryNew) -> ResultEngine<Category> {
        let name = util::normalize_required_name(&new.name, "category", MAX_CATEGORY_NAME_LEN)?;
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let Some(family_id) = scope.family_id() else {
                return Err(EngineError::Forbidden(
                    "custom categories need an active family".to_string(),
                ));
            };
            let family_id = self
                .creation_family(&db_tx, actor, scope, Some(family_id))
                .await?;

            if let Some(parent_id) = new.parent_category_id {
                let parent = self
                    .require_usable_category(&db_tx, parent_id, family_id)
                    .await?;
                if parent.category_type != new.category_type.as_str() {
                    return Err(EngineError::InvalidReference(
                        "parent category has a different type".to_string(),
                    ));
                }
            }

            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                name: ActiveValue::Set(name),
                family_id: ActiveValue::Set(family_id),
                parent_category_id: ActiveValue::Set(new.parent_category_id),
                category_type: ActiveValue::Set(new.category_type.as_str().to_string()),
                budget_classification: ActiveValue::Set(
                    new.budget_classification.map(|c| c.as_str().to_string()),
                ),
                icon: ActiveValue::Set(util::normalize_optional_text(new.icon)),
                color: ActiveValue::Set(util::normalize_optional_text(new.color)),
                is_system: ActiveValue::Set(false),
                display_order: ActiveValue::Set(new.display_order.unwrap_or(0)),
            }
            .insert(&db_tx)
            .await?;
            Category::try_from(model)
        })
    }

    pub async fn update_category(
        &self,
        actor: Uuid,
        category_id: Uuid,
        mut patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(util::normalize_required_name(
                &name,
                "category",
                MAX_CATEGORY_NAME_LEN,
            )?);
        }
        patch.icon = patch.icon.map(util::normalize_optional_text);
        patch.color = patch.color.map(util::normalize_optional_text);

        with_tx!(self, |db_tx| {
            let model = self
                .require_custom_category_write(&db_tx, actor, category_id)
                .await?;
            let mut category = Category::try_from(model)?;
            patch.apply(&mut category);

            let model = categories::ActiveModel {
                id: ActiveValue::Unchanged(category.id),
                name: ActiveValue::Set(category.name),
                budget_classification: ActiveValue::Set(
                    category.budget_classification.map(|c| c.as_str().to_string()),
                ),
                icon: ActiveValue::Set(category.icon),
                color: ActiveValue::Set(category.color),
                display_order: ActiveValue::Set(category.display_order),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Category::try_from(model)
        })
    }

    /// Deletes an unused custom category.
    pub async fn delete_category(&self, actor: Uuid, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_custom_category_write(&db_tx, actor, category_id)
                .await?;
            let in_use = transactions::Entity::find()
                .filter(
                    Condition::any()
                        .add(transactions::Column::CategoryId.eq(category_id))
                        .add(transactions::Column::SubcategoryId.eq(category_id)),
                )
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "category is used by {in_use} transactions"
                )));
            }
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Inserts the missing system categories. Returns how many were added.
    pub async fn seed_system_categories(&self) -> ResultEngine<u64> {
        let inserted = with_tx!(self, |db_tx| {
            let mut inserted = 0;
            for (order, (name, kind, classification, icon, color)) in
                SYSTEM_CATEGORIES.iter().enumerate()
            {
                let exists = categories::Entity::find()
                    .filter(categories::Column::IsSystem.eq(true))
                    .filter(categories::Column::FamilyId.is_null())
                    .filter(categories::Column::Name.eq(*name))
                    .count(&db_tx)
                    .await?
                    > 0;
                if exists {
                    continue;
                }
                categories::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    name: ActiveValue::Set((*name).to_string()),
                    family_id: ActiveValue::Set(None),
                    parent_category_id: ActiveValue::Set(None),
                    category_type: ActiveValue::Set(kind.as_str().to_string()),
                    budget_classification: ActiveValue::Set(
                        classification.map(|c| c.as_str().to_string()),
                    ),
                    icon: ActiveValue::Set(Some((*icon).to_string())),
                    color: ActiveValue::Set(Some((*color).to_string())),
                    is_system: ActiveValue::Set(true),
                    display_order: ActiveValue::Set(i32::try_from(order + 1).unwrap_or(i32::MAX)),
                }
                .insert(&db_tx)
                .await?;
                inserted += 1;
            }
            Ok(inserted)
        })?;

        tracing::info!("seeded {inserted} system categories");
        Ok(inserted)
    }

    /// The category exists and is global or belongs to `family_id`.
    pub(super) async fn require_usable_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        family_id: Option<Uuid>,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .filter(|category| category.usable_in(family_id))
            .ok_or_else(|| EngineError::InvalidReference(format!("unknown category {category_id}")))
    }

    /// A custom category of a family the actor may write in.
    async fn require_custom_category_write(
        &self,
        db: &DatabaseTransaction,
        actor: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        let model = categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        let Some(family_id) = model.family_id else {
            return Err(EngineError::Forbidden(
                "system categories cannot be modified".to_string(),
            ));
        };
        if model.is_system {
            return Err(EngineError::Forbidden(
                "system categories cannot be modified".to_string(),
            ));
        }
        let role = self
            .family_role(db, family_id, actor)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        if !role.can_write() {
            return Err(EngineError::Forbidden(
                "viewers cannot modify categories".to_string(),
            ));
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn system_categories_have_unique_names() {
        let names: HashSet<_> = SYSTEM_CATEGORIES.iter().map(|(name, ..)| *name).collect();
        assert_eq!(names.len(), SYSTEM_CATEGORIES.len());
    }

    #[test]
    fn only_expenses_are_classified() {
        for (name, kind, classification, ..) in SYSTEM_CATEGORIES {
            assert_eq!(
                *kind == CategoryType::Expense,
                classification.is_some(),
                "{name}"
            );
        }
    }
}
