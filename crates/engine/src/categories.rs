//! Category registry.
//!
//! Categories with no `family_id` are global and visible to everyone; the
//! system ones are seeded and immutable. Families add their own custom
//! categories, optionally nested under a parent.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Expense,
    Income,
}

impl CategoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl TryFrom<&str> for CategoryType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(EngineError::InvalidValue(format!(
                "invalid category type: {other}"
            ))),
        }
    }
}

/// 50/30/20 bucket a category counts towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetClassification {
    Needs,
    Wants,
    Savings,
}

impl BudgetClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Needs => "needs",
            Self::Wants => "wants",
            Self::Savings => "savings",
        }
    }
}

impl TryFrom<&str> for BudgetClassification {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "needs" => Ok(Self::Needs),
            "wants" => Ok(Self::Wants),
            "savings" => Ok(Self::Savings),
            other => Err(EngineError::InvalidValue(format!(
                "invalid budget classification: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub family_id: Option<Uuid>,
    pub parent_category_id: Option<Uuid>,
    pub category_type: CategoryType,
    pub budget_classification: Option<BudgetClassification>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_system: bool,
    pub display_order: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryNew {
    pub name: String,
    pub parent_category_id: Option<Uuid>,
    pub category_type: CategoryType,
    pub budget_classification: Option<BudgetClassification>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub budget_classification: Option<Option<BudgetClassification>>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub display_order: Option<i32>,
}

impl CategoryPatch {
    pub fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(classification) = self.budget_classification {
            category.budget_classification = classification;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        if let Some(order) = self.display_order {
            category.display_order = order;
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub family_id: Option<Uuid>,
    pub parent_category_id: Option<Uuid>,
    pub category_type: String,
    pub budget_classification: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_system: bool,
    pub display_order: i32,
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
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentCategoryId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Parent,
}

impl Related<super::families::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A category can be used by a record of `family_id` when it is global or
    /// belongs to that same family.
    pub(crate) fn usable_in(&self, family_id: Option<Uuid>) -> bool {
        self.family_id.is_none() || self.family_id == family_id
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            family_id: model.family_id,
            parent_category_id: model.parent_category_id,
            category_type: CategoryType::try_from(model.category_type.as_str())?,
            budget_classification: model
                .budget_classification
                .as_deref()
                .map(BudgetClassification::try_from)
                .transpose()?,
            icon: model.icon,
            color: model.color,
            is_system: model.is_system,
            display_order: model.display_order,
        })
    }
}
