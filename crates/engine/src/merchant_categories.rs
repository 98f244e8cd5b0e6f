//! Card network merchant category codes (MCC).
//!
//! A global lookup table: each code may point at the system category a
//! purchase with that code usually belongs to. Transactions carry the raw
//! code and never require a row here.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// Four ASCII digits.
pub(crate) fn is_mcc_code(value: &str) -> bool {
    value.len() == 4 && value.chars().all(|c| c.is_ascii_digit())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MerchantCategory {
    pub mcc_code: String,
    pub description: String,
    pub category_range: Option<String>,
    pub suggested_category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "merchant_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub mcc_code: String,
    pub description: String,
    pub category_range: Option<String>,
    pub suggested_category_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::SuggestedCategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    SuggestedCategory,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SuggestedCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MerchantCategory {
    fn from(model: Model) -> Self {
        Self {
            mcc_code: model.mcc_code,
            description: model.description,
            category_range: model.category_range,
            suggested_category_id: model.suggested_category_id,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_four_digits() {
        assert!(is_mcc_code("5411"));
        assert!(is_mcc_code("0742"));
        assert!(!is_mcc_code("541"));
        assert!(!is_mcc_code("54111"));
        assert!(!is_mcc_code("54A1"));
        assert!(!is_mcc_code("５４１１"));
    }
}
