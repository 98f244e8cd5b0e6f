use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, MerchantCategory, ResultEngine, categories, merchant_categories,
    merchant_categories::is_mcc_code,
};

use super::{Engine, with_tx};

/// `(mcc_code, description, category_range, system category name)`.
const MERCHANT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("5411", "Grocery Stores, Supermarkets", "Retail Outlet Services", "Groceries & Food"),
    ("5422", "Meat Provisioners, Freezer and Locker", "Retail Outlet Services", "Groceries & Food"),
    ("5499", "Misc Food Stores/Convenience Stores", "Retail Outlet Services", "Groceries & Food"),
    ("5812", "Eating Places/Restaurants", "Retail Outlet Services", "Dining & Restaurants"),
    ("5814", "Fast Food Restaurants", "Retail Outlet Services", "Dining & Restaurants"),
    ("4121", "Taxicabs and Limousines", "Transportation Services", "Transportation"),
    ("4111", "Local/Suburban Passenger Transport", "Transportation Services", "Transportation"),
    ("5912", "Drug Stores and Pharmacies", "Retail Outlet Services", "Healthcare & Medical"),
    ("8011", "Doctors", "Professional Services", "Healthcare & Medical"),
    ("5311", "Department Stores", "Retail Outlet Services", "Shopping & Clothing"),
    ("5691", "Men's and Women's Clothing Stores", "Clothing Stores", "Shopping & Clothing"),
    ("7832", "Motion Picture Theatres", "Amusement and Entertainment", "Entertainment"),
    ("4900", "Utilities - Electric, Gas, Water", "Utility Services", "Utilities"),
    ("7011", "Hotels, Motels, Resorts", "Hotels and Lodging", "Travel & Vacation"),
    ("4112", "Passenger Railways", "Transportation Services", "Travel & Vacation"),
    ("5732", "Electronics Stores", "Retail Outlet Services", "Technology & Gadgets"),
];

impl Engine {
    /// Inserts the missing merchant category codes, linked to the system
    /// category of the same name. Returns how many were added.
    pub async fn seed_merchant_categories(&self) -> ResultEngine<u64> {
        let inserted = with_tx!(self, |db_tx| {
            let mut inserted = 0;
            for (mcc_code, description, range, category_name) in MERCHANT_CATEGORIES {
                let exists = merchant_categories::Entity::find_by_id(*mcc_code)
                    .count(&db_tx)
                    .await?
                    > 0;
                if exists {
                    continue;
                }
                let suggested = categories::Entity::find()
                    .filter(categories::Column::IsSystem.eq(true))
                    .filter(categories::Column::FamilyId.is_null())
                    .filter(categories::Column::Name.eq(*category_name))
                    .one(&db_tx)
                    .await?;
                if suggested.is_none() {
                    tracing::warn!("no system category {category_name:?} for mcc {mcc_code}");
                }
                merchant_categories::ActiveModel {
                    mcc_code: ActiveValue::Set((*mcc_code).to_string()),
                    description: ActiveValue::Set((*description).to_string()),
                    category_range: ActiveValue::Set(Some((*range).to_string())),
                    suggested_category_id: ActiveValue::Set(suggested.map(|c| c.id)),
                    created_at: ActiveValue::Set(Utc::now()),
                }
                .insert(&db_tx)
                .await?;
                inserted += 1;
            }
            Ok(inserted)
        })?;

        tracing::info!("seeded {inserted} merchant category codes");
        Ok(inserted)
    }

    pub async fn list_merchant_categories(&self) -> ResultEngine<Vec<MerchantCategory>> {
        with_tx!(self, |db_tx| {
            Ok(merchant_categories::Entity::find()
                .order_by_asc(merchant_categories::Column::MccCode)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(MerchantCategory::from)
                .collect())
        })
    }

    /// Looks up a merchant category code and its suggested category.
    pub async fn merchant_category(&self, mcc_code: &str) -> ResultEngine<MerchantCategory> {
        let mcc_code = mcc_code.trim();
        if !is_mcc_code(mcc_code) {
            return Err(EngineError::InvalidValue(
                "mcc_code must be 4 digits".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            merchant_categories::Entity::find_by_id(mcc_code)
                .one(&db_tx)
                .await?
                .map(MerchantCategory::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("merchant category {mcc_code}")))
        })
    }
}
