use axum::{
    Json,
    extract::{Path, State},
};
use engine::MerchantCategory;

use crate::{ServerError, server::ServerState};

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<MerchantCategory>>, ServerError> {
    Ok(Json(state.engine.list_merchant_categories().await?))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(mcc_code): Path<String>,
) -> Result<Json<MerchantCategory>, ServerError> {
    Ok(Json(state.engine.merchant_category(&mcc_code).await?))
}
