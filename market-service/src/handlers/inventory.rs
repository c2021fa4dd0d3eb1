use crate::dtos::fruit::fruit_list;
use crate::dtos::inventory::{InventoryQuery, ThresholdQuery};
use crate::services::inventory::{self, InventoryCriteria};
use crate::services::{FruitFilter, FruitOrder};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

#[tracing::instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let criteria =
        InventoryCriteria::from_query(&query, state.config.inventory.low_stock_threshold)?;
    let fruits = state
        .store
        .list_fruits(&FruitFilter::default(), FruitOrder::NewestFirst)
        .await?;

    Ok(Json(fruit_list(inventory::apply(
        fruits,
        &criteria,
        Utc::now(),
    ))))
}

pub async fn inventory_stats(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let threshold = query
        .threshold
        .unwrap_or(state.config.inventory.low_stock_threshold);
    let fruits = state
        .store
        .list_fruits(&FruitFilter::default(), FruitOrder::NewestFirst)
        .await?;

    Ok(Json(inventory::stats(&fruits, threshold, Utc::now())))
}
