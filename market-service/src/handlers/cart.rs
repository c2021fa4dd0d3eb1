use crate::dtos::cart::{AddToCartRequest, CartItemResponse, UpdateCartRequest};
use crate::dtos::MessageResponse;
use crate::models::CartItem;
use crate::startup::AppState;
use crate::utils::JsonBody;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[tracing::instrument(skip(state, req))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AddToCartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(user_id), Some(fruit_id), Some(quantity)) = (
        non_empty(req.user_id),
        non_empty(req.fruit_id),
        req.quantity.filter(|q| *q > 0),
    ) else {
        return Err(AppError::bad_request("Invalid request data"));
    };

    let fruit = state
        .store
        .get_fruit(&fruit_id)
        .await?
        .ok_or_else(|| AppError::not_found("Fruit not found"))?;

    if !fruit.can_supply(quantity) {
        return Err(AppError::bad_request(
            "Fruit is not available or insufficient quantity",
        ));
    }

    let item = match state.store.find_cart_item(&user_id, &fruit_id).await? {
        Some(mut existing) => {
            let new_total = existing
                .quantity
                .checked_add(quantity)
                .filter(|total| *total <= fruit.quantity);
            let Some(new_total) = new_total else {
                return Err(AppError::Rejected(
                    "Adding this quantity would exceed available inventory".to_string(),
                    json!({
                        "availableQuantity": fruit.quantity,
                        "cartQuantity": existing.quantity,
                        "requestedQuantity": quantity,
                    }),
                ));
            };
            existing.quantity = new_total;
            existing.price = fruit.price;
            existing
        }
        None => CartItem::snapshot(user_id, &fruit, quantity),
    };

    state.store.upsert_cart_item(&item).await?;

    tracing::info!(
        cart_item_id = %item.id,
        user_id = %item.user_id,
        fruit_id = %item.fruit_id,
        quantity = item.quantity,
        "Cart line saved"
    );

    Ok((StatusCode::CREATED, Json(CartItemResponse::from(item))))
}

pub async fn list_cart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.store.list_cart(&user_id).await?;
    Ok(Json(
        items
            .into_iter()
            .map(CartItemResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[tracing::instrument(skip(state, req))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateCartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(quantity) = req.quantity.filter(|q| *q > 0) else {
        return Err(AppError::bad_request("Invalid quantity"));
    };

    let mut item = state
        .store
        .get_cart_item(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item not found"))?;

    let in_stock = state
        .store
        .get_fruit(&item.fruit_id)
        .await?
        .is_some_and(|fruit| fruit.quantity >= quantity);
    if !in_stock {
        return Err(AppError::bad_request("Requested quantity not available"));
    }

    item.quantity = quantity;
    state.store.upsert_cart_item(&item).await?;

    Ok(Json(CartItemResponse::from(item)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_cart_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_cart_item(&id).await? {
        return Err(AppError::not_found("Cart item not found"));
    }
    Ok(Json(MessageResponse::new("Item removed from cart")))
}

#[tracing::instrument(skip(state))]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.store.clear_cart(&user_id).await?;
    tracing::info!(user_id = %user_id, removed, "Cart cleared");
    Ok(Json(MessageResponse::new("Cart cleared successfully")))
}
