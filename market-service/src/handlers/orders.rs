use crate::dtos::order::{
    CreateOrderRequest, CreateOrderResponse, OrderResponse, OrderSummary, UpdateOrderRequest,
    UpdateOrderResponse, UpdateStatusRequest, UpdateStatusResponse,
};
use crate::dtos::MessageResponse;
use crate::models::{Order, OrderItem, OrderStatus};
use crate::services::checkout::{self, NewOrder, ShippingMethod};
use crate::services::metrics;
use crate::startup::AppState;
use crate::utils::JsonBody;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

async fn load_order(state: &AppState, order_id: &str) -> Result<Order, AppError> {
    state
        .store
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

fn order_list(orders: Vec<Order>) -> Json<Vec<OrderResponse>> {
    Json(orders.into_iter().map(OrderResponse::from).collect())
}

#[tracing::instrument(skip(state, req))]
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = req
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let Some(user_id) = user_id.filter(|_| !req.items.is_empty()) else {
        return Err(AppError::bad_request("Required fields missing"));
    };

    let items: Vec<OrderItem> = req.items.into_iter().map(OrderItem::from).collect();
    if items
        .iter()
        .any(|item| item.fruit_id.trim().is_empty() || item.quantity <= 0 || item.price < 0.0)
    {
        return Err(AppError::bad_request("Invalid order items"));
    }

    let new_order = NewOrder {
        user_id,
        user_details: req.user_details.map(Into::into).unwrap_or_default(),
        items,
        payment: req.payment.map(Into::into).unwrap_or_default(),
        shipping: req.shipping.map(Into::into).unwrap_or_default(),
        client_subtotal: req.subtotal,
        client_total: req.total,
    };

    let order = checkout::place_order(state.store.as_ref(), new_order).await?;
    metrics::record_order_placed(ShippingMethod::parse(&order.shipping.method).label());

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order created successfully".to_string(),
            order: OrderSummary {
                order_id: order.order_id,
                total: order.total,
                status: order.status,
                created_at: order.created_at,
            },
        }),
    ))
}

pub async fn list_all_orders(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(order_list(state.store.list_orders().await?))
}

pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(order_list(state.store.list_orders_for_user(&user_id).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = load_order(&state, &order_id).await?;
    Ok(Json(OrderResponse::from(order)))
}

#[tracing::instrument(skip(state, req))]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(raw) = req.status.filter(|s| !s.trim().is_empty()) else {
        return Err(AppError::bad_request("Status is required"));
    };
    let status: OrderStatus = raw.parse().map_err(AppError::bad_request)?;

    let mut order = load_order(&state, &order_id).await?;
    order.status = status;
    if !state.store.replace_order(&order).await? {
        return Err(AppError::not_found("Order not found"));
    }

    tracing::info!(order_id = %order.order_id, status = %status, "Order status updated");

    Ok(Json(UpdateStatusResponse {
        message: "Order status updated".to_string(),
        status,
    }))
}

#[tracing::instrument(skip(state, req))]
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    JsonBody(req): JsonBody<UpdateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut order = load_order(&state, &order_id).await?;

    if let Some(shipping) = req.shipping {
        order.shipping.merge(shipping.into());
    }
    if let Some(details) = req.user_details {
        order.user_details.merge(details.into());
    }
    if let Some(payment) = req.payment {
        order.payment.merge(payment.into());
    }
    if let Some(total) = req.total {
        order.total = total;
    }
    if let Some(status) = req.status {
        order.status = status;
    }

    if !state.store.replace_order(&order).await? {
        return Err(AppError::not_found("Order not found"));
    }

    tracing::info!(order_id = %order.order_id, "Order updated");

    Ok(Json(UpdateOrderResponse {
        message: "Order updated successfully".to_string(),
        order: OrderResponse::from(order),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_order(&order_id).await? {
        return Err(AppError::not_found("Order not found"));
    }
    tracing::info!(order_id = %order_id, "Order deleted");
    Ok(Json(MessageResponse::new("Order deleted successfully")))
}
