//! Order pricing and the checkout write sequence.
//!
//! Checkout is not transactional: the order insert, the stock decrements
//! and the cart clearing are independent writes. Each stock decrement is
//! atomic on its own and never drives a quantity below zero.

use crate::models::{
    Order, OrderItem, OrderStatus, Payment, PaymentPatch, Shipping, ShippingPatch, UserDetails,
};
use crate::services::store::MarketStore;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use service_core::error::AppError;

pub const EXPRESS_SHIPPING_COST: f64 = 500.0;
pub const STANDARD_SHIPPING_COST: f64 = 250.0;
pub const DEFAULT_SHIPPING_METHOD: &str = "standard";

const ORDER_ID_ATTEMPTS: usize = 10;
// Client totals within this distance of ours are treated as equal
const TOTAL_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingMethod {
    Express,
    Standard,
    Pickup,
    Other,
}

impl ShippingMethod {
    pub fn parse(method: &str) -> Self {
        match method.trim().to_lowercase().as_str() {
            "express" => ShippingMethod::Express,
            "standard" => ShippingMethod::Standard,
            "pickup" => ShippingMethod::Pickup,
            _ => ShippingMethod::Other,
        }
    }

    /// Unknown methods are charged like standard shipping.
    pub fn cost(&self) -> f64 {
        match self {
            ShippingMethod::Express => EXPRESS_SHIPPING_COST,
            ShippingMethod::Pickup => 0.0,
            ShippingMethod::Standard | ShippingMethod::Other => STANDARD_SHIPPING_COST,
        }
    }

    pub fn estimated_delivery(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ShippingMethod::Express => now + Duration::days(2),
            ShippingMethod::Standard => now + Duration::days(5),
            ShippingMethod::Pickup | ShippingMethod::Other => now,
        }
    }

    /// Bounded label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ShippingMethod::Express => "express",
            ShippingMethod::Standard => "standard",
            ShippingMethod::Pickup => "pickup",
            ShippingMethod::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
}

pub fn price_order(items: &[OrderItem], method: ShippingMethod) -> Totals {
    let subtotal: f64 = items.iter().map(OrderItem::line_total).sum();
    let shipping_cost = method.cost();
    Totals {
        subtotal,
        shipping_cost,
        total: subtotal + shipping_cost,
    }
}

/// `ORD-` followed by six digits.
pub fn generate_order_id() -> String {
    let number: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    format!("ORD-{}", number)
}

/// Everything a client supplies when checking out.
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub user_id: String,
    pub user_details: UserDetails,
    pub items: Vec<OrderItem>,
    pub payment: PaymentPatch,
    pub shipping: ShippingPatch,
    pub client_subtotal: Option<f64>,
    pub client_total: Option<f64>,
}

fn differs(client: Option<f64>, ours: f64) -> bool {
    client.is_some_and(|value| (value - ours).abs() > TOTAL_TOLERANCE)
}

/// Build the order record with server-side pricing. The id is assigned later.
pub fn build_order(request: NewOrder, now: DateTime<Utc>) -> Order {
    let method_name = request
        .shipping
        .method
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHIPPING_METHOD.to_string());
    let method = ShippingMethod::parse(&method_name);
    let totals = price_order(&request.items, method);

    if differs(request.client_subtotal, totals.subtotal)
        || differs(request.client_total, totals.total)
    {
        tracing::warn!(
            user_id = %request.user_id,
            client_subtotal = ?request.client_subtotal,
            client_total = ?request.client_total,
            subtotal = totals.subtotal,
            total = totals.total,
            "Client order totals differ from server pricing, using server values"
        );
    }

    let mut payment = Payment::default();
    payment.merge(request.payment);

    let shipping = Shipping {
        method: method_name,
        cost: totals.shipping_cost,
        status: request.shipping.status.unwrap_or_default(),
        estimated_delivery: Some(method.estimated_delivery(now)),
    };

    Order {
        id: crate::models::new_record_id(),
        order_id: String::new(),
        user_id: request.user_id,
        user_details: request.user_details,
        items: request.items,
        payment,
        shipping,
        subtotal: totals.subtotal,
        total: totals.total,
        status: OrderStatus::Processing,
        created_at: now,
    }
}

/// Insert the order, take its items out of stock and empty the user's cart.
pub async fn place_order(store: &dyn MarketStore, request: NewOrder) -> Result<Order, AppError> {
    let mut order = build_order(request, Utc::now());

    let mut inserted = false;
    for attempt in 1..=ORDER_ID_ATTEMPTS {
        order.order_id = generate_order_id();
        match store.insert_order(&order).await {
            Ok(()) => {
                inserted = true;
                break;
            }
            Err(AppError::Conflict(_)) => {
                tracing::warn!(order_id = %order.order_id, attempt, "Order id collision, retrying");
            }
            Err(e) => return Err(e),
        }
    }
    if !inserted {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "could not allocate a unique order id after {} attempts",
            ORDER_ID_ATTEMPTS
        )));
    }

    tracing::info!(
        order_id = %order.order_id,
        user_id = %order.user_id,
        total = order.total,
        items = order.items.len(),
        "Order created"
    );

    for item in &order.items {
        if !store
            .decrement_fruit_quantity(&item.fruit_id, item.quantity)
            .await?
        {
            tracing::warn!(
                order_id = %order.order_id,
                fruit_id = %item.fruit_id,
                "Ordered fruit no longer exists, stock not adjusted"
            );
        }
    }

    let cleared = store.clear_cart(&order.user_id).await?;
    tracing::debug!(user_id = %order.user_id, cleared, "Cart cleared after checkout");

    Ok(order)
}
