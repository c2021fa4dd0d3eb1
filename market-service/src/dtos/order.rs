use crate::models::{
    Grade, Order, OrderItem, OrderStatus, Payment, PaymentPatch, PaymentStatus, Shipping,
    ShippingPatch, ShippingStatus, UserDetails,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsDto {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl From<UserDetailsDto> for UserDetails {
    fn from(dto: UserDetailsDto) -> Self {
        Self {
            full_name: dto.full_name,
            email: dto.email,
            phone: dto.phone,
            address: dto.address,
            city: dto.city,
            postal_code: dto.postal_code,
        }
    }
}

impl From<UserDetails> for UserDetailsDto {
    fn from(details: UserDetails) -> Self {
        Self {
            full_name: details.full_name,
            email: details.email,
            phone: details.phone,
            address: details.address,
            city: details.city,
            postal_code: details.postal_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub fruit_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grade: Grade,
    pub image_url: Option<String>,
    pub price: f64,
    pub quantity: i64,
}

impl From<OrderItemDto> for OrderItem {
    fn from(dto: OrderItemDto) -> Self {
        Self {
            fruit_id: dto.fruit_id,
            name: dto.name,
            grade: dto.grade,
            image_url: dto.image_url,
            price: dto.price,
            quantity: dto.quantity,
        }
    }
}

impl From<OrderItem> for OrderItemDto {
    fn from(item: OrderItem) -> Self {
        Self {
            fruit_id: item.fruit_id,
            name: item.name,
            grade: item.grade,
            image_url: item.image_url,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub method: Option<String>,
    pub card_last4: Option<String>,
    pub status: Option<PaymentStatus>,
}

impl From<PaymentDto> for PaymentPatch {
    fn from(dto: PaymentDto) -> Self {
        Self {
            method: dto.method,
            card_last4: dto.card_last4,
            status: dto.status,
        }
    }
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        Self {
            method: payment.method,
            card_last4: payment.card_last4,
            status: Some(payment.status),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDto {
    pub method: Option<String>,
    pub cost: Option<f64>,
    pub status: Option<ShippingStatus>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl From<ShippingDto> for ShippingPatch {
    fn from(dto: ShippingDto) -> Self {
        Self {
            method: dto.method,
            cost: dto.cost,
            status: dto.status,
            estimated_delivery: dto.estimated_delivery,
        }
    }
}

impl From<Shipping> for ShippingDto {
    fn from(shipping: Shipping) -> Self {
        Self {
            method: Some(shipping.method),
            cost: Some(shipping.cost),
            status: Some(shipping.status),
            estimated_delivery: shipping.estimated_delivery,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Option<String>,
    pub user_details: Option<UserDetailsDto>,
    #[serde(default)]
    pub items: Vec<OrderItemDto>,
    pub payment: Option<PaymentDto>,
    pub shipping: Option<ShippingDto>,
    pub subtotal: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub message: String,
    pub order: OrderSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub shipping: Option<ShippingDto>,
    pub user_details: Option<UserDetailsDto>,
    pub payment: Option<PaymentDto>,
    pub total: Option<f64>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub user_details: UserDetailsDto,
    pub items: Vec<OrderItemDto>,
    pub payment: PaymentDto,
    pub shipping: ShippingDto,
    pub subtotal: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_id: order.order_id,
            user_id: order.user_id,
            user_details: order.user_details.into(),
            items: order.items.into_iter().map(OrderItemDto::from).collect(),
            payment: order.payment.into(),
            shipping: order.shipping.into(),
            subtotal: order.subtotal,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderResponse {
    pub message: String,
    pub order: OrderResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_frontend_payload() {
        let body = r#"{
            "userId": "u1",
            "userDetails": {"fullName": "Kamal", "postalCode": "20000"},
            "items": [{"fruitId": "f1", "name": "Mango", "grade": "A", "price": 100, "quantity": 2}],
            "payment": {"method": "card", "cardLast4": "4242"},
            "shipping": {"method": "express"},
            "subtotal": 200,
            "total": 700
        }"#;
        let request: CreateOrderRequest = serde_json::from_str(body).unwrap();

        assert_eq!(request.user_id.as_deref(), Some("u1"));
        assert_eq!(request.items[0].grade, Grade::A);
        assert_eq!(request.items[0].price, 100.0);
        let details = request.user_details.unwrap();
        assert_eq!(details.postal_code.as_deref(), Some("20000"));
        let payment = request.payment.unwrap();
        assert_eq!(payment.card_last4.as_deref(), Some("4242"));
        assert!(payment.status.is_none());
    }

    #[test]
    fn missing_items_deserialize_as_empty() {
        let request: CreateOrderRequest = serde_json::from_str(r#"{"userId": "u1"}"#).unwrap();
        assert!(request.items.is_empty());
    }
}
