use super::Grade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    #[default]
    Processing,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Canceled orders do not count towards revenue.
    pub fn counts_as_revenue(&self) -> bool {
        *self != OrderStatus::Canceled
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(format!("Invalid order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShippingStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl UserDetails {
    /// Overwrite every field that `patch` provides.
    pub fn merge(&mut self, patch: UserDetails) {
        merge_field(&mut self.full_name, patch.full_name);
        merge_field(&mut self.email, patch.email);
        merge_field(&mut self.phone, patch.phone);
        merge_field(&mut self.address, patch.address);
        merge_field(&mut self.city, patch.city);
        merge_field(&mut self.postal_code, patch.postal_code);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub fruit_id: String,
    pub name: String,
    pub grade: Grade,
    pub image_url: Option<String>,
    pub price: f64,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: Option<String>,
    pub card_last4: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentPatch {
    pub method: Option<String>,
    pub card_last4: Option<String>,
    pub status: Option<PaymentStatus>,
}

impl Payment {
    pub fn merge(&mut self, patch: PaymentPatch) {
        merge_field(&mut self.method, patch.method);
        merge_field(&mut self.card_last4, patch.card_last4);
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipping {
    pub method: String,
    pub cost: f64,
    pub status: ShippingStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingPatch {
    pub method: Option<String>,
    pub cost: Option<f64>,
    pub status: Option<ShippingStatus>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl Shipping {
    pub fn merge(&mut self, patch: ShippingPatch) {
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        merge_field(&mut self.estimated_delivery, patch.estimated_delivery);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub user_details: UserDetails,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
    pub shipping: Shipping,
    pub subtotal: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

fn merge_field<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}
