use crate::models::{CartItem, Grade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: Option<String>,
    pub fruit_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub fruit_id: String,
    pub quantity: i64,
    pub name: String,
    pub grade: Grade,
    pub image_url: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            user_id: item.user_id,
            fruit_id: item.fruit_id,
            quantity: item.quantity,
            name: item.name,
            grade: item.grade,
            image_url: item.image_url,
            price: item.price,
            created_at: item.created_at,
        }
    }
}
