use super::{Fruit, Grade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a user's cart. Name, grade, image and price are copied from
/// the fruit when the line is created so the cart renders without joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub fruit_id: String,
    pub quantity: i64,
    pub name: String,
    pub grade: Grade,
    pub image_url: Option<String>,
    pub price: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn snapshot(user_id: String, fruit: &Fruit, quantity: i64) -> Self {
        Self {
            id: super::new_record_id(),
            user_id,
            fruit_id: fruit.id.clone(),
            quantity,
            name: fruit.name.clone(),
            grade: fruit.grade,
            image_url: fruit.image_url.clone(),
            price: fruit.price,
            created_at: Utc::now(),
        }
    }
}
