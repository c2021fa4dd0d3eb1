use crate::models::{Fruit, FruitStatus, Grade, QualityScores};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FruitResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub variety: String,
    pub collection_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub collector_id: String,
    pub image_url: Option<String>,
    pub grade: Grade,
    pub scores: QualityScores,
    pub status: FruitStatus,
    pub price: f64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Fruit> for FruitResponse {
    fn from(fruit: Fruit) -> Self {
        Self {
            id: fruit.id,
            name: fruit.name,
            variety: fruit.variety,
            collection_date: fruit.collection_date,
            expiry_date: fruit.expiry_date,
            collector_id: fruit.collector_id,
            image_url: fruit.image_url,
            grade: fruit.grade,
            scores: fruit.scores,
            status: fruit.status,
            price: fruit.price,
            quantity: fruit.quantity,
            created_at: fruit.created_at,
        }
    }
}

pub fn fruit_list(fruits: Vec<Fruit>) -> Vec<FruitResponse> {
    fruits.into_iter().map(FruitResponse::from).collect()
}

/// Partial fruit update. `expiryDate: null` clears the expiry date.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFruitRequest {
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub status: Option<FruitStatus>,
    #[serde(default, deserialize_with = "super::explicit_null")]
    pub expiry_date: Option<Option<String>>,
}
