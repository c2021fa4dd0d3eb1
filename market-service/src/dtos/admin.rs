use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminStatsResponse {
    pub message: String,
    pub stats: MarketStats,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MarketStats {
    /// Registered users per role.
    pub users: BTreeMap<String, u64>,
    /// Fruit records per status.
    pub fruits: BTreeMap<String, u64>,
    /// Orders per status.
    pub orders: BTreeMap<String, u64>,
    /// Sum of order totals, canceled orders excluded.
    pub revenue: f64,
}
