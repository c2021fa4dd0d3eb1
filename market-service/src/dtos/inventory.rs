use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub search: Option<String>,
    pub grade: Option<String>,
    pub stock: Option<String>,
    pub threshold: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub expired: usize,
    pub threshold: i64,
}
