//! Inventory screen queries: search, stock filters, sorting and counters.

use crate::dtos::inventory::{InventoryQuery, InventoryStats};
use crate::models::{Fruit, Grade};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFilter {
    Low,
    Out,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    Grade,
    Price,
    Quantity,
    Expiry,
    #[default]
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryCriteria {
    pub search: Option<String>,
    pub grade: Option<Grade>,
    pub stock: Option<StockFilter>,
    pub threshold: i64,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl InventoryCriteria {
    pub fn from_query(query: &InventoryQuery, default_threshold: i64) -> Result<Self, AppError> {
        let grade = match non_blank(&query.grade) {
            Some(value) => Some(value.parse::<Grade>().map_err(AppError::bad_request)?),
            None => None,
        };

        let stock = match non_blank(&query.stock).map(|s| s.to_lowercase()).as_deref() {
            None => None,
            Some("low") => Some(StockFilter::Low),
            Some("out") => Some(StockFilter::Out),
            Some("expired") => Some(StockFilter::Expired),
            Some(other) => {
                return Err(AppError::bad_request(format!("Invalid stock filter: {}", other)))
            }
        };

        let sort = match non_blank(&query.sort).map(|s| s.to_lowercase()).as_deref() {
            None | Some("created") | Some("date") => SortKey::Created,
            Some("name") => SortKey::Name,
            Some("grade") => SortKey::Grade,
            Some("price") => SortKey::Price,
            Some("quantity") => SortKey::Quantity,
            Some("expiry") => SortKey::Expiry,
            Some(other) => return Err(AppError::bad_request(format!("Invalid sort key: {}", other))),
        };

        let order = match non_blank(&query.order).map(|s| s.to_lowercase()).as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => {
                return Err(AppError::bad_request(format!("Invalid sort order: {}", other)))
            }
        };

        Ok(Self {
            search: non_blank(&query.search).map(|s| s.to_lowercase()),
            grade,
            stock,
            threshold: query.threshold.unwrap_or(default_threshold),
            sort,
            order,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_low_stock(fruit: &Fruit, threshold: i64) -> bool {
    fruit.quantity > 0 && fruit.quantity <= threshold
}

pub fn is_out_of_stock(fruit: &Fruit) -> bool {
    fruit.quantity <= 0
}

fn matches(fruit: &Fruit, criteria: &InventoryCriteria, now: DateTime<Utc>) -> bool {
    if let Some(term) = &criteria.search {
        let hit = fruit.name.to_lowercase().contains(term)
            || fruit.variety.to_lowercase().contains(term);
        if !hit {
            return false;
        }
    }
    if criteria.grade.is_some_and(|grade| fruit.grade != grade) {
        return false;
    }
    match criteria.stock {
        Some(StockFilter::Low) => is_low_stock(fruit, criteria.threshold),
        Some(StockFilter::Out) => is_out_of_stock(fruit),
        Some(StockFilter::Expired) => fruit.is_expired_at(now),
        None => true,
    }
}

fn compare(a: &Fruit, b: &Fruit, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Grade => a.grade.cmp(&b.grade),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Quantity => a.quantity.cmp(&b.quantity),
        SortKey::Expiry => a.expiry_date.cmp(&b.expiry_date),
        SortKey::Created => a.created_at.cmp(&b.created_at),
    }
}

/// Filter and sort. Fruits without an expiry date sort last by expiry in
/// either direction.
pub fn apply(fruits: Vec<Fruit>, criteria: &InventoryCriteria, now: DateTime<Utc>) -> Vec<Fruit> {
    let mut selected: Vec<Fruit> = fruits
        .into_iter()
        .filter(|fruit| matches(fruit, criteria, now))
        .collect();

    selected.sort_by(|a, b| {
        if criteria.sort == SortKey::Expiry {
            match (a.expiry_date.is_some(), b.expiry_date.is_some()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
        let ordering = compare(a, b, criteria.sort);
        match criteria.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    selected
}

pub fn stats(fruits: &[Fruit], threshold: i64, now: DateTime<Utc>) -> InventoryStats {
    InventoryStats {
        total: fruits.len(),
        low_stock: fruits.iter().filter(|f| is_low_stock(f, threshold)).count(),
        out_of_stock: fruits.iter().filter(|f| is_out_of_stock(f)).count(),
        expired: fruits.iter().filter(|f| f.is_expired_at(now)).count(),
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fruit(name: &str, grade: Grade, price: f64, quantity: i64, expiry_days: Option<i64>) -> Fruit {
        let now = Utc::now();
        Fruit::manual(
            name.to_string(),
            "collector".to_string(),
            format!("/uploads/{}.png", name),
            grade,
            price,
            quantity,
            expiry_days.map(|days| now + Duration::days(days)),
        )
    }

    fn criteria(query: InventoryQuery) -> InventoryCriteria {
        InventoryCriteria::from_query(&query, 50).unwrap()
    }

    fn names(fruits: &[Fruit]) -> Vec<&str> {
        fruits.iter().map(|f| f.name.as_str()).collect()
    }

    fn sample() -> Vec<Fruit> {
        vec![
            fruit("Mango", Grade::A, 200.0, 120, Some(10)),
            fruit("Banana", Grade::B, 50.0, 20, Some(-1)),
            fruit("Papaya", Grade::C, 90.0, 0, None),
            fruit("Mangosteen", Grade::A, 300.0, 50, Some(3)),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let found = apply(
            sample(),
            &criteria(InventoryQuery {
                search: Some("MANGO".to_string()),
                sort: Some("name".to_string()),
                order: Some("asc".to_string()),
                ..Default::default()
            }),
            Utc::now(),
        );
        assert_eq!(names(&found), vec!["Mango", "Mangosteen"]);
    }

    #[test]
    fn stock_filters_follow_threshold() {
        let now = Utc::now();
        let low = apply(
            sample(),
            &criteria(InventoryQuery {
                stock: Some("low".to_string()),
                sort: Some("name".to_string()),
                order: Some("asc".to_string()),
                ..Default::default()
            }),
            now,
        );
        assert_eq!(names(&low), vec!["Banana", "Mangosteen"]);

        let out = apply(
            sample(),
            &criteria(InventoryQuery {
                stock: Some("out".to_string()),
                ..Default::default()
            }),
            now,
        );
        assert_eq!(names(&out), vec!["Papaya"]);

        let expired = apply(
            sample(),
            &criteria(InventoryQuery {
                stock: Some("expired".to_string()),
                ..Default::default()
            }),
            now,
        );
        assert_eq!(names(&expired), vec!["Banana"]);
    }

    #[test]
    fn expiry_sort_puts_missing_dates_last_both_ways() {
        let now = Utc::now();
        let asc = apply(
            sample(),
            &criteria(InventoryQuery {
                sort: Some("expiry".to_string()),
                order: Some("asc".to_string()),
                ..Default::default()
            }),
            now,
        );
        assert_eq!(names(&asc), vec!["Banana", "Mangosteen", "Mango", "Papaya"]);

        let desc = apply(
            sample(),
            &criteria(InventoryQuery {
                sort: Some("expiry".to_string()),
                order: Some("desc".to_string()),
                ..Default::default()
            }),
            now,
        );
        assert_eq!(names(&desc), vec!["Mango", "Mangosteen", "Banana", "Papaya"]);
    }

    #[test]
    fn price_sort_descending() {
        let sorted = apply(
            sample(),
            &criteria(InventoryQuery {
                sort: Some("price".to_string()),
                ..Default::default()
            }),
            Utc::now(),
        );
        assert_eq!(names(&sorted), vec!["Mangosteen", "Mango", "Papaya", "Banana"]);
    }

    #[test]
    fn stats_count_each_bucket() {
        let stats = stats(&sample(), 50, Utc::now());
        assert_eq!(
            stats,
            InventoryStats {
                total: 4,
                low_stock: 2,
                out_of_stock: 1,
                expired: 1,
                threshold: 50,
            }
        );
    }

    #[test]
    fn unknown_query_values_are_rejected() {
        for query in [
            InventoryQuery {
                grade: Some("Z".to_string()),
                ..Default::default()
            },
            InventoryQuery {
                stock: Some("plenty".to_string()),
                ..Default::default()
            },
            InventoryQuery {
                sort: Some("colour".to_string()),
                ..Default::default()
            },
            InventoryQuery {
                order: Some("up".to_string()),
                ..Default::default()
            },
        ] {
            let err = InventoryCriteria::from_query(&query, 50).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }
}
