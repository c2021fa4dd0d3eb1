//! Persistence seam for users, fruits, cart items and orders.
//!
//! `MongoStore` backs production; `MemoryStore` keeps the same observable
//! behaviour in process for local runs and tests.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::models::{CartItem, Fruit, FruitStatus, Grade, Order, OrderStatus, Role, User};
use async_trait::async_trait;
use service_core::error::AppError;

/// Fruit list criteria. Empty criteria match every fruit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FruitFilter {
    pub grades: Option<Vec<Grade>>,
    pub status: Option<FruitStatus>,
    /// Only fruits with quantity above zero.
    pub in_stock: bool,
}

impl FruitFilter {
    pub fn grade(grade: Grade) -> Self {
        Self {
            grades: Some(vec![grade]),
            ..Default::default()
        }
    }

    pub fn status(status: FruitStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn matches(&self, fruit: &Fruit) -> bool {
        if let Some(grades) = &self.grades {
            if !grades.contains(&fruit.grade) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if fruit.status != status {
                return false;
            }
        }
        !self.in_stock || fruit.quantity > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FruitOrder {
    #[default]
    NewestFirst,
    /// Best grade first, newest first within a grade.
    GradeAsc,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Fails with `AppError::Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn count_users_by_role(&self, role: Role) -> Result<u64, AppError>;

    async fn insert_fruit(&self, fruit: &Fruit) -> Result<(), AppError>;
    async fn get_fruit(&self, id: &str) -> Result<Option<Fruit>, AppError>;
    async fn list_fruits(
        &self,
        filter: &FruitFilter,
        order: FruitOrder,
    ) -> Result<Vec<Fruit>, AppError>;
    async fn count_fruits_by_status(&self, status: FruitStatus) -> Result<u64, AppError>;
    /// Returns false when no fruit has that id.
    async fn replace_fruit(&self, fruit: &Fruit) -> Result<bool, AppError>;
    async fn delete_fruit(&self, id: &str) -> Result<bool, AppError>;
    /// Atomically lowers the quantity by `amount`, never below zero.
    /// Returns false when no fruit has that id.
    async fn decrement_fruit_quantity(&self, id: &str, amount: i64) -> Result<bool, AppError>;

    async fn find_cart_item(
        &self,
        user_id: &str,
        fruit_id: &str,
    ) -> Result<Option<CartItem>, AppError>;
    async fn get_cart_item(&self, id: &str) -> Result<Option<CartItem>, AppError>;
    /// Newest first.
    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartItem>, AppError>;
    async fn upsert_cart_item(&self, item: &CartItem) -> Result<(), AppError>;
    async fn delete_cart_item(&self, id: &str) -> Result<bool, AppError>;
    /// Returns the number of lines removed.
    async fn clear_cart(&self, user_id: &str) -> Result<u64, AppError>;

    /// Fails with `AppError::Conflict` when the order id is taken.
    async fn insert_order(&self, order: &Order) -> Result<(), AppError>;
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, AppError>;
    /// Newest first.
    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError>;
    /// Newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, AppError>;
    async fn count_orders_by_status(&self, status: OrderStatus) -> Result<u64, AppError>;
    async fn replace_order(&self, order: &Order) -> Result<bool, AppError>;
    async fn delete_order(&self, order_id: &str) -> Result<bool, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
