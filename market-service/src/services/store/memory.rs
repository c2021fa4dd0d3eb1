use super::{FruitFilter, FruitOrder, MarketStore};
use crate::models::{CartItem, Fruit, FruitStatus, Order, OrderStatus, Role, User};
use async_trait::async_trait;
use service_core::error::AppError;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    fruits: Vec<Fruit>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
}

/// In-process store. Records are kept in insertion order so that "newest
/// first" stays stable when timestamps collide.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(
    records: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
) -> Vec<T> {
    let mut found: Vec<T> = records.iter().rev().filter(|r| keep(r)).cloned().collect();
    found.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    found
}

fn replace_where<T>(records: &mut [T], matches: impl Fn(&T) -> bool, value: &T) -> bool
where
    T: Clone,
{
    match records.iter_mut().find(|r| matches(r)) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

fn remove_where<T>(records: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> u64 {
    let before = records.len();
    records.retain(|r| !matches(r));
    (before - records.len()) as u64
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }
        data.users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = User::normalize_email(email);
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn count_users_by_role(&self, role: Role) -> Result<u64, AppError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().filter(|u| u.role == role).count() as u64)
    }

    async fn insert_fruit(&self, fruit: &Fruit) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        if data.fruits.iter().any(|f| f.id == fruit.id) {
            return Err(AppError::Conflict(anyhow::anyhow!("Fruit already exists")));
        }
        data.fruits.push(fruit.clone());
        Ok(())
    }

    async fn get_fruit(&self, id: &str) -> Result<Option<Fruit>, AppError> {
        let data = self.inner.read().await;
        Ok(data.fruits.iter().find(|f| f.id == id).cloned())
    }

    async fn list_fruits(
        &self,
        filter: &FruitFilter,
        order: FruitOrder,
    ) -> Result<Vec<Fruit>, AppError> {
        let data = self.inner.read().await;
        let mut fruits = newest_first(&data.fruits, |f| filter.matches(f), |f| f.created_at);
        if order == FruitOrder::GradeAsc {
            fruits.sort_by_key(|f| f.grade);
        }
        Ok(fruits)
    }

    async fn count_fruits_by_status(&self, status: FruitStatus) -> Result<u64, AppError> {
        let data = self.inner.read().await;
        Ok(data.fruits.iter().filter(|f| f.status == status).count() as u64)
    }

    async fn replace_fruit(&self, fruit: &Fruit) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        Ok(replace_where(&mut data.fruits, |f| f.id == fruit.id, fruit))
    }

    async fn delete_fruit(&self, id: &str) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        Ok(remove_where(&mut data.fruits, |f| f.id == id) > 0)
    }

    async fn decrement_fruit_quantity(&self, id: &str, amount: i64) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        match data.fruits.iter_mut().find(|f| f.id == id) {
            Some(fruit) => {
                fruit.quantity = (fruit.quantity - amount).max(0);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_cart_item(
        &self,
        user_id: &str,
        fruit_id: &str,
    ) -> Result<Option<CartItem>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .cart_items
            .iter()
            .find(|c| c.user_id == user_id && c.fruit_id == fruit_id)
            .cloned())
    }

    async fn get_cart_item(&self, id: &str) -> Result<Option<CartItem>, AppError> {
        let data = self.inner.read().await;
        Ok(data.cart_items.iter().find(|c| c.id == id).cloned())
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartItem>, AppError> {
        let data = self.inner.read().await;
        Ok(newest_first(
            &data.cart_items,
            |c| c.user_id == user_id,
            |c| c.created_at,
        ))
    }

    async fn upsert_cart_item(&self, item: &CartItem) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        if !replace_where(&mut data.cart_items, |c| c.id == item.id, item) {
            data.cart_items.push(item.clone());
        }
        Ok(())
    }

    async fn delete_cart_item(&self, id: &str) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        Ok(remove_where(&mut data.cart_items, |c| c.id == id) > 0)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<u64, AppError> {
        let mut data = self.inner.write().await;
        Ok(remove_where(&mut data.cart_items, |c| c.user_id == user_id))
    }

    async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        if data.orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(AppError::Conflict(anyhow::anyhow!("Order already exists")));
        }
        data.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        let data = self.inner.read().await;
        Ok(data.orders.iter().find(|o| o.order_id == order_id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        let data = self.inner.read().await;
        Ok(newest_first(
            &data.orders,
            |o| o.user_id == user_id,
            |o| o.created_at,
        ))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        let data = self.inner.read().await;
        Ok(newest_first(&data.orders, |_| true, |o| o.created_at))
    }

    async fn count_orders_by_status(&self, status: OrderStatus) -> Result<u64, AppError> {
        let data = self.inner.read().await;
        Ok(data.orders.iter().filter(|o| o.status == status).count() as u64)
    }

    async fn replace_order(&self, order: &Order) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        Ok(replace_where(
            &mut data.orders,
            |o| o.order_id == order.order_id,
            order,
        ))
    }

    async fn delete_order(&self, order_id: &str) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        Ok(remove_where(&mut data.orders, |o| o.order_id == order_id) > 0)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
