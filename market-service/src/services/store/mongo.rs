use super::{FruitFilter, FruitOrder, MarketStore};
use crate::models::{CartItem, Fruit, FruitStatus, Order, OrderStatus, Role, User};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for market-service");

        create_index(&self.users(), doc! { "email": 1 }, "email_unique", true).await?;
        create_index(&self.orders(), doc! { "order_id": 1 }, "order_id_unique", true).await?;
        create_index(&self.orders(), doc! { "user_id": 1, "created_at": -1 }, "user_orders", false)
            .await?;
        create_index(
            &self.cart_items(),
            doc! { "user_id": 1, "fruit_id": 1 },
            "user_fruit_lookup",
            false,
        )
        .await?;
        create_index(&self.fruits(), doc! { "created_at": -1 }, "newest_first", false).await?;
        create_index(&self.fruits(), doc! { "grade": 1, "status": 1 }, "grade_status", false)
            .await?;

        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn fruits(&self) -> Collection<Fruit> {
        self.db.collection("fruits")
    }

    fn cart_items(&self) -> Collection<CartItem> {
        self.db.collection("cart_items")
    }

    fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }
}

async fn create_index<T>(
    collection: &Collection<T>,
    keys: Document,
    name: &str,
    unique: bool,
) -> Result<(), AppError> {
    let model = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(unique)
                .build(),
        )
        .build();

    collection.create_index(model, None).await.map_err(|e| {
        tracing::error!(
            "Failed to create index {} on {}: {}",
            name,
            collection.name(),
            e
        );
        AppError::from(e)
    })?;
    tracing::info!(collection = %collection.name(), index = %name, "Created index");
    Ok(())
}

/// Duplicate-key write errors become `Conflict`; anything else is a database error.
fn map_write_error(err: mongodb::error::Error, what: &str) -> AppError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY {
            return AppError::Conflict(anyhow::anyhow!("{} already exists", what));
        }
    }
    AppError::from(err)
}

async fn find_all<T>(
    collection: &Collection<T>,
    filter: Document,
    sort: Document,
) -> Result<Vec<T>, AppError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).build();
    let cursor = collection.find(filter, options).await?;
    let items: Vec<T> = cursor.try_collect().await?;
    Ok(items)
}

fn fruit_filter_document(filter: &FruitFilter) -> Result<Document, AppError> {
    let mut query = Document::new();
    if let Some(grades) = &filter.grades {
        query.insert("grade", doc! { "$in": bson::to_bson(grades)? });
    }
    if let Some(status) = filter.status {
        query.insert("status", bson::to_bson(&status)?);
    }
    if filter.in_stock {
        query.insert("quantity", doc! { "$gt": 0 });
    }
    Ok(query)
}

#[async_trait]
impl MarketStore for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(|e| map_write_error(e, "User"))?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = User::normalize_email(email);
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn count_users_by_role(&self, role: Role) -> Result<u64, AppError> {
        let filter = doc! { "role": role.as_str() };
        Ok(self.users().count_documents(filter, None).await?)
    }

    async fn insert_fruit(&self, fruit: &Fruit) -> Result<(), AppError> {
        self.fruits()
            .insert_one(fruit, None)
            .await
            .map_err(|e| map_write_error(e, "Fruit"))?;
        Ok(())
    }

    async fn get_fruit(&self, id: &str) -> Result<Option<Fruit>, AppError> {
        Ok(self.fruits().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_fruits(
        &self,
        filter: &FruitFilter,
        order: FruitOrder,
    ) -> Result<Vec<Fruit>, AppError> {
        let sort = match order {
            FruitOrder::NewestFirst => doc! { "created_at": -1 },
            FruitOrder::GradeAsc => doc! { "grade": 1, "created_at": -1 },
        };
        find_all(&self.fruits(), fruit_filter_document(filter)?, sort).await
    }

    async fn count_fruits_by_status(&self, status: FruitStatus) -> Result<u64, AppError> {
        let filter = doc! { "status": status.as_str() };
        Ok(self.fruits().count_documents(filter, None).await?)
    }

    async fn replace_fruit(&self, fruit: &Fruit) -> Result<bool, AppError> {
        let result = self
            .fruits()
            .replace_one(doc! { "_id": &fruit.id }, fruit, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_fruit(&self, id: &str) -> Result<bool, AppError> {
        let result = self.fruits().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn decrement_fruit_quantity(&self, id: &str, amount: i64) -> Result<bool, AppError> {
        // Pipeline update so the clamp happens server side in one write
        let pipeline = vec![doc! {
            "$set": {
                "quantity": { "$max": [0_i64, { "$subtract": ["$quantity", amount] }] }
            }
        }];
        let result = self
            .fruits()
            .update_one(doc! { "_id": id }, pipeline, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn find_cart_item(
        &self,
        user_id: &str,
        fruit_id: &str,
    ) -> Result<Option<CartItem>, AppError> {
        let filter = doc! { "user_id": user_id, "fruit_id": fruit_id };
        Ok(self.cart_items().find_one(filter, None).await?)
    }

    async fn get_cart_item(&self, id: &str) -> Result<Option<CartItem>, AppError> {
        Ok(self.cart_items().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartItem>, AppError> {
        find_all(
            &self.cart_items(),
            doc! { "user_id": user_id },
            doc! { "created_at": -1 },
        )
        .await
    }

    async fn upsert_cart_item(&self, item: &CartItem) -> Result<(), AppError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.cart_items()
            .replace_one(doc! { "_id": &item.id }, item, options)
            .await?;
        Ok(())
    }

    async fn delete_cart_item(&self, id: &str) -> Result<bool, AppError> {
        let result = self.cart_items().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<u64, AppError> {
        let result = self
            .cart_items()
            .delete_many(doc! { "user_id": user_id }, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders()
            .insert_one(order, None)
            .await
            .map_err(|e| map_write_error(e, "Order"))?;
        Ok(())
    }

    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        Ok(self
            .orders()
            .find_one(doc! { "order_id": order_id }, None)
            .await?)
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        find_all(
            &self.orders(),
            doc! { "user_id": user_id },
            doc! { "created_at": -1 },
        )
        .await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        find_all(&self.orders(), Document::new(), doc! { "created_at": -1 }).await
    }

    async fn count_orders_by_status(&self, status: OrderStatus) -> Result<u64, AppError> {
        let filter = doc! { "status": status.as_str() };
        Ok(self.orders().count_documents(filter, None).await?)
    }

    async fn replace_order(&self, order: &Order) -> Result<bool, AppError> {
        let result = self
            .orders()
            .replace_one(doc! { "order_id": &order.order_id }, order, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_order(&self, order_id: &str) -> Result<bool, AppError> {
        let result = self
            .orders()
            .delete_one(doc! { "order_id": order_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
