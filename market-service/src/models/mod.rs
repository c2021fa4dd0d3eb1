mod cart;
mod fruit;
mod order;
mod user;

pub use cart::CartItem;
pub use fruit::{Fruit, FruitStatus, Grade, QualityScores};
pub use order::{
    Order, OrderItem, OrderStatus, Payment, PaymentPatch, PaymentStatus, Shipping, ShippingPatch,
    ShippingStatus, UserDetails,
};
pub use user::{Role, User};

/// New record ids use the Mongo ObjectId hex format so they look the same
/// whichever store produced them.
pub fn new_record_id() -> String {
    mongodb::bson::oid::ObjectId::new().to_hex()
}

// Optional chrono DateTime stored as a BSON date
pub(crate) mod opt_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<bson::DateTime>::deserialize(deserializer)?;
        Ok(value.map(|dt| dt.to_chrono()))
    }
}
