pub mod password;
pub mod upload;
pub mod validation;

pub use password::{hash_password, verify_password, Password};
pub use upload::{FruitForm, ImageUpload};
pub use validation::{JsonBody, ValidatedJson};

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a client date: RFC 3339, or a plain `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_client_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
