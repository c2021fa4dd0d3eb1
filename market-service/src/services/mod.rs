pub mod checkout;
pub mod grading;
pub mod inventory;
pub mod jwt;
pub mod metrics;
pub mod storage;
pub mod store;

pub use grading::{FruitGrader, GradeReport, GradingError, HttpGrader};
pub use jwt::{Claims, JwtService};
pub use storage::{LocalStorage, Storage};
pub use store::{FruitFilter, FruitOrder, MarketStore, MemoryStore, MongoStore};
