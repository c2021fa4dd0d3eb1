pub mod admin;
pub mod auth;
pub mod cart;
pub mod fruits;
pub mod health;
pub mod inventory;
pub mod orders;
