pub mod config;
pub mod observability;
pub mod health;
pub mod protocol;
pub mod handlers;
pub mod error;
pub mod store;
pub mod router;
