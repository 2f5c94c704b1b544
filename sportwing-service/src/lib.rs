pub mod app;
pub mod booking_handlers;
pub mod class_handlers;
pub mod config;
pub mod gateway;
pub mod guards;
pub mod memory_store;
pub mod metrics;
pub mod models;
pub mod payment_handlers;
pub mod pg_store;
pub mod repo;
pub mod store;
pub mod token_handlers;
pub mod user_handlers;

pub use app::{router, AppState};
