pub mod types;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod engine;
pub mod agents;
pub mod factory;
pub mod storage;
pub mod providers;
pub mod tools;
pub mod config;
pub mod api;

pub use config::Config;
pub use error::OrchestrationError;
pub use types::*;
