// Core modules
pub mod advisor;
pub mod alert;
pub mod api;
pub mod config;
pub mod cycle;
pub mod data;
pub mod db;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use config::Config;
pub use models::*;
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
