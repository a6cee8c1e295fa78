pub mod broadcast;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod relay;
pub mod state;
pub mod telemetry;
pub mod upstream;
