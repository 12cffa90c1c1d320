pub mod advisory;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod telemetry;
