pub mod config;
pub mod error;
pub mod monitoring;
pub mod simulation;
pub mod telemetry;
