pub mod accounts;
pub mod config;
pub mod error;
pub mod listings;
pub mod router;
pub mod store;
pub mod telemetry;
