pub mod config;
pub mod db;
pub mod telemetry;

pub use config::AppConfig;
