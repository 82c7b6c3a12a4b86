pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{CsvExportSink, RecalculationPipeline, RecalculationReport, RestaurantService, Strategy};
pub use error::{ServiceError, StoreError};
pub use infra::AppConfig;
pub use storage::{MemoryStore, PgRestaurantStore, RestaurantStore};
