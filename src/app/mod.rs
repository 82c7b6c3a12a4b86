pub mod export;
pub mod recalculate;
pub mod service;

pub use export::CsvExportSink;
pub use recalculate::{RecalculationPipeline, RecalculationReport, Strategy};
pub use service::RestaurantService;
