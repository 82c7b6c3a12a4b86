//! CSV snapshot of every restaurant's rating, written after a recalculation run.

use crate::domain::RestaurantRating;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXPORT_PATH: &str = "/tmp/restaurant_ratings.csv";

const HEADER: &str = "restaurant_id,restaurant_rating,review_count";

/// Renders the export buffer. Ratings always carry two decimals.
pub fn render_csv(rows: &[RestaurantRating]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + rows.len() * 24);
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{},{:.2},{}", row.restaurant_id, row.rating, row.review_count);
    }
    out
}

/// Writes the export to a fixed path.
///
/// The buffer lands in a sibling temp file first and is then renamed over the
/// target, so readers see either the previous export or the new one.
#[derive(Debug, Clone)]
pub struct CsvExportSink {
    path: PathBuf,
}

impl CsvExportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "export".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    pub async fn write(&self, rows: &[RestaurantRating]) -> std::io::Result<PathBuf> {
        let buffer = render_csv(rows);
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, buffer.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        tracing::info!(path = %self.path.display(), rows = rows.len(), "Rating export written");
        Ok(self.path.clone())
    }
}

impl Default for CsvExportSink {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_PATH)
    }
}
