//! Rating recalculation: recompute every restaurant's overall rating and review
//! count, persist them, then export the result as CSV.
//!
//! Two strategies produce the same numbers:
//! * `Workers` fans out one task per restaurant through a bounded pool.
//! * `Bulk` issues two set-based statements and reads the result back.

use crate::app::export::CsvExportSink;
use crate::domain::{aggregate_labels, overall_rating, RestaurantRating};
use crate::error::{Result, ServiceError, StoreError};
use crate::storage::{RestaurantStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use utoipa::ToSchema;

pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Workers,
    Bulk,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Workers => "workers",
            Strategy::Bulk => "bulk",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workers" => Ok(Strategy::Workers),
            "bulk" => Ok(Strategy::Bulk),
            other => Err(format!("unknown strategy '{other}', expected 'workers' or 'bulk'")),
        }
    }
}

/// Outcome of one recalculation run.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecalculationReport {
    pub strategy: Strategy,
    /// Restaurants known when the run started.
    pub seen: usize,
    pub updated: usize,
    /// Restaurants skipped because aggregation or persistence failed.
    pub failed: usize,
    /// `None` when the export could not be written.
    pub export_path: Option<String>,
    pub elapsed_ms: u64,
}

/// Recomputes and persists one restaurant.
async fn recalculate_one(
    store: &dyn RestaurantStore,
    restaurant_id: &str,
) -> StoreResult<RestaurantRating> {
    let stats = store.fetch_labeled_review_stats(restaurant_id).await?;
    let review_count = store.count_reviews(restaurant_id).await?;
    let rating = overall_rating(&aggregate_labels(&stats));
    store
        .persist_restaurant_rating(restaurant_id, rating, review_count)
        .await?;
    Ok(RestaurantRating::new(restaurant_id, rating, review_count))
}

pub struct RecalculationPipeline {
    store: Arc<dyn RestaurantStore>,
    sink: CsvExportSink,
    workers: usize,
}

impl RecalculationPipeline {
    /// A worker count of 0 is treated as 1.
    pub fn new(store: Arc<dyn RestaurantStore>, sink: CsvExportSink, workers: usize) -> Self {
        Self {
            store,
            sink,
            workers: workers.max(1),
        }
    }

    pub async fn run(&self, strategy: Strategy) -> Result<RecalculationReport> {
        let started = Instant::now();
        info!(strategy = %strategy, workers = self.workers, "Starting rating recalculation");

        let (seen, updated, failed, rows) = match strategy {
            Strategy::Workers => self.run_workers().await?,
            Strategy::Bulk => self.run_bulk().await?,
        };
        let export_path = self.export(&rows).await;

        let report = RecalculationReport {
            strategy,
            seen,
            updated,
            failed,
            export_path,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            strategy = %strategy,
            seen = report.seen,
            updated = report.updated,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "Rating recalculation finished"
        );
        Ok(report)
    }

    async fn run_workers(&self) -> Result<(usize, usize, usize, Vec<RestaurantRating>)> {
        let targets = self.store.fetch_restaurant_ratings().await.map_err(|e| {
            error!(error = %e, "Failed to enumerate restaurants");
            ServiceError::Storage(e)
        })?;
        let seen = targets.len();

        let semaphore = Arc::new(Semaphore::new(self.workers));
        // Sized to the restaurant count so no worker ever blocks on send.
        let (tx, mut rx) = mpsc::channel::<RestaurantRating>(seen.max(1));
        let mut tasks = JoinSet::new();

        for target in targets {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ServiceError::Storage(StoreError::Backend(e.to_string())))?;
            let store = Arc::clone(&self.store);
            let tx = tx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let id = target.restaurant_id;
                match recalculate_one(store.as_ref(), &id).await {
                    Ok(row) => tx.send(row).await.is_ok(),
                    Err(e) => {
                        warn!(restaurant_id = %id, error = %e, "Skipping restaurant");
                        false
                    }
                }
            });
        }
        drop(tx);

        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    error!(error = %e, "Recalculation worker panicked");
                    failed += 1;
                }
            }
        }

        let mut rows = Vec::with_capacity(seen);
        while let Some(row) = rx.recv().await {
            rows.push(row);
        }
        rows.sort_by(|a, b| a.restaurant_id.cmp(&b.restaurant_id));

        Ok((seen, rows.len(), failed, rows))
    }

    async fn run_bulk(&self) -> Result<(usize, usize, usize, Vec<RestaurantRating>)> {
        let counted = self.store.bulk_recompute_review_counts().await?;
        info!(rows = counted, "Review counts recomputed");
        let rated = self.store.bulk_recompute_ratings().await?;
        info!(rows = rated, "Ratings recomputed");

        let rows = self.store.fetch_restaurant_ratings().await?;
        Ok((rows.len(), rated as usize, 0, rows))
    }

    async fn export(&self, rows: &[RestaurantRating]) -> Option<String> {
        match self.sink.write(rows).await {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                error!(path = %self.sink.path().display(), error = %e, "Failed to write rating export");
                None
            }
        }
    }

    /// Runs `strategy` every `every` until `shutdown` is notified.
    ///
    /// The first run happens one full interval after spawn. Use `notify_one`
    /// to stop it so a signal sent mid-run is not lost.
    pub fn spawn_periodic(
        self: Arc<Self>,
        every: Duration,
        strategy: Strategy,
        shutdown: Arc<Notify>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(every);
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if let Err(e) = self.run(strategy).await {
                            error!(strategy = %strategy, error = %e, "Periodic recalculation failed");
                        }
                    }
                    _ = shutdown.notified() => {
                        info!("Periodic recalculation task shutting down");
                        break;
                    }
                }
            }
        })
    }
}
