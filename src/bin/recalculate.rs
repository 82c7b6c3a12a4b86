use restaurant_discovery::infra::{db, telemetry};
use restaurant_discovery::{
    AppConfig, CsvExportSink, PgRestaurantStore, RecalculationPipeline, RestaurantStore, Strategy,
};
use std::path::PathBuf;
use std::sync::Arc;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin recalculate -- [--bulk] [--workers N] [--export PATH]\n\
         \n\
         Recomputes every restaurant's rating and review count, then writes\n\
         the CSV export.\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL\n\
         Optional:\n\
           RECALC_WORKERS (default 10), EXPORT_PATH (default /tmp/restaurant_ratings.csv)\n"
    );
    std::process::exit(2);
}

struct Args {
    strategy: Strategy,
    workers: Option<usize>,
    export: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut out = Args {
        strategy: Strategy::Workers,
        workers: None,
        export: None,
    };
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--bulk" => out.strategy = Strategy::Bulk,
            "--workers" => {
                let raw = it
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--workers needs a value"))?;
                let n: usize = raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("--workers must be a positive integer, got '{raw}'"))?;
                if n == 0 {
                    anyhow::bail!("--workers must be a positive integer, got 0");
                }
                out.workers = Some(n);
            }
            "--export" => {
                let raw = it
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--export needs a path"))?;
                out.export = Some(PathBuf::from(raw));
            }
            other => anyhow::bail!("unknown argument '{other}'"),
        }
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let args = parse_args(&args)?;

    let config = AppConfig::from_env()?;
    telemetry::init(config.log_format);

    let pool = db::connect(&config).await?;
    let store: Arc<dyn RestaurantStore> = Arc::new(PgRestaurantStore::new(pool));
    let pipeline = RecalculationPipeline::new(
        store,
        CsvExportSink::new(args.export.unwrap_or(config.export_path)),
        args.workers.unwrap_or(config.recalc_workers),
    );

    let report = pipeline.run(args.strategy).await?;

    println!("> Recalculation ({}):", report.strategy);
    println!("  restaurants seen: {}", report.seen);
    println!("  updated:          {}", report.updated);
    println!("  failed:           {}", report.failed);
    match &report.export_path {
        Some(path) => println!("  export:           {}", path),
        None => println!("  export:           not written (see logs)"),
    }
    println!("  elapsed:          {} ms", report.elapsed_ms);
    Ok(())
}
