use std::sync::Arc;

use ingest::{boot, pipeline, stats::IngestStats, IngestConfig};
use normalize::Registry;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();

    let config = IngestConfig::load()?;
    let route = pipeline::Route::from_config(&config, Registry::global())?;
    let stats = Arc::new(IngestStats::new());
    let mut stdout = tokio::io::stdout();

    let written = match &config.input_path {
        Some(path) => {
            info!("Reading input from: {}", path);
            let file = tokio::fs::File::open(path).await?;
            pipeline::run(BufReader::new(file), &mut stdout, &route, &config, Arc::clone(&stats)).await?
        }
        None => {
            info!("Reading input from stdin");
            pipeline::run(BufReader::new(tokio::io::stdin()), &mut stdout, &route, &config, Arc::clone(&stats)).await?
        }
    };

    stats.log_summary();
    info!(events = written, "ingest finished");
    Ok(())
}
