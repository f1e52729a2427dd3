use chrono::Local;

use acta_scrap::{logging, process, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::default();
    // The log file lives in the save dir, so create it before logging init.
    std::fs::create_dir_all(&config.save_dir)?;
    logging::init(&config.log_path)?;

    let start_time = Local::now();
    process::run(config).await?;

    let run_time = (Local::now() - start_time).num_seconds();
    tracing::info!("full run finished in {run_time}s");
    Ok(())
}
