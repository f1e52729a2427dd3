use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::download::{download_image, url_basename};
use crate::ledger::{self, Ledger, Row, SENTINEL};
use crate::parse::{classify_page, Classification};
use crate::request::{fetch_page, page_url};
use crate::{Config, Result};

/// Entry point for a run: builds the shared HTTP client, spawns the ledger
/// writer and drives every id in the configured range through it. With one
/// worker the ids are processed strictly in order; otherwise through a
/// bounded pool.
pub async fn run(config: Config) -> Result<()> {
    config.sanity_check();
    let config = Arc::new(config);

    let client = Client::builder().timeout(config.request_timeout).build()?;

    let ledger = Ledger::open(&config.csv_path)?;
    let (row_tx, row_rx) = mpsc::channel::<Row>(256);
    let writer_handle = tokio::spawn(ledger::run_writer(ledger, row_rx));

    tracing::info!(
        "started scraping ids {}..={} with {} worker(s)",
        config.start_id,
        config.end_id,
        config.workers
    );

    if config.workers > 1 {
        run_concurrent(config.clone(), client, row_tx).await;
    } else {
        run_sequential(&config, &client, row_tx).await;
    }

    // All row senders are gone by now; the writer drains and exits.
    writer_handle.await?;
    Ok(())
}

/// One request at a time, in id order. A failed id is logged and the run
/// moves on to the next one.
async fn run_sequential(config: &Config, client: &Client, row_tx: mpsc::Sender<Row>) {
    for id in config.start_id..=config.end_id {
        if let Err(err) = process_id(config, client, &row_tx, id).await {
            tracing::error!("failed to process id {id}: {err}");
        }
    }
}

/// One task per id, at most `config.workers` in flight. Completions arrive
/// in arbitrary order; per-task failures are logged at the collection point
/// and never abort the batch.
async fn run_concurrent(config: Arc<Config>, client: Client, row_tx: mpsc::Sender<Row>) {
    let range = config.start_id..=config.end_id;
    let workers = config.workers;
    for_each_id(range, workers, move |id| {
        let config = config.clone();
        let client = client.clone();
        let row_tx = row_tx.clone();
        async move { process_id(&config, &client, &row_tx, id).await }
    })
    .await
}

/// Dispatches `op(id)` for every id in the range, capping in-flight
/// operations at `workers`. The permit travels into each task, so spawning
/// stalls whenever the pool is full; the backlog is just the unconsumed
/// remainder of the range.
async fn for_each_id<F, Fut>(range: RangeInclusive<u64>, workers: usize, op: F)
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<(u64, Result<()>)> = JoinSet::new();

    for id in range {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            // Only possible if the semaphore is closed, which we never do.
            Err(_) => break,
        };
        let fut = op(id);
        tasks.spawn(async move {
            let _permit = permit;
            (id, fut.await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((id, Err(err))) => tracing::error!("failed to process id {id}: {err}"),
            Err(err) => tracing::error!("a worker task panicked: {err}"),
        }
    }
}

/// Fetch, classify, and record a single id. Rows are written for found and
/// absent images; error pages and fetch failures only leave log lines. A
/// failed image download still records the row, since the URL itself is the
/// valuable part.
async fn process_id(
    config: &Config,
    client: &Client,
    row_tx: &mpsc::Sender<Row>,
    id: u64,
) -> Result<()> {
    let url = page_url(&config.host, id);
    tracing::info!("processing id {id}: {url}");

    let html = fetch_page(client, &config.fetch_retry, &url).await?;
    match classify_page(html.into()).await? {
        Classification::ImageFound(img_url) => {
            tracing::info!("image found for id {id}: {img_url}");
            let dest = config
                .save_dir
                .join(format!("{id}_{}", url_basename(&img_url)));
            if let Err(err) = download_image(client, &config.download_retry, &img_url, &dest).await
            {
                tracing::error!("failed to download {img_url} for id {id}: {err}");
            }
            row_tx
                .send(Row {
                    id,
                    url,
                    acta: img_url,
                })
                .await?;
        }
        Classification::ImageAbsent => {
            tracing::info!("no image found for id {id}");
            row_tx
                .send(Row {
                    id,
                    url,
                    acta: SENTINEL.to_owned(),
                })
                .await?;
        }
        Classification::ErrorPage => {
            tracing::error!("site error page for id {id}, nothing to record");
        }
    }
    Ok(())
}
