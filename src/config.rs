use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};
use crate::{END_ID, HOST, START_ID, WORKERS};

/// Everything a run needs, built once by the entry point and passed down by
/// reference. No component reaches for globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// First id to process, inclusive.
    pub start_id: u64,
    /// Last id to process, inclusive.
    pub end_id: u64,
    /// Cap on concurrently in-flight page requests. 1 means strictly
    /// sequential, in id order.
    pub workers: usize,
    /// Site base URL, without a trailing slash.
    pub host: String,
    /// Per-request timeout applied to the shared HTTP client.
    pub request_timeout: Duration,
    /// Directory holding downloaded images, the CSV ledger and the log file.
    pub save_dir: PathBuf,
    /// CSV ledger path.
    pub csv_path: PathBuf,
    /// Log file path.
    pub log_path: PathBuf,
    /// Retry policy for document page fetches.
    pub fetch_retry: RetryPolicy,
    /// Retry policy for image downloads.
    pub download_retry: RetryPolicy,
}

impl Config {
    pub fn sanity_check(&self) {
        if self.start_id > self.end_id {
            panic!("config.start_id must not exceed config.end_id");
        }
        if self.workers == 0 {
            panic!("config.workers cannot be zero");
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let save_dir = PathBuf::from(format!("resultadosconvzla_{START_ID}-{END_ID}"));
        Self {
            start_id: START_ID,
            end_id: END_ID,
            workers: WORKERS,
            host: HOST.to_owned(),
            request_timeout: Duration::from_secs(10),
            csv_path: save_dir.join(format!("scrap_{START_ID}-{END_ID}.csv")),
            log_path: save_dir.join(format!("scrap_{START_ID}-{END_ID}.log")),
            save_dir,
            fetch_retry: RetryPolicy {
                max_attempts: 5,
                backoff: Backoff::Exponential {
                    base: Duration::from_secs(1),
                },
            },
            download_retry: RetryPolicy {
                max_attempts: 5,
                backoff: Backoff::RandomRange {
                    min: Duration::from_secs(1),
                    max: Duration::from_secs(3),
                },
            },
        }
    }
}
