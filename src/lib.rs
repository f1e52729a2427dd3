//! Walks a fixed range of document ids on the acta lookup site, pulls the
//! scanned image referenced by each page and keeps a CSV ledger of what was
//! found. Each id ends up as exactly one of: image found, image absent,
//! site error page, or fetch failure.

mod config;
mod download;
mod error;
mod ledger;
pub mod logging;
mod parse;
pub mod process;
mod request;
mod retry;

pub use config::Config;
pub use error::{Error, Result};
pub use retry::{Backoff, RetryPolicy};

/// Closed id range to walk. Edit and rebuild to cover a different slice;
/// at most ~100k ids per output directory keeps the folders manageable.
const START_ID: u64 = 10_400_000;
const END_ID: u64 = 10_500_000;
/// Upper bound on concurrently in-flight page requests.
const WORKERS: usize = 10;
const HOST: &str = "https://resultadosconvzla.com";
