use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Result;

/// Log lines go to the console and, without ANSI colors, to the range-named
/// log file. INFO by default; `RUST_LOG` overrides.
pub fn init(log_path: &Path) -> Result<()> {
    let log_file = Arc::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?,
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file),
        )
        .init();
    Ok(())
}
