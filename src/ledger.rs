use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::Writer;
use tokio::sync::mpsc;

use crate::Result;

/// Written to the ACTA column when a page had no image, directing manual
/// follow-up to the log.
pub(crate) const SENTINEL: &str = "Revisar LOG";

const HEADER: [&str; 3] = ["CEDULA", "URL", "ACTA"];

/// One outcome row: identifier, page URL, image URL or the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u64,
    pub url: String,
    pub acta: String,
}

/// Append-only CSV ledger. Rows are never updated or deleted; re-runs over
/// the same range simply append again.
pub(crate) struct Ledger {
    writer: Writer<File>,
}

impl Ledger {
    /// Opens the CSV in append mode, writing the header only when the file
    /// did not previously exist.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }

    pub(crate) fn append(&mut self, row: &Row) -> Result<()> {
        self.writer
            .write_record([row.id.to_string().as_str(), &row.url, &row.acta])?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Single-writer drain: rows from every worker funnel through one channel,
/// so concurrent appends cannot interleave. Runs until all senders drop.
/// A failed append loses that row; the run keeps going.
pub(crate) async fn run_writer(mut ledger: Ledger, mut row_rx: mpsc::Receiver<Row>) {
    while let Some(row) = row_rx.recv().await {
        match ledger.append(&row) {
            Ok(()) => tracing::info!("row saved: {}, {}, {}", row.id, row.url, row.acta),
            Err(err) => tracing::error!("failed to save row for id {}: {err}", row.id),
        }
    }
}
