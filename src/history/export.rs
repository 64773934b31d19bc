use std::sync::Arc;

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use thiserror::Error;

use crate::database::models::HistoryEntry;
use crate::database::store::{HistoryStore, Store, StoreError};

/// Rendered in place of labels whose reference cannot be resolved
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Chunks buffered between the store cursor and the response body
const EXPORT_CHANNEL_CAPACITY: usize = 32;

pub const EXPORT_HEADER: [&str; 17] = [
    "account_id",
    "account_name",
    "old_department",
    "new_department",
    "old_program",
    "new_program",
    "old_year_level",
    "new_year_level",
    "old_status",
    "new_status",
    "old_batch",
    "new_batch",
    "old_role",
    "new_role",
    "changed_at",
    "updated_by",
    "updated_by_name",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Io(#[from] std::io::Error),
}

fn label(name: &Option<String>) -> String {
    name.clone().unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

impl HistoryEntry {
    /// Flattened, denormalized row in [`EXPORT_HEADER`] order
    pub fn export_row(&self) -> Vec<String> {
        let r = &self.record;
        vec![
            r.account_id.clone(),
            label(&self.account_name),
            label(&self.old_department_name),
            label(&self.new_department_name),
            label(&self.old_program_name),
            label(&self.new_program_name),
            r.old_year_level.clone().unwrap_or_default(),
            r.new_year_level.clone().unwrap_or_default(),
            r.old_status.clone(),
            r.new_status.clone(),
            r.old_batch.clone().unwrap_or_default(),
            r.new_batch.clone().unwrap_or_default(),
            label(&self.old_role_name),
            label(&self.new_role_name),
            r.changed_at.to_rfc3339(),
            r.updated_by.clone(),
            label(&self.updated_by_name),
        ]
    }
}

/// Encodes a single CSV record, terminator included
pub fn encode_record<I, T>(fields: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Streams the full history export as CSV chunks.
///
/// A background task drains the store cursor into a bounded channel, so at
/// most `EXPORT_CHANNEL_CAPACITY` rows are held in memory and a slow reader
/// stalls the cursor rather than growing a buffer. The first error ends the
/// stream.
pub fn csv_stream(store: Arc<dyn Store>) -> mpsc::Receiver<Result<Vec<u8>, ExportError>> {
    let (mut tx, rx) = mpsc::channel(EXPORT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        if tx.send(encode_record(EXPORT_HEADER)).await.is_err() {
            return;
        }

        let mut rows = store.export_history();
        let mut exported = 0usize;

        while let Some(row) = rows.next().await {
            let chunk = row
                .map_err(ExportError::from)
                .and_then(|entry| encode_record(entry.export_row()));

            if let Err(e) = &chunk {
                tracing::error!("History export aborted after {} rows: {}", exported, e);
            }
            let failed = chunk.is_err();

            if tx.send(chunk).await.is_err() {
                tracing::debug!("History export reader dropped after {} rows", exported);
                return;
            }
            if failed {
                return;
            }
            exported += 1;
        }

        tracing::info!("History export finished: {} rows", exported);
    });

    rx
}

/// Writes the full export to `out`; returns the number of data rows
pub async fn write_csv<W: std::io::Write>(store: &dyn HistoryStore, out: W) -> Result<usize, ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(EXPORT_HEADER)?;

    let mut rows = store.export_history();
    let mut exported = 0usize;
    while let Some(row) = rows.next().await {
        writer.write_record(row?.export_row())?;
        exported += 1;
    }

    writer.flush()?;
    Ok(exported)
}
