use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;

use crate::cli::utils::{connect_store, load_config, output_success};
use crate::cli::OutputFormat;
use crate::database::store::HistoryStore;
use crate::history::export::{write_csv, UNKNOWN_LABEL};

pub async fn show(account_id: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let store = connect_store(&config).await?;
    let entries = store.list_history(account_id).await?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No history for account '{}'", account_id);
                return Ok(());
            }

            for entry in &entries {
                let record = &entry.record;
                let who = entry.updated_by_name.as_deref().unwrap_or(UNKNOWN_LABEL);
                println!(
                    "{}  by {} ({})  changed: {}",
                    record.changed_at.to_rfc3339(),
                    record.updated_by,
                    who,
                    record.changed_fields().join(", ")
                );
            }
        }
    }
    Ok(())
}

pub async fn export(out: Option<PathBuf>, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let store = connect_store(&config).await?;

    match out {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
            let rows = write_csv(store.as_ref(), BufWriter::new(file)).await?;
            output_success(
                &output_format,
                &format!("Exported {} history rows to {}", rows, path.display()),
                Some(serde_json::json!({ "rows": rows, "path": path })),
            )
        }
        None => {
            write_csv(store.as_ref(), io::stdout()).await?;
            Ok(())
        }
    }
}
