use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Configuration from the environment (and `.env`)
pub fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::from_env().context("invalid configuration")
}

/// Store backed by a freshly connected pool
pub async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<PgStore>> {
    let pool = DatabaseManager::connect(config)
        .await
        .context("failed to connect to database")?;
    Ok(Arc::new(PgStore::new(pool)))
}
