mod config;
mod handoff;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::IngestConfig;
use crate::handoff::Outcome;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = IngestConfig::from_env()?;
    info!(
        dataset = %cfg.dataset_name,
        tenant = %cfg.tenant_id,
        task_type = %cfg.task_type,
        seed = cfg.seed,
        store = %cfg.store_dir.display(),
        "ingest starting"
    );

    match handoff::ingest(&cfg).await? {
        Outcome::Stored(rec) => {
            println!("{}", serde_json::to_string_pretty(&rec).context("Failed to render dataset record")?);
            Ok(())
        }
        Outcome::Rejected(diag) => {
            println!("{diag:#}");
            // refusals are terminal; a distinct exit code lets callers tell them from IO failures
            std::process::exit(2);
        }
    }
}
