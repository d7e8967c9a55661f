//! Upload file → validate/split → dataset store.

use anyhow::{anyhow, Context, Result};
use dataset::{DatasetError, LineError, Pipeline};
use datastore::{DatasetRecord, DatasetStore, DirStorage};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;

#[derive(Debug)]
pub enum Outcome {
    Stored(DatasetRecord),
    /// The upload was refused; the value is the diagnostic to hand back.
    Rejected(Value),
}

pub async fn ingest(cfg: &IngestConfig) -> Result<Outcome> {
    let raw = tokio::fs::read(&cfg.dataset_path)
        .await
        .with_context(|| format!("Failed to read dataset file {}", cfg.dataset_path.display()))?;
    info!(path = %cfg.dataset_path.display(), bytes = raw.len(), task_type = %cfg.task_type, "dataset upload read");

    // blocking validate + split
    let pipeline = Pipeline::new(cfg.validator_config(), cfg.split_ratios);
    let (task_type, seed) = (cfg.task_type, cfg.seed);
    let (raw, split) = tokio::task::spawn_blocking(move || {
        let split = pipeline.run(&raw, task_type, seed);
        (raw, split)
    })
    .await
    .context("pipeline task failed")?;

    let split = match split {
        Ok(split) => split,
        Err(err) => {
            warn!(error = %err, "dataset refused");
            return Ok(Outcome::Rejected(diagnostic(&err)));
        }
    };

    let mut rec = DatasetRecord::from_split(Uuid::new_v4(), cfg.tenant_id.as_str(), cfg.dataset_name.as_str(), &split);
    if let Some(metadata) = &cfg.metadata {
        rec = rec.with_metadata(metadata.clone());
    }
    let store_dir = cfg.store_dir.clone();
    // DirStorage is blocking IO
    let rec = tokio::task::spawn_blocking(move || -> Result<DatasetRecord> {
        let storage = DirStorage::new(&store_dir)
            .map_err(|e| anyhow!("Failed to open dataset store at {}: {e}", store_dir.display()))?;
        let mut store = DatasetStore::new(storage);
        store.persist(&rec, &raw, &split)?;
        Ok(rec)
    })
    .await
    .context("store task failed")??;

    Ok(Outcome::Stored(rec))
}

/// Machine-readable form of a refusal.
pub fn diagnostic(err: &DatasetError) -> Value {
    match err {
        DatasetError::Rejected(errs) => json!({
            "error": "dataset_validation_failed",
            "message": err.to_string(),
            "total": errs.total,
            "truncated": errs.truncated(),
            "errors": errs.errors.iter().map(line_error).collect::<Vec<_>>(),
        }),
        DatasetError::InsufficientSamples { found, required } => json!({
            "error": "insufficient_samples",
            "message": err.to_string(),
            "found": found,
            "required": required,
        }),
        DatasetError::SplitTooSmall { split, class } => json!({
            "error": "split_too_small",
            "message": err.to_string(),
            "split": split.as_str(),
            "class": class,
        }),
        DatasetError::InvalidRatios(_) | DatasetError::UnknownTaskType(_) => json!({
            "error": "invalid_configuration",
            "message": err.to_string(),
        }),
    }
}

fn line_error(e: &LineError) -> Value {
    let kind = match e {
        LineError::Parse { .. } => "parse",
        LineError::Encoding { .. } => "encoding",
        LineError::LengthViolation { .. } => "length_violation",
    };
    json!({ "line": e.line(), "kind": kind, "message": e.to_string() })
}
