use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dataset::{SplitRatios, TaskType, ValidatorConfig};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_STORE_DIR: &str = "data";
pub const DEFAULT_TENANT_ID: &str = "default";

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub dataset_path: PathBuf,
    pub dataset_name: String,
    pub tenant_id: String,
    /// Annotations copied onto the dataset record; always a JSON object.
    pub metadata: Option<serde_json::Value>,
    pub task_type: TaskType,
    pub seed: u64,
    pub split_ratios: SplitRatios,
    pub min_samples: usize,
    pub store_dir: PathBuf,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).with_context(|| format!("Missing required env var: {key}"));

        let dataset_path = PathBuf::from(get("INGEST_DATASET_PATH")?);
        let task_type: TaskType = get("INGEST_TASK_TYPE")?
            .parse()
            .context("INGEST_TASK_TYPE")?;

        let dataset_name = match lookup("INGEST_DATASET_NAME") {
            Some(name) => name,
            None => file_stem(&dataset_path)?,
        };
        let tenant_id = lookup("INGEST_TENANT_ID").unwrap_or_else(|| DEFAULT_TENANT_ID.to_string());
        let metadata = match lookup("INGEST_METADATA") {
            Some(v) => {
                let value: serde_json::Value =
                    serde_json::from_str(&v).context("INGEST_METADATA is not valid JSON")?;
                if !value.is_object() {
                    bail!("INGEST_METADATA must be a JSON object");
                }
                Some(value)
            }
            None => None,
        };
        let seed = match lookup("INGEST_SEED") {
            Some(v) => v.trim().parse().with_context(|| format!("INGEST_SEED is not a u64: {v:?}"))?,
            None => DEFAULT_SEED,
        };
        let split_ratios = match lookup("INGEST_SPLIT_RATIOS") {
            Some(v) => v.parse().context("INGEST_SPLIT_RATIOS")?,
            None => SplitRatios::default(),
        };
        let min_samples = match lookup("INGEST_MIN_SAMPLES") {
            Some(v) => v.trim().parse().with_context(|| format!("INGEST_MIN_SAMPLES is not a count: {v:?}"))?,
            None => dataset::validator::MIN_UNIQUE_SAMPLES,
        };
        let store_dir = lookup("INGEST_STORE_DIR").map(PathBuf::from).unwrap_or_else(|| DEFAULT_STORE_DIR.into());

        if dataset_name.trim().is_empty() {
            bail!("INGEST_DATASET_NAME must not be empty");
        }
        if tenant_id.trim().is_empty() {
            bail!("INGEST_TENANT_ID must not be empty");
        }
        if min_samples == 0 {
            bail!("INGEST_MIN_SAMPLES must be at least 1");
        }

        Ok(Self {
            dataset_path,
            dataset_name,
            tenant_id,
            metadata,
            task_type,
            seed,
            split_ratios,
            min_samples,
            store_dir,
        })
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig { min_unique_samples: self.min_samples, ..Default::default() }
    }
}

fn file_stem(path: &Path) -> Result<String> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => Ok(stem.to_string()),
        _ => bail!("cannot derive a dataset name from {}; set INGEST_DATASET_NAME", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<IngestConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        IngestConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&[("INGEST_DATASET_PATH", "/uploads/reviews.jsonl"), ("INGEST_TASK_TYPE", "classification")]).unwrap();
        assert_eq!(cfg.dataset_name, "reviews");
        assert_eq!(cfg.tenant_id, "default");
        assert_eq!(cfg.metadata, None);
        assert_eq!(cfg.task_type, TaskType::Classification);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.split_ratios, SplitRatios::default());
        assert_eq!(cfg.min_samples, 100);
        assert_eq!(cfg.store_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_overrides() {
        let cfg = load(&[
            ("INGEST_DATASET_PATH", "faq.jsonl"),
            ("INGEST_TASK_TYPE", "qa"),
            ("INGEST_DATASET_NAME", "support faq"),
            ("INGEST_SEED", "7"),
            ("INGEST_SPLIT_RATIOS", "0.7, 0.2, 0.1"),
            ("INGEST_MIN_SAMPLES", "10"),
            ("INGEST_STORE_DIR", "/var/lib/datasets"),
            ("INGEST_TENANT_ID", "acme"),
            ("INGEST_METADATA", r#"{"source": "crm"}"#),
        ])
        .unwrap();
        assert_eq!(cfg.dataset_name, "support faq");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.split_ratios, SplitRatios::from_fractions(0.7, 0.2, 0.1).unwrap());
        assert_eq!(cfg.validator_config().min_unique_samples, 10);
        assert_eq!(cfg.store_dir, PathBuf::from("/var/lib/datasets"));
        assert_eq!(cfg.tenant_id, "acme");
        assert_eq!(cfg.metadata, Some(serde_json::json!({"source": "crm"})));
    }

    #[test]
    fn test_missing_required() {
        let err = load(&[("INGEST_TASK_TYPE", "qa")]).unwrap_err();
        assert!(err.to_string().contains("INGEST_DATASET_PATH"));
        assert!(load(&[("INGEST_DATASET_PATH", "a.jsonl")]).is_err());
    }

    #[test]
    fn test_malformed_values_fail_fast() {
        let base = [("INGEST_DATASET_PATH", "a.jsonl"), ("INGEST_TASK_TYPE", "qa")];
        for bad in [
            ("INGEST_TASK_TYPE", "summarization"),
            ("INGEST_SEED", "-1"),
            ("INGEST_SPLIT_RATIOS", "0.8,0.2"),
            ("INGEST_SPLIT_RATIOS", "0.5,0.1,0.1"),
            ("INGEST_MIN_SAMPLES", "0"),
            ("INGEST_DATASET_NAME", " "),
            ("INGEST_TENANT_ID", ""),
            ("INGEST_METADATA", "not json"),
            ("INGEST_METADATA", "[1, 2]"),
        ] {
            let mut vars = base.to_vec();
            vars.retain(|(k, _)| *k != bad.0);
            vars.push(bad);
            assert!(load(&vars).is_err(), "{bad:?}");
        }
    }
}
