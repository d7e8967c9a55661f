use dataset::{Hash32, QualityReport, SplitCounts, SplitDataset, SplitRatios, TaskType, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata written once per dataset version, after its raw upload and splits are stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub task_type: TaskType,
    pub schema_version: String,
    #[serde(with = "hex", rename = "fingerprint_hex")]
    pub fingerprint: Hash32,    // digest over the ordered sample digests
    pub counts: SplitCounts,
    pub split_seed: u64,
    pub split_ratios: SplitRatios,
    pub quality: QualityReport,
    /// Free-form caller annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl DatasetRecord {
    pub fn from_split(id: Uuid, tenant_id: impl Into<String>, name: impl Into<String>, split: &SplitDataset) -> Self {
        let created_at = now();
        Self {
            id,
            tenant_id: tenant_id.into(),
            name: name.into(),
            task_type: split.task_type(),
            schema_version: SCHEMA_VERSION.to_string(),
            fingerprint: split.fingerprint(),
            counts: split.counts(),
            split_seed: split.seed(),
            split_ratios: split.ratios(),
            quality: split.quality().clone(),
            metadata: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now().max(self.created_at);
    }
}

fn now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
