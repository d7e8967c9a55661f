use tracing::info_span;

use crate::error::Result;
use crate::schema::{SplitDataset, SplitRatios, TaskType};
use crate::splitter::Splitter;
use crate::validator::{Validator, ValidatorConfig};

/// Validator and splitter wired together. Nothing is returned unless both succeed.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    validator: Validator,
    splitter: Splitter,
}

impl Pipeline {
    pub fn new(cfg: ValidatorConfig, ratios: SplitRatios) -> Self {
        Self { validator: Validator::new(cfg), splitter: Splitter::new(ratios) }
    }

    pub fn run(&self, raw: &[u8], task_type: TaskType, seed: u64) -> Result<SplitDataset> {
        let _span = info_span!("dataset_pipeline", %task_type, seed, bytes = raw.len()).entered();
        let validated = self.validator.validate(raw, task_type)?;
        self.splitter.split(&validated, seed)
    }
}

/// Validate and split with default limits and 80/10/10 ratios.
pub fn run(raw: &[u8], task_type: TaskType, seed: u64) -> Result<SplitDataset> {
    Pipeline::default().run(raw, task_type, seed)
}
