//! Dataset validation and splitting
//!
//! Raw JSONL bytes are validated into a [`ValidatedDataset`] (schema, UTF-8,
//! length bounds, exact-duplicate removal, minimum size) and then split into
//! train/validation/test with a task-aware, seeded strategy.

mod apportion;
pub mod digest;
mod error;
pub mod jsonl;
pub mod pipeline;
mod quality;
mod schema;
pub mod splitter;
pub mod validator;

pub use digest::Hash32;
pub use error::{DatasetError, LineError, LineErrors, Result};
pub use pipeline::Pipeline;
pub use quality::QualityReport;
pub use schema::{
    Sample, SplitCounts, SplitDataset, SplitName, SplitRatios, TaskType, ValidatedDataset,
    ValidationSummary, SCHEMA_VERSION,
};
pub use splitter::{split, strategy_for, SplitStrategy, Splitter};
pub use validator::{validate, Validator, ValidatorConfig};
