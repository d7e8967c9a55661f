use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::digest::Hash32;
use crate::error::{DatasetError, Result};
use crate::quality::QualityReport;

/// Record layout version written alongside every dataset.
pub const SCHEMA_VERSION: &str = "v0_text";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    TextGeneration,
    Qa,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Classification, TaskType::TextGeneration, TaskType::Qa];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Classification => "classification",
            TaskType::TextGeneration => "text_generation",
            TaskType::Qa => "qa",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| DatasetError::UnknownTaskType(s.to_string()))
    }
}

/// One `(input_text, target_text)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub input_text: String,
    pub target_text: String,
}

impl Sample {
    pub fn new(input_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self { input_text: input_text.into(), target_text: target_text.into() }
    }

    pub fn digest(&self) -> Hash32 {
        crate::digest::content_digest(&self.input_text, &self.target_text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitName {
    Train,
    Validation,
    Test,
}

impl SplitName {
    /// Tie-break order used by apportionment.
    pub const ALL: [SplitName; 3] = [SplitName::Train, SplitName::Validation, SplitName::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Validation => "validation",
            SplitName::Test => "test",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            SplitName::Train => 0,
            SplitName::Validation => 1,
            SplitName::Test => 2,
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Train/validation/test proportions, held as parts of [`SplitRatios::SCALE`]
/// so apportionment never touches floating point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RatioFractions", try_from = "RatioFractions")]
pub struct SplitRatios {
    parts: [u32; 3],
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct RatioFractions {
    train: f64,
    validation: f64,
    test: f64,
}

impl SplitRatios {
    pub const SCALE: u32 = 10_000;

    pub const EIGHTY_TEN_TEN: Self = Self { parts: [8_000, 1_000, 1_000] };

    /// Build from fractions. Each must be positive and they must sum to 1.0.
    pub fn from_fractions(train: f64, validation: f64, test: f64) -> Result<Self> {
        let fractions = [train, validation, test];
        if fractions.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return Err(DatasetError::InvalidRatios(format!(
                "ratios must be positive, got {train}/{validation}/{test}"
            )));
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(DatasetError::InvalidRatios(format!("ratios must sum to 1.0, got {sum}")));
        }

        let scale = f64::from(Self::SCALE);
        let train_parts = (train * scale).round() as u32;
        let validation_parts = (validation * scale).round() as u32;
        // test absorbs rounding so the parts always add up to SCALE
        let test_parts = Self::SCALE.saturating_sub(train_parts + validation_parts);

        if train_parts == 0 || validation_parts == 0 || test_parts == 0 {
            return Err(DatasetError::InvalidRatios(format!(
                "ratios below 1/{} are not supported, got {train}/{validation}/{test}",
                Self::SCALE
            )));
        }
        Ok(Self { parts: [train_parts, validation_parts, test_parts] })
    }

    pub fn parts(&self) -> [u32; 3] {
        self.parts
    }

    pub fn fraction(&self, split: SplitName) -> f64 {
        f64::from(self.parts[split.index()]) / f64::from(Self::SCALE)
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self::EIGHTY_TEN_TEN
    }
}

impl From<SplitRatios> for RatioFractions {
    fn from(r: SplitRatios) -> Self {
        Self {
            train: r.fraction(SplitName::Train),
            validation: r.fraction(SplitName::Validation),
            test: r.fraction(SplitName::Test),
        }
    }
}

impl TryFrom<RatioFractions> for SplitRatios {
    type Error = DatasetError;

    fn try_from(f: RatioFractions) -> Result<Self> {
        SplitRatios::from_fractions(f.train, f.validation, f.test)
    }
}

impl FromStr for SplitRatios {
    type Err = DatasetError;

    /// Parses `"0.8,0.1,0.1"`.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DatasetError::InvalidRatios(format!("`{s}`: {e}")))?;
        match values.as_slice() {
            [train, validation, test] => SplitRatios::from_fractions(*train, *validation, *test),
            _ => Err(DatasetError::InvalidRatios(format!("`{s}`: expected three comma-separated values"))),
        }
    }
}

/// Bookkeeping from a validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub lines_read: usize,
    pub blank_lines: usize,
    pub duplicates_dropped: usize,
}

/// Output of the validator. Only the validator constructs it.
#[derive(Clone, Debug)]
pub struct ValidatedDataset {
    task_type: TaskType,
    samples: Vec<Sample>,
    fingerprint: Hash32,
    summary: ValidationSummary,
    quality: QualityReport,
}

impl ValidatedDataset {
    pub(crate) fn new(
        task_type: TaskType,
        samples: Vec<Sample>,
        fingerprint: Hash32,
        summary: ValidationSummary,
        quality: QualityReport,
    ) -> Self {
        Self { task_type, samples, fingerprint, summary, quality }
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn fingerprint(&self) -> Hash32 {
        self.fingerprint
    }

    pub fn summary(&self) -> &ValidationSummary {
        &self.summary
    }

    pub fn quality(&self) -> &QualityReport {
        &self.quality
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    pub total: usize,
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

/// Output of the splitter: three disjoint subsets covering the dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitDataset {
    task_type: TaskType,
    seed: u64,
    ratios: SplitRatios,
    fingerprint: Hash32,
    quality: QualityReport,
    splits: [Vec<Sample>; 3],
}

impl SplitDataset {
    pub(crate) fn new(
        task_type: TaskType,
        seed: u64,
        ratios: SplitRatios,
        fingerprint: Hash32,
        quality: QualityReport,
        splits: [Vec<Sample>; 3],
    ) -> Self {
        Self { task_type, seed, ratios, fingerprint, quality, splits }
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ratios(&self) -> SplitRatios {
        self.ratios
    }

    /// Fingerprint of the validated dataset this was split from.
    pub fn fingerprint(&self) -> Hash32 {
        self.fingerprint
    }

    pub fn quality(&self) -> &QualityReport {
        &self.quality
    }

    pub fn split(&self, name: SplitName) -> &[Sample] {
        &self.splits[name.index()]
    }

    pub fn train(&self) -> &[Sample] {
        self.split(SplitName::Train)
    }

    pub fn validation(&self) -> &[Sample] {
        self.split(SplitName::Validation)
    }

    pub fn test(&self) -> &[Sample] {
        self.split(SplitName::Test)
    }

    pub fn counts(&self) -> SplitCounts {
        let [train, validation, test] = [0, 1, 2].map(|i| self.splits[i].len());
        SplitCounts { total: train + validation + test, train, validation, test }
    }

    /// JSONL bytes for each split, in train, validation, test order.
    pub fn serialized(&self) -> impl Iterator<Item = (SplitName, Vec<u8>)> + '_ {
        SplitName::ALL
            .into_iter()
            .map(|name| (name, crate::jsonl::to_jsonl(self.split(name))))
    }
}
