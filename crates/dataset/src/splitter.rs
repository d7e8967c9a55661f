//! Task-aware, seeded train/validation/test splitting.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::apportion::{largest_remainder, stratified_counts};
use crate::error::{DatasetError, Result};
use crate::schema::{Sample, SplitDataset, SplitName, SplitRatios, TaskType, ValidatedDataset};

/// Sample indices per split, in train, validation, test order.
pub type Assignment = [Vec<usize>; 3];

/// One way of assigning samples to splits.
pub trait SplitStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every index of `samples` must land in exactly one split.
    fn assign(&self, samples: &[Sample], ratios: SplitRatios, rng: &mut ChaCha8Rng) -> Result<Assignment>;
}

/// Groups by `target_text` and apportions every class on its own.
pub struct Stratified;

/// One seeded permutation of the whole dataset, cut at the split boundaries.
pub struct Shuffled;

pub fn strategy_for(task_type: TaskType) -> &'static dyn SplitStrategy {
    match task_type {
        TaskType::Classification => &Stratified,
        TaskType::TextGeneration | TaskType::Qa => &Shuffled,
    }
}

impl SplitStrategy for Shuffled {
    fn name(&self) -> &'static str {
        "shuffled"
    }

    fn assign(&self, samples: &[Sample], ratios: SplitRatios, rng: &mut ChaCha8Rng) -> Result<Assignment> {
        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.shuffle(rng);

        let [train, validation, _] = largest_remainder(samples.len(), ratios.parts());
        let test = order.split_off(train + validation);
        let validation = order.split_off(train);
        Ok([order, validation, test])
    }
}

impl SplitStrategy for Stratified {
    fn name(&self) -> &'static str {
        "stratified"
    }

    fn assign(&self, samples: &[Sample], ratios: SplitRatios, rng: &mut ChaCha8Rng) -> Result<Assignment> {
        // label order, so the rng is consumed the same way whatever the upload order
        let mut classes: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, s) in samples.iter().enumerate() {
            classes.entry(s.target_text.as_str()).or_default().push(i);
        }
        for members in classes.values_mut() {
            members.shuffle(rng);
        }

        let sizes: Vec<usize> = classes.values().map(Vec::len).collect();
        let counts = stratified_counts(&sizes, ratios.parts());

        let mut out: Assignment = Default::default();
        for ((label, members), cells) in classes.into_iter().zip(counts) {
            if let Some(j) = cells.iter().position(|&n| n == 0) {
                return Err(DatasetError::SplitTooSmall {
                    split: SplitName::ALL[j],
                    class: Some(label.to_string()),
                });
            }
            let mut rest = members.as_slice();
            for (split, n) in out.iter_mut().zip(cells) {
                let (head, tail) = rest.split_at(n);
                split.extend_from_slice(head);
                rest = tail;
            }
        }

        // interleave classes within each split
        for split in out.iter_mut() {
            split.shuffle(rng);
        }
        Ok(out)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Splitter {
    ratios: SplitRatios,
}

impl Splitter {
    pub fn new(ratios: SplitRatios) -> Self {
        Self { ratios }
    }

    pub fn ratios(&self) -> SplitRatios {
        self.ratios
    }

    /// Deterministic for a given `(dataset, seed)`: the generator lives only for this call.
    pub fn split(&self, dataset: &ValidatedDataset, seed: u64) -> Result<SplitDataset> {
        let strategy = strategy_for(dataset.task_type());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let assignment = strategy.assign(dataset.samples(), self.ratios, &mut rng)?;

        for (name, indices) in SplitName::ALL.iter().zip(&assignment) {
            if indices.is_empty() {
                return Err(DatasetError::SplitTooSmall { split: *name, class: None });
            }
        }

        let samples = dataset.samples();
        let splits = assignment.map(|indices| indices.into_iter().map(|i| samples[i].clone()).collect::<Vec<_>>());

        let out = SplitDataset::new(
            dataset.task_type(),
            seed,
            self.ratios,
            dataset.fingerprint(),
            dataset.quality().clone(),
            splits,
        );
        let counts = out.counts();
        info!(
            strategy = strategy.name(),
            seed,
            train = counts.train,
            validation = counts.validation,
            test = counts.test,
            "split complete"
        );
        Ok(out)
    }
}

/// Split with the default 80/10/10 ratios.
pub fn split(dataset: &ValidatedDataset, seed: u64) -> Result<SplitDataset> {
    Splitter::default().split(dataset, seed)
}
