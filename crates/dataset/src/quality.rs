use serde::{Deserialize, Serialize};

/// Soft quality signals. Never a reason to reject an upload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u8,                 // 0..100
    pub warnings: Vec<String>,
    pub duplicate_rate: f32,       // dropped / parsed, 0.0..1.0
    pub avg_input_chars: u32,
    pub avg_target_chars: u32,
}

const RECOMMENDED_SAMPLES: usize = 200;
const MAX_DUPLICATE_RATE: f32 = 0.15;
const MIN_AVG_TARGET_CHARS: u32 = 20;

/// Running totals collected while validating.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct QualityTally {
    pub parsed: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub input_chars: u64,
    pub target_chars: u64,
}

impl QualityTally {
    pub fn record_unique(&mut self, input_chars: usize, target_chars: usize) {
        self.parsed += 1;
        self.unique += 1;
        self.input_chars += input_chars as u64;
        self.target_chars += target_chars as u64;
    }

    pub fn record_duplicate(&mut self) {
        self.parsed += 1;
        self.duplicates += 1;
    }

    pub fn report(&self) -> QualityReport {
        if self.unique == 0 {
            return QualityReport::default();
        }
        let unique = self.unique as u64;
        let avg_input_chars = (self.input_chars / unique) as u32;
        let avg_target_chars = (self.target_chars / unique) as u32;
        let duplicate_rate = self.duplicates as f32 / self.parsed as f32;

        // simple, explainable scoring
        let mut score: i32 = 100;
        let mut warnings = vec![];

        if self.unique < RECOMMENDED_SAMPLES {
            score -= 25;
            warnings.push(format!(
                "Low sample count ({}). Recommended: {RECOMMENDED_SAMPLES}+",
                self.unique
            ));
        }
        if duplicate_rate > MAX_DUPLICATE_RATE {
            score -= 25;
            warnings.push(format!("High duplicate rate ({duplicate_rate:.2}). Check for repeated uploads"));
        }
        if avg_target_chars < MIN_AVG_TARGET_CHARS {
            score -= 10;
            warnings.push(format!(
                "Average target length is low ({avg_target_chars}). Model may learn short replies"
            ));
        }

        QualityReport {
            score: score.clamp(0, 100) as u8,
            warnings,
            duplicate_rate,
            avg_input_chars,
            avg_target_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_dataset_scores_full() {
        let mut tally = QualityTally::default();
        for _ in 0..250 {
            tally.record_unique(40, 30);
        }
        let report = tally.report();
        assert_eq!(report.score, 100);
        assert!(report.warnings.is_empty());
        assert_eq!(report.avg_input_chars, 40);
        assert_eq!(report.avg_target_chars, 30);
    }

    #[test]
    fn test_small_duplicated_short_dataset_warns() {
        let mut tally = QualityTally::default();
        for _ in 0..100 {
            tally.record_unique(10, 5);
        }
        for _ in 0..50 {
            tally.record_duplicate();
        }
        let report = tally.report();
        assert_eq!(report.score, 40);
        assert_eq!(report.warnings.len(), 3);
        assert!((report.duplicate_rate - 50.0 / 150.0).abs() < 1e-6);
    }
}
