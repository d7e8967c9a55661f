//! Strict JSONL validation: schema, encoding, length bounds, dedup, minimum size.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::digest::{self, Hash32};
use crate::error::{DatasetError, LineError, LineErrors, Result};
use crate::quality::QualityTally;
use crate::schema::{Sample, TaskType, ValidatedDataset, ValidationSummary};

pub const MAX_INPUT_CHARS: usize = 8192;
pub const MAX_TARGET_CHARS: usize = 2048;
pub const MIN_UNIQUE_SAMPLES: usize = 100;
pub const MAX_REPORTED_ERRORS: usize = 100;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Deserialize)]
struct RawRecord {
    input_text: String,
    target_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub max_input_chars: usize,
    pub max_target_chars: usize,
    pub min_unique_samples: usize,
    /// Diagnostics kept in the error; failures beyond this are only counted.
    pub max_reported_errors: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_input_chars: MAX_INPUT_CHARS,
            max_target_chars: MAX_TARGET_CHARS,
            min_unique_samples: MIN_UNIQUE_SAMPLES,
            max_reported_errors: MAX_REPORTED_ERRORS,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Validator {
    cfg: ValidatorConfig,
}

enum LineOutcome {
    Blank,
    Valid(Sample),
    Invalid,
}

struct ErrorSink {
    errors: Vec<LineError>,
    total: usize,
    cap: usize,
}

impl ErrorSink {
    fn push(&mut self, e: LineError) {
        self.total += 1;
        if self.errors.len() < self.cap {
            self.errors.push(e);
        }
    }
}

impl Validator {
    pub fn new(cfg: ValidatorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.cfg
    }

    /// Validate a whole upload. All-or-nothing: any bad line rejects the dataset,
    /// with every bad line (up to the configured cap) reported at once.
    pub fn validate(&self, raw: &[u8], task_type: TaskType) -> Result<ValidatedDataset> {
        let mut sink = ErrorSink { errors: vec![], total: 0, cap: self.cfg.max_reported_errors };
        let mut summary = ValidationSummary::default();
        let mut tally = QualityTally::default();

        let mut seen = HashSet::<Hash32>::new();
        let mut digests: Vec<Hash32> = vec![];
        let mut samples: Vec<Sample> = vec![];

        for (i, line) in split_lines(raw).enumerate() {
            let line_no = i + 1;
            summary.lines_read += 1;

            let sample = match self.check_line(line_no, line, &mut sink) {
                LineOutcome::Blank => {
                    summary.blank_lines += 1;
                    continue;
                }
                LineOutcome::Invalid => continue,
                LineOutcome::Valid(s) => s,
            };

            let d = sample.digest();
            if !seen.insert(d) {
                debug!(line = line_no, "duplicate record dropped");
                summary.duplicates_dropped += 1;
                tally.record_duplicate();
                continue;
            }
            tally.record_unique(
                sample.input_text.chars().count(),
                sample.target_text.chars().count(),
            );
            digests.push(d);
            samples.push(sample);
        }

        if sink.total > 0 {
            warn!(invalid_lines = sink.total, "dataset rejected");
            return Err(DatasetError::Rejected(LineErrors { errors: sink.errors, total: sink.total }));
        }

        if samples.len() < self.cfg.min_unique_samples {
            warn!(found = samples.len(), required = self.cfg.min_unique_samples, "too few unique samples");
            return Err(DatasetError::InsufficientSamples {
                found: samples.len(),
                required: self.cfg.min_unique_samples,
            });
        }

        let fingerprint = digest::fingerprint(digests.iter());
        info!(
            %task_type,
            samples = samples.len(),
            duplicates = summary.duplicates_dropped,
            "validation successful"
        );
        Ok(ValidatedDataset::new(task_type, samples, fingerprint, summary, tally.report()))
    }

    fn check_line(&self, line_no: usize, line: &[u8], sink: &mut ErrorSink) -> LineOutcome {
        let line = if line_no == 1 { line.strip_prefix(UTF8_BOM).unwrap_or(line) } else { line };

        let text = match std::str::from_utf8(line) {
            Ok(t) => t,
            Err(_) => {
                sink.push(LineError::Encoding { line: line_no });
                return LineOutcome::Invalid;
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return LineOutcome::Blank;
        }

        // serde would also accept a JSON array for a struct
        if !text.starts_with('{') {
            sink.push(LineError::Parse {
                line: line_no,
                reason: "record must be a JSON object".to_string(),
            });
            return LineOutcome::Invalid;
        }

        // `\ud800` is well-formed JSON but names no character
        if has_lone_surrogate(text) {
            sink.push(LineError::Encoding { line: line_no });
            return LineOutcome::Invalid;
        }

        let rec: RawRecord = match serde_json::from_str(text) {
            Ok(r) => r,
            Err(e) => {
                sink.push(LineError::Parse { line: line_no, reason: e.to_string() });
                return LineOutcome::Invalid;
            }
        };

        let before = sink.total;
        check_length(sink, line_no, "input_text", &rec.input_text, self.cfg.max_input_chars);
        check_length(sink, line_no, "target_text", &rec.target_text, self.cfg.max_target_chars);
        if sink.total > before {
            return LineOutcome::Invalid;
        }

        LineOutcome::Valid(Sample { input_text: rec.input_text, target_text: rec.target_text })
    }
}

/// Validate with default limits.
pub fn validate(raw: &[u8], task_type: TaskType) -> Result<ValidatedDataset> {
    Validator::default().validate(raw, task_type)
}

fn check_length(sink: &mut ErrorSink, line: usize, field: &'static str, value: &str, max: usize) {
    let length = value.chars().count();
    let limit = if length == 0 {
        1
    } else if length > max {
        max
    } else {
        return;
    };
    sink.push(LineError::LengthViolation { line, field, length, limit });
}

/// True if a `\uXXXX` escape names a surrogate that is not part of a
/// high+low pair.
fn has_lone_surrogate(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut pending_high = false;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            if pending_high {
                return true;
            }
            i += 1;
            continue;
        }
        if bytes.get(i + 1) != Some(&b'u') {
            if pending_high {
                return true;
            }
            i += 2;
            continue;
        }
        let unit = bytes
            .get(i + 2..i + 6)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u16::from_str_radix(h, 16).ok());
        match unit {
            Some(0xD800..=0xDBFF) if pending_high => return true,
            Some(0xD800..=0xDBFF) => pending_high = true,
            Some(0xDC00..=0xDFFF) if !pending_high => return true,
            Some(0xDC00..=0xDFFF) => pending_high = false,
            _ if pending_high => return true,
            _ => {}
        }
        i += 6;
    }
    pending_high
}

/// Physical lines, without their `\n` / `\r\n` terminators.
fn split_lines(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = raw.strip_suffix(b"\n").unwrap_or(raw);
    let pieces = if raw.is_empty() { None } else { Some(body.split(|b| *b == b'\n')) };
    pieces
        .into_iter()
        .flatten()
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
}
