use std::fmt;

use thiserror::Error;

use crate::schema::SplitName;

/// A single rejected input line. Line numbers are 1-based physical lines.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line {line}: invalid record: {reason}")]
    Parse { line: usize, reason: String },

    #[error("line {line}: not valid UTF-8")]
    Encoding { line: usize },

    #[error("line {line}: `{field}` has length {length}, limit is {limit}")]
    LengthViolation {
        line: usize,
        field: &'static str,
        length: usize,
        limit: usize,
    },
}

impl LineError {
    pub fn line(&self) -> usize {
        match self {
            LineError::Parse { line, .. }
            | LineError::Encoding { line }
            | LineError::LengthViolation { line, .. } => *line,
        }
    }
}

/// Line-level diagnostics collected over a whole upload.
///
/// `errors` is capped; `total` counts every failure seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineErrors {
    pub errors: Vec<LineError>,
    pub total: usize,
}

impl LineErrors {
    pub fn first(&self) -> Option<&LineError> {
        self.errors.first()
    }

    pub fn truncated(&self) -> bool {
        self.total > self.errors.len()
    }
}

impl fmt::Display for LineErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid line(s)", self.total)?;
        if let Some(first) = self.first() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset rejected: {0}")]
    Rejected(LineErrors),

    #[error("insufficient samples: found {found} unique, need at least {required}")]
    InsufficientSamples { found: usize, required: usize },

    #[error("{split} split would be empty{}", class_suffix(.class))]
    SplitTooSmall { split: SplitName, class: Option<String> },

    #[error("invalid split ratios: {0}")]
    InvalidRatios(String),

    #[error("unknown task type `{0}` (expected classification, text_generation or qa)")]
    UnknownTaskType(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

fn class_suffix(class: &Option<String>) -> String {
    match class {
        Some(c) => format!(" for class `{c}`"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let e = LineError::LengthViolation { line: 3, field: "input_text", length: 8193, limit: 8192 };
        assert_eq!(e.to_string(), "line 3: `input_text` has length 8193, limit is 8192");

        let e = DatasetError::SplitTooSmall { split: SplitName::Test, class: Some("spam".into()) };
        assert_eq!(e.to_string(), "test split would be empty for class `spam`");

        let e = DatasetError::SplitTooSmall { split: SplitName::Validation, class: None };
        assert_eq!(e.to_string(), "validation split would be empty");
    }

    #[test]
    fn test_rejected_summary() {
        let errs = LineErrors {
            errors: vec![LineError::Encoding { line: 7 }],
            total: 4,
        };
        assert!(errs.truncated());
        assert_eq!(
            DatasetError::Rejected(errs).to_string(),
            "dataset rejected: 4 invalid line(s); first: line 7: not valid UTF-8"
        );
    }
}
