use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoreError>;

/// A structural problem found by [`Score::validate`](crate::Score::validate)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("note {index}: end time {end_time} is before start time {start_time}")]
    NoteEndsBeforeStart {
        index: usize,
        start_time: f64,
        end_time: f64,
    },

    #[error("{kind} {index}: time {value} is not a finite, non-negative number of seconds")]
    InvalidTime {
        kind: &'static str,
        index: usize,
        value: f64,
    },

    #[error("tempo {index}: qpm {qpm} must be a positive number")]
    NonPositiveTempo { index: usize, qpm: f64 },

    #[error("time signature {index}: numerator {numerator} must be at least 1")]
    InvalidNumerator { index: usize, numerator: i32 },

    #[error("time signature {index}: denominator {denominator} must be a positive integer")]
    InvalidDenominator { index: usize, denominator: i32 },

    #[error("key signature {index}: key {key} is not a pitch class (0-11)")]
    InvalidKey { index: usize, key: i32 },

    #[error("{kind} {index} at {time}s comes before the entry preceding it")]
    OutOfOrder {
        kind: &'static str,
        index: usize,
        time: f64,
    },
}

impl ScoreError {
    /// Index of the offending element within its list
    pub fn index(&self) -> usize {
        match self {
            ScoreError::NoteEndsBeforeStart { index, .. }
            | ScoreError::InvalidTime { index, .. }
            | ScoreError::NonPositiveTempo { index, .. }
            | ScoreError::InvalidNumerator { index, .. }
            | ScoreError::InvalidDenominator { index, .. }
            | ScoreError::InvalidKey { index, .. }
            | ScoreError::OutOfOrder { index, .. } => *index,
        }
    }
}
