//! Error types for the decoding pipeline
//!
//! Fatal errors abort a run through [`SeelevelError`]. Row-level problems are
//! described by [`RowError`] and never abort: the offending row is skipped and
//! reported as a [`RowIssue`].

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SeelevelError>;

/// Main error type for a pipeline run
#[derive(Error, Debug)]
pub enum SeelevelError {
    /// The input does not look like a history export
    #[error("Input format error: {0}")]
    Format(String),

    /// No printable alias is left for a new entity
    #[error("Alias allocator exhausted while assigning entity '{entity}'")]
    AllocatorExhausted { entity: String },

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Underlying CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO failure while reading input or writing output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration problems, detected once before any row is processed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Segment count is zero
    #[error("Segment count must be at least 1")]
    EmptySegmentCount,

    /// Segment count above what the sensor can report
    #[error("Segment count {count} exceeds maximum {max}")]
    TooManySegments { count: usize, max: usize },

    /// No decoder selected
    #[error("At least one decoder must be selected")]
    NoDecoders,

    /// More decoders than alias slots
    #[error("{count} decoders selected but only {max} alias slots are available")]
    TooManyDecoders { count: usize, max: usize },

    /// Two decoders that cannot be selected together
    #[error("Decoders '{first}' and '{second}' cannot be selected together")]
    ConflictingDecoders {
        first: &'static str,
        second: &'static str,
    },

    /// Proportional mixing constant outside (0, 1]
    #[error("Proportional mixing constant must be in (0, 1], got {0}")]
    InvalidMix(f64),

    /// Collation window is not positive
    #[error("Collation window must be positive, got {0}s")]
    InvalidWindow(i64),

    /// Strip chart too narrow
    #[error("Graphic width must be at least {min} columns, got {width}")]
    InvalidWidth { width: usize, min: usize },

    /// Maximum level not positive
    #[error("Graphic max level must be positive, got {0}")]
    InvalidMaxLevel(f64),
}

/// Reasons a single history row is skipped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// Wrong number of columns
    #[error("Expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// State column is empty
    #[error("Empty state")]
    EmptyState,

    /// A segment token is not a non-negative integer
    #[error("Invalid segment value '{token}'")]
    InvalidSegment { token: String },

    /// Segment vector length differs from the configured count
    #[error("Expected {expected} segments, found {found}")]
    SegmentCount { expected: usize, found: usize },

    /// Row bytes could not be decoded as CSV text
    #[error("Undecodable row: {detail}")]
    Encoding { detail: String },

    /// Timestamp could not be parsed with an offset
    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },
}

/// A skipped row together with its position in the input
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    /// 1-based line number in the input file
    pub line: u64,
    /// Why the row was skipped
    pub error: RowError,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Errors from level/volume calibration data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeError {
    /// Map has no points
    #[error("Volume map must contain at least one point")]
    EmptyMap,

    /// Level outside the sensor range
    #[error("Level {level} at index {index} is outside 0..=10")]
    LevelOutOfRange { index: usize, level: f64 },

    /// Map is not monotonic
    #[error("The map of level to volume must be monotonic in level and in volume (index {index})")]
    NotMonotonic { index: usize },

    /// No unit parser accepted the string
    #[error("Invalid volume '{input}': {}", .attempts.join("; "))]
    InvalidVolume {
        input: String,
        attempts: Vec<String>,
    },
}
