//! Record parsing
//!
//! Turns one history row `(entity, state, timestamp)` into a typed record.
//! The state is either a comma-separated list of segment signals or one of
//! the sentinels `unknown` / `unavailable`, which mean "no reading".

use chrono::{DateTime, FixedOffset};

use crate::error::RowError;

/// Signal per segment, index 0 at the bottom of the tank
pub type SegmentVector = Vec<u32>;

/// States reported when the sensor had no reading
pub const SENTINEL_STATES: [&str; 2] = ["unknown", "unavailable"];

/// Number of columns in a history row
pub const FIELD_COUNT: usize = 3;

/// Timestamp layouts tried after RFC 3339, all requiring an offset
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// A parsed history row
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub entity: String,
    /// `None` when the sensor reported a sentinel state
    pub segments: Option<SegmentVector>,
    pub time: DateTime<FixedOffset>,
}

/// Parses rows for a sensor with a fixed number of segments
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    segment_count: usize,
}

impl RecordParser {
    pub fn new(segment_count: usize) -> Self {
        Self { segment_count }
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Parse one row given as its fields
    pub fn parse<S: AsRef<str>>(&self, fields: &[S]) -> Result<ParsedRecord, RowError> {
        if fields.len() != FIELD_COUNT {
            return Err(RowError::FieldCount {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let segments = parse_state(fields[1].as_ref())?;
        if let Some(ref s) = segments {
            if s.len() != self.segment_count {
                return Err(RowError::SegmentCount {
                    expected: self.segment_count,
                    found: s.len(),
                });
            }
        }

        Ok(ParsedRecord {
            entity: fields[0].as_ref().to_string(),
            segments,
            time: parse_timestamp(fields[2].as_ref())?,
        })
    }
}

/// Parse a state string into a segment vector, `None` for sentinel states
pub fn parse_state(state: &str) -> Result<Option<SegmentVector>, RowError> {
    let state = state.trim();
    if SENTINEL_STATES.contains(&state) {
        return Ok(None);
    }
    if state.is_empty() {
        return Err(RowError::EmptyState);
    }

    state
        .split(',')
        .map(|token| {
            token
                .trim()
                .parse::<u32>()
                .map_err(|_| RowError::InvalidSegment {
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse an ISO-8601 timestamp carrying a UTC offset
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, RowError> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| {
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
        })
        .ok_or_else(|| RowError::InvalidTimestamp {
            value: value.to_string(),
        })
}
