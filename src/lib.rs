//! # Seelevel - Segment decoding workbench
//!
//! Decodes raw capacitive segment telemetry from Seelevel tank sensors into
//! liquid levels and draws a text strip chart, so decoding heuristics can be
//! compared side by side against recorded field data.
//!
//! ## Key Features
//!
//! - **Pluggable decoders**: Stepwise, boundary tracking and proportional heuristics
//! - **Stable aliases**: One memorable character per tank, derived from its name
//! - **Collation**: Readings from several tanks a few seconds apart become one moment
//! - **Change-only output**: A chart line is printed only when a level changes
//!
//! ## Quick Start
//!
//! ```rust
//! use seelevel::{Pipeline, PipelineConfig, DecoderChoice};
//!
//! let csv = "entity_id,state,last_changed\n\
//!            tank1,\"512,500,480,300,50,10,5,0,0\",2024-01-01T00:00:00+00:00\n";
//!
//! let pipeline = Pipeline::new(PipelineConfig::with_decoders(vec![DecoderChoice::Stepwise])).unwrap();
//! let mut out = Vec::new();
//! let summary = pipeline.run(csv.as_bytes(), &mut out).unwrap();
//!
//! assert_eq!(summary.lines, 1);
//! assert!(String::from_utf8(out).unwrap().contains(" W 4.0 "));
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: Level decoders and the active decoder set
//! - [`alias`]: Alias allocation for entities
//! - [`record`]: Parsing of history rows
//! - [`history`]: CSV history export reader
//! - [`sample`]: Decoded samples and alias-keyed maps
//! - [`collator`]: Merging of closely spaced samples
//! - [`render`]: Text strip chart
//! - [`volume`]: Level to volume calibration
//! - [`pipeline`]: End-to-end run

// Modules
pub mod alias;
pub mod collator;
pub mod config;
pub mod decoder;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod sample;
pub mod volume;

// Re-exports for convenient access
pub use alias::{Alias, AliasAllocator, KeywordRule};
pub use collator::{CollatedSnapshot, Collator};
pub use config::{CollatorConfig, DecoderChoice, PipelineConfig, RenderConfig};
pub use decoder::{BoundaryTracking, Decoder, DecoderKind, DecoderSet, Proportional, Stepwise};
pub use error::{ConfigError, Result, RowError, RowIssue, SeelevelError, VolumeError};
pub use history::{History, HistoryReader};
pub use pipeline::{Pipeline, RunSummary};
pub use record::{ParsedRecord, RecordParser, SegmentVector};
pub use render::Renderer;
pub use sample::{AliasMap, LevelMap, RawMap, Sample, SampleBuilder};
pub use volume::{parse_volume, VolumeMap};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Signal below which the stepwise decoder considers a segment empty
pub const STEPWISE_THRESHOLD: u32 = 120;

/// Starting threshold of the boundary tracking decoder
pub const BOUNDARY_INITIAL_THRESHOLD: f64 = 120.0;

/// Mixing constant of the proportional decoder (0.75 has also been used)
pub const DEFAULT_PROPORTIONAL_MIX: f64 = 0.6;

/// Samples closer than this to a snapshot's anchor are merged (seconds)
pub const COLLATION_INTERVAL_SECS: i64 = 15;

/// Level drawn at the right edge of the chart
pub const GRAPHIC_MAX_LEVEL: f64 = 9.0;

/// Width of the chart strip in columns
pub const GRAPHIC_COLUMNS: usize = 60;

/// Print raw segment vectors under each chart line
pub const DEBUG_RAW_SAMPLES: bool = false;

/// Segments per sensor
pub const DEFAULT_SEGMENT_COUNT: usize = 9;

/// Segments a sensor packet can carry
pub const MAX_SEGMENT_COUNT: usize = 10;

/// Decoders that can run at once (uppercase and lowercase alias)
pub const MAX_DECODER_SLOTS: usize = 2;
