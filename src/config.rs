//! Pipeline configuration
//!
//! The workbench is meant to be edited between experiments: defaults come
//! from the constants in the crate root and are not exposed as runtime flags.

use chrono::FixedOffset;

use crate::alias::Alias;
use crate::error::ConfigError;
use crate::volume::VolumeMap;
use crate::{
    COLLATION_INTERVAL_SECS, DEBUG_RAW_SAMPLES, DEFAULT_PROPORTIONAL_MIX, DEFAULT_SEGMENT_COUNT,
    GRAPHIC_COLUMNS, GRAPHIC_MAX_LEVEL, MAX_SEGMENT_COUNT,
};

/// Selectable reference decoders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecoderChoice {
    Stepwise,
    BoundaryTracking,
    /// Proportional decoder with its mixing constant
    Proportional { mix: f64 },
}

impl DecoderChoice {
    /// Proportional decoder with the default mixing constant
    pub fn proportional() -> Self {
        DecoderChoice::Proportional {
            mix: DEFAULT_PROPORTIONAL_MIX,
        }
    }
}

/// Top-level configuration for a run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of segments reported by the sensor
    pub segment_count: usize,

    /// Active decoders, in alias slot order
    pub decoders: Vec<DecoderChoice>,

    /// Collation settings
    pub collation: CollatorConfig,

    /// Rendering settings
    pub render: RenderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_count: DEFAULT_SEGMENT_COUNT,
            decoders: vec![DecoderChoice::Stepwise, DecoderChoice::BoundaryTracking],
            collation: CollatorConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with a specific decoder selection
    pub fn with_decoders(decoders: Vec<DecoderChoice>) -> Self {
        Self {
            decoders,
            ..Default::default()
        }
    }

    /// Check everything that can be checked before reading any row.
    ///
    /// Decoder selection is validated when the decoder set is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_count == 0 {
            return Err(ConfigError::EmptySegmentCount);
        }
        if self.segment_count > MAX_SEGMENT_COUNT {
            return Err(ConfigError::TooManySegments {
                count: self.segment_count,
                max: MAX_SEGMENT_COUNT,
            });
        }
        self.collation.validate()?;
        self.render.validate()
    }
}

/// Collator configuration
#[derive(Debug, Clone)]
pub struct CollatorConfig {
    /// Samples closer than this to a snapshot's anchor are merged into it
    pub window_secs: i64,
}

impl Default for CollatorConfig {
    fn default() -> Self {
        Self {
            window_secs: COLLATION_INTERVAL_SECS,
        }
    }
}

impl CollatorConfig {
    pub fn with_window_secs(window_secs: i64) -> Self {
        Self { window_secs }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs <= 0 {
            return Err(ConfigError::InvalidWindow(self.window_secs));
        }
        Ok(())
    }
}

/// Strip chart configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Width of the strip in columns
    pub width: usize,

    /// Level drawn at the right edge of the strip
    pub max_level: f64,

    /// Alias pairs whose levels are summed in the labels
    pub pairs: Vec<(Alias, Alias)>,

    /// Level to volume maps shown next to an alias' level
    pub volumes: Vec<(Alias, VolumeMap)>,

    /// Print the raw segment vectors under each line
    pub show_raw: bool,

    /// Display offset for timestamps (None = local time zone)
    pub utc_offset: Option<FixedOffset>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: GRAPHIC_COLUMNS,
            max_level: GRAPHIC_MAX_LEVEL,
            // Fresh and gray halves of a split tank, for both decoder slots
            pairs: vec![
                (Alias::new('F'), Alias::new('G')),
                (Alias::new('f'), Alias::new('g')),
            ],
            volumes: Vec::new(),
            show_raw: DEBUG_RAW_SAMPLES,
            utc_offset: None,
        }
    }
}

impl RenderConfig {
    /// Minimum strip width: two boundary columns plus one drawable column
    pub const MIN_WIDTH: usize = 3;

    /// Create a configuration rendering timestamps at a fixed offset
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            utc_offset: Some(offset),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < Self::MIN_WIDTH {
            return Err(ConfigError::InvalidWidth {
                width: self.width,
                min: Self::MIN_WIDTH,
            });
        }
        if !(self.max_level > 0.0) {
            return Err(ConfigError::InvalidMaxLevel(self.max_level));
        }
        Ok(())
    }
}
