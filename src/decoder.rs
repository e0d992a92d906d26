//! Level decoders
//!
//! A decoder turns one segment vector (signal per segment, index 0 at the
//! bottom of the tank) into a liquid level in `[0, N]` where `N` is the number
//! of segments. Fractional values represent partial fill within a segment.
//!
//! The sensor is noisy and its response curve varies between installations,
//! so several heuristics are provided side by side:
//!
//! - [`Stepwise`]: first segment below a fixed threshold
//! - [`BoundaryTracking`]: follows the signal rise towards the air/liquid
//!   boundary, then interpolates against an assumed noise floor
//! - [`Proportional`]: derives a threshold from the observed signal range

use crate::config::DecoderChoice;
use crate::error::ConfigError;
use crate::{BOUNDARY_INITIAL_THRESHOLD, MAX_DECODER_SLOTS, STEPWISE_THRESHOLD};

/// Family a decoder belongs to, used to reject incompatible selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    Stepwise,
    BoundaryTracking,
    Proportional,
    Custom,
}

/// A pure mapping from segment signals to a liquid level
pub trait Decoder {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Decoder family
    fn kind(&self) -> DecoderKind {
        DecoderKind::Custom
    }

    /// Decode a non-empty segment vector into a level in `[0, segments.len()]`
    fn decode(&self, segments: &[u32]) -> f64;
}

/// Round to one decimal place
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Index of the first segment below a fixed threshold
#[derive(Debug, Clone, Copy)]
pub struct Stepwise {
    pub threshold: u32,
}

impl Default for Stepwise {
    fn default() -> Self {
        Self {
            threshold: STEPWISE_THRESHOLD,
        }
    }
}

impl Decoder for Stepwise {
    fn name(&self) -> &'static str {
        "stepwise"
    }

    fn kind(&self) -> DecoderKind {
        DecoderKind::Stepwise
    }

    fn decode(&self, segments: &[u32]) -> f64 {
        segments
            .iter()
            .position(|&x| x < self.threshold)
            .unwrap_or(segments.len()) as f64
    }
}

/// Searches for the drop-off in signal level across the segments.
///
/// Signal tends to increase monotonically closer to the air/liquid boundary,
/// so the threshold is raised to 90% of every segment that stays above it.
/// The first segment below the running threshold gets a fractional share
/// measured from an assumed noise floor of one third of the threshold.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryTracking {
    pub initial_threshold: f64,
}

impl Default for BoundaryTracking {
    fn default() -> Self {
        Self {
            initial_threshold: BOUNDARY_INITIAL_THRESHOLD,
        }
    }
}

impl Decoder for BoundaryTracking {
    fn name(&self) -> &'static str {
        "boundary"
    }

    fn kind(&self) -> DecoderKind {
        DecoderKind::BoundaryTracking
    }

    fn decode(&self, segments: &[u32]) -> f64 {
        let mut thresh = self.initial_threshold;
        for (i, &signal) in segments.iter().enumerate() {
            let x = signal as f64;
            if x < thresh {
                let low = thresh / 3.0;
                let fraction = ((x - low) / (thresh - low)).max(0.0);
                return round1(i as f64 + fraction);
            }
            thresh = thresh.max(x * 0.9);
        }
        segments.len() as f64
    }
}

/// Level proportional to the signal of the last non-full segment.
///
/// The threshold sits between a clamped low and high signal estimate,
/// `low + (high - low) * mix`. Makes dubious assumptions about the signal
/// range when the vector does not have a wide distribution to work with.
#[derive(Debug, Clone, Copy)]
pub struct Proportional {
    pub mix: f64,
}

impl Proportional {
    pub fn new(mix: f64) -> Self {
        Self { mix }
    }
}

impl Default for Proportional {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PROPORTIONAL_MIX)
    }
}

impl Decoder for Proportional {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn kind(&self) -> DecoderKind {
        DecoderKind::Proportional
    }

    fn decode(&self, segments: &[u32]) -> f64 {
        let (Some(&max), Some(&min)) = (segments.iter().max(), segments.iter().min()) else {
            return 0.0;
        };
        let high = (max as f64).clamp(120.0, 200.0);
        let low = (min as f64).min(high * 0.25).max(20.0);
        let thresh = low + (high - low) * self.mix;

        for (i, &signal) in segments.iter().enumerate() {
            let x = signal as f64;
            if x < thresh {
                let fraction = ((x - low).max(0.0) / (thresh - low)).min(1.0);
                return round1(i as f64 + fraction);
            }
        }
        segments.len() as f64
    }
}

/// Ordered set of active decoders.
///
/// Position in the set is the decoder's alias slot: slot 0 writes under the
/// entity's base alias, slot 1 under its lowercase form.
pub struct DecoderSet {
    decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderSet {
    /// Build a set from arbitrary decoders, validating slot count and families
    pub fn new(decoders: Vec<Box<dyn Decoder>>) -> Result<Self, ConfigError> {
        if decoders.is_empty() {
            return Err(ConfigError::NoDecoders);
        }
        if decoders.len() > MAX_DECODER_SLOTS {
            return Err(ConfigError::TooManyDecoders {
                count: decoders.len(),
                max: MAX_DECODER_SLOTS,
            });
        }

        let boundary = decoders
            .iter()
            .find(|d| d.kind() == DecoderKind::BoundaryTracking);
        let proportional = decoders
            .iter()
            .find(|d| d.kind() == DecoderKind::Proportional);
        if let (Some(a), Some(b)) = (boundary, proportional) {
            return Err(ConfigError::ConflictingDecoders {
                first: a.name(),
                second: b.name(),
            });
        }

        Ok(Self { decoders })
    }

    /// Build a set from configured choices
    pub fn from_choices(choices: &[DecoderChoice]) -> Result<Self, ConfigError> {
        let decoders = choices
            .iter()
            .map(|choice| -> Result<Box<dyn Decoder>, ConfigError> {
                Ok(match *choice {
                    DecoderChoice::Stepwise => Box::new(Stepwise::default()),
                    DecoderChoice::BoundaryTracking => Box::new(BoundaryTracking::default()),
                    DecoderChoice::Proportional { mix } => {
                        if !(mix > 0.0 && mix <= 1.0) {
                            return Err(ConfigError::InvalidMix(mix));
                        }
                        Box::new(Proportional::new(mix))
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(decoders)
    }

    /// Number of decoders, which is also the number of alias slots in use
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Check if the set is empty (never true for a validated set)
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Iterate decoders in slot order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Decoder> {
        self.decoders.iter().map(|d| d.as_ref())
    }

    /// Decoder names in slot order
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|d| d.name()).collect()
    }
}

impl std::fmt::Debug for DecoderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
