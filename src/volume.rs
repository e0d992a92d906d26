//! Level to volume calibration
//!
//! Tanks are rarely prismatic, so a decoded level is converted to a volume
//! through a piecewise-linear map measured per installation.

use crate::error::VolumeError;

/// Litres per US gallon
pub const LITRES_PER_GALLON: f64 = 3.785_411_78;

/// Highest level accepted in a map
pub const MAX_MAP_LEVEL: f64 = 10.0;

/// Monotonic piecewise-linear map from level to volume in litres
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMap {
    points: Vec<(f64, f64)>,
    invert: bool,
}

impl VolumeMap {
    /// Build a map from `(level, volume)` points.
    ///
    /// Levels must lie in `0..=10` and both columns must be non-decreasing.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, VolumeError> {
        if points.is_empty() {
            return Err(VolumeError::EmptyMap);
        }

        let (mut level, mut volume) = (0.0, 0.0);
        for (index, &(l, v)) in points.iter().enumerate() {
            if !(0.0..=MAX_MAP_LEVEL).contains(&l) {
                return Err(VolumeError::LevelOutOfRange { index, level: l });
            }
            if l < level || v < volume {
                return Err(VolumeError::NotMonotonic { index });
            }
            level = l;
            volume = v;
        }

        Ok(Self {
            points,
            invert: false,
        })
    }

    /// Build a map from levels paired with volume strings such as `"40 L"`
    /// or `"10gal"`, converting every volume to litres
    pub fn parse(points: &[(f64, &str)]) -> Result<Self, VolumeError> {
        let points = points
            .iter()
            .map(|&(level, volume)| parse_volume(volume).map(|litres| (level, litres)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points)
    }

    /// Report the remaining capacity instead of the content
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Estimate the volume for a level.
    ///
    /// Returns `None` when the map has fewer than two points. Levels outside
    /// the map are clamped to its first or last volume.
    pub fn estimate(&self, level: f64) -> Option<f64> {
        if level.is_nan() || self.points.len() < 2 {
            return None;
        }

        let (first, last) = (self.points[0], self.points[self.points.len() - 1]);
        let volume = match self.points.iter().position(|&(l, _)| level < l) {
            None => last.1,
            Some(0) => first.1,
            Some(i) => {
                let (l0, v0) = self.points[i - 1];
                let (l1, v1) = self.points[i];
                let t = (level - l0) / (l1 - l0);
                v0 + (v1 - v0) * t
            }
        };

        Some(if self.invert { last.1 - volume } else { volume })
    }
}

/// One way of reading a volume string
struct UnitParser {
    name: &'static str,
    suffixes: &'static [&'static str],
    litres_per_unit: f64,
}

const UNIT_PARSERS: &[UnitParser] = &[
    UnitParser {
        name: "litres",
        suffixes: &[" L", "L", ""],
        litres_per_unit: 1.0,
    },
    UnitParser {
        name: "gallons",
        suffixes: &[" gal", "gal"],
        litres_per_unit: LITRES_PER_GALLON,
    },
];

impl UnitParser {
    fn parse(&self, input: &str) -> Result<f64, String> {
        let number = self
            .suffixes
            .iter()
            .find_map(|suffix| input.strip_suffix(suffix))
            .ok_or_else(|| format!("{}: missing unit", self.name))?;
        let value: f64 = number
            .parse()
            .map_err(|_| format!("{}: '{}' is not a number", self.name, number))?;
        if !value.is_finite() {
            return Err(format!("{}: '{}' is not finite", self.name, number));
        }
        Ok(value * self.litres_per_unit)
    }
}

/// Parse a volume such as `"120"`, `"120 L"` or `"30gal"` into litres.
///
/// Unit parsers are tried in order and the first success wins. When every
/// parser fails, the error lists each attempt.
pub fn parse_volume(input: &str) -> Result<f64, VolumeError> {
    let trimmed = input.trim();
    let mut attempts = Vec::with_capacity(UNIT_PARSERS.len());
    for parser in UNIT_PARSERS {
        match parser.parse(trimmed) {
            Ok(litres) => return Ok(litres),
            Err(reason) => attempts.push(reason),
        }
    }
    Err(VolumeError::InvalidVolume {
        input: input.to_string(),
        attempts,
    })
}
