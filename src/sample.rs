//! Decoded samples
//!
//! The [`SampleBuilder`] runs every configured decoder over a parsed record
//! and files the results under the entity's alias variants.

use chrono::{DateTime, FixedOffset};

use crate::alias::{Alias, AliasAllocator};
use crate::decoder::DecoderSet;
use crate::error::Result;
use crate::record::{ParsedRecord, SegmentVector};

/// Small alias-keyed map preserving first insertion order.
///
/// Equality ignores order: two maps are equal when they hold the same
/// aliases with equal values.
#[derive(Debug, Clone)]
pub struct AliasMap<V> {
    entries: Vec<(Alias, V)>,
}

impl<V> Default for AliasMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> AliasMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an overwritten alias keeps its position
    pub fn insert(&mut self, alias: Alias, value: V) {
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((alias, value)),
        }
    }

    pub fn get(&self, alias: Alias) -> Option<&V> {
        self.entries
            .iter()
            .find(|(a, _)| *a == alias)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, alias: Alias) -> bool {
        self.get(alias).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Alias, &V)> {
        self.entries.iter().map(|(a, v)| (*a, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> AliasMap<V> {
    /// Overlay another map onto this one, later values winning
    pub fn merge(&mut self, other: &AliasMap<V>) {
        for (alias, value) in other.iter() {
            self.insert(alias, value.clone());
        }
    }
}

impl<V: PartialEq> PartialEq for AliasMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(alias, value)| other.get(alias) == Some(value))
    }
}

/// Decoded level per alias, `None` when the reading was unavailable
pub type LevelMap = AliasMap<Option<f64>>;

/// Raw segment vector per base alias
pub type RawMap = AliasMap<Option<SegmentVector>>;

/// One decoded history row
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: DateTime<FixedOffset>,
    pub levels: LevelMap,
    pub raw: RawMap,
}

/// Applies the decoder set to parsed records
#[derive(Debug)]
pub struct SampleBuilder {
    decoders: DecoderSet,
    allocator: AliasAllocator,
}

impl SampleBuilder {
    /// Create a builder; the allocator reserves one alias variant per decoder
    pub fn new(decoders: DecoderSet) -> Self {
        let allocator = AliasAllocator::new(decoders.len());
        Self::with_allocator(decoders, allocator)
    }

    pub fn with_allocator(decoders: DecoderSet, allocator: AliasAllocator) -> Self {
        Self {
            decoders,
            allocator,
        }
    }

    /// Decode one record into a sample
    pub fn build(&mut self, record: ParsedRecord) -> Result<Sample> {
        let alias = self.allocator.assign(&record.entity)?;

        let mut levels = LevelMap::new();
        for (slot, decoder) in self.decoders.iter().enumerate() {
            let level = record.segments.as_deref().map(|s| decoder.decode(s));
            levels.insert(alias.variant(slot), level);
        }

        let mut raw = RawMap::new();
        raw.insert(alias, record.segments);

        Ok(Sample {
            time: record.time,
            levels,
            raw,
        })
    }

    pub fn allocator(&self) -> &AliasAllocator {
        &self.allocator
    }

    pub fn decoders(&self) -> &DecoderSet {
        &self.decoders
    }
}
