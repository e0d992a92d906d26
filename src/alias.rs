// Seelevel - Segment decoding workbench
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Alias allocation
//!
//! Every entity gets a single-character alias at first sighting. The base
//! letter comes from keywords in the entity identifier; collisions walk
//! forward through the printable code points, wrapping from '~' back to '!',
//! until a free character is found.

use std::fmt;

use crate::error::{Result, SeelevelError};

/// First and last printable ASCII characters usable as aliases
const FIRST_PRINTABLE: char = '!';
const LAST_PRINTABLE: char = '~';

/// Single-character display identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias(char);

impl Alias {
    pub const fn new(c: char) -> Self {
        Self(c)
    }

    pub fn as_char(&self) -> char {
        self.0
    }

    /// Alias used by a decoder slot: the base for slot 0, its lowercase form after
    pub fn variant(&self, slot: usize) -> Alias {
        if slot == 0 {
            *self
        } else {
            Alias(self.0.to_ascii_lowercase())
        }
    }

    fn is_printable(&self) -> bool {
        (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&self.0)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keyword rule: any needle found in the entity id selects the letter
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub needles: Vec<String>,
    pub letter: char,
}

impl KeywordRule {
    pub fn new(needles: &[&str], letter: char) -> Self {
        Self {
            needles: needles.iter().map(|s| s.to_string()).collect(),
            letter,
        }
    }

    fn matches(&self, entity: &str) -> bool {
        self.needles.iter().any(|n| entity.contains(n.as_str()))
    }
}

/// Default keyword rules for tank names
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(&["gray", "grey"], 'G'),
        KeywordRule::new(&["fresh"], 'F'),
        KeywordRule::new(&["black"], 'B'),
    ]
}

/// Letter used when no keyword matches
pub const DEFAULT_LETTER: char = 'W';

/// Assigns stable aliases to entities for the lifetime of a run
#[derive(Debug, Clone)]
pub struct AliasAllocator {
    /// Entity to base alias, in first-sighting order
    assigned: Vec<(String, Alias)>,
    /// Decoder slots whose variants must stay unique
    slots: usize,
    rules: Vec<KeywordRule>,
}

impl AliasAllocator {
    /// Create an allocator reserving `slots` variants per entity
    pub fn new(slots: usize) -> Self {
        Self::with_rules(slots, default_rules())
    }

    /// Create an allocator with custom keyword rules
    pub fn with_rules(slots: usize, rules: Vec<KeywordRule>) -> Self {
        Self {
            assigned: Vec::new(),
            slots: slots.max(1),
            rules,
        }
    }

    /// Base letter suggested by the keyword rules
    pub fn base_letter(&self, entity: &str) -> char {
        self.rules
            .iter()
            .find(|rule| rule.matches(entity))
            .map(|rule| rule.letter)
            .unwrap_or(DEFAULT_LETTER)
    }

    /// Look up an entity without allocating
    pub fn get(&self, entity: &str) -> Option<Alias> {
        self.assigned
            .iter()
            .find(|(e, _)| e == entity)
            .map(|(_, a)| *a)
    }

    /// Return the entity's alias, allocating one on first sighting
    pub fn assign(&mut self, entity: &str) -> Result<Alias> {
        if let Some(alias) = self.get(entity) {
            return Ok(alias);
        }

        let base = self.base_letter(entity);
        if let Some(alias) = walk_from(base).find(|&a| self.is_available(a)) {
            tracing::debug!(entity, alias = %alias, "assigned alias");
            self.assigned.push((entity.to_string(), alias));
            return Ok(alias);
        }

        Err(SeelevelError::AllocatorExhausted {
            entity: entity.to_string(),
        })
    }

    /// A base alias is free when all its slot variants are distinct,
    /// printable, and not held by another entity
    fn is_available(&self, base: Alias) -> bool {
        let variants: Vec<Alias> = (0..self.slots).map(|s| base.variant(s)).collect();
        for (i, v) in variants.iter().enumerate() {
            if !v.is_printable() || variants[..i].contains(v) {
                return false;
            }
        }
        !self.assigned.iter().any(|(_, held)| {
            (0..self.slots).any(|s| variants.contains(&held.variant(s)))
        })
    }

    /// Entities and their base aliases in first-sighting order
    pub fn legend(&self) -> impl Iterator<Item = (&str, Alias)> {
        self.assigned.iter().map(|(e, a)| (e.as_str(), *a))
    }

    /// Number of entities seen
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Check if no entity has been seen yet
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Decoder slots reserved per entity
    pub fn slots(&self) -> usize {
        self.slots
    }
}

/// Printable characters from `start` up to '~', then from '!' back up to
/// `start`, so every printable character is tried exactly once
fn walk_from(start: char) -> impl Iterator<Item = Alias> {
    let (first, last) = (FIRST_PRINTABLE as u32, LAST_PRINTABLE as u32);
    let start = (start as u32).clamp(first, last + 1);
    (start..=last)
        .chain(first..start)
        .filter_map(char::from_u32)
        .map(Alias)
}
