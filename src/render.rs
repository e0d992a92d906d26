// Seelevel - Segment decoding workbench
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Text strip chart
//!
//! Each output line shows the running view of decoded levels: every alias is
//! drawn at a column proportional to its level, followed by numeric labels.
//!
//! ```text
//! 01/01/24 00:00:00 -                         w  W              - W 4.0  w 3.5
//! ```

use std::io::Write;

use chrono::{DateTime, FixedOffset, Local};

use crate::alias::{Alias, AliasAllocator};
use crate::collator::CollatedSnapshot;
use crate::config::RenderConfig;
use crate::sample::LevelMap;

/// strftime layout of the timestamp column
pub const TIME_FORMAT: &str = "%d/%m/%y %H:%M:%S";

/// Renders collated snapshots as strip chart lines
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    /// Last known level per alias across all snapshots so far
    view: LevelMap,
    /// View at the last emitted line
    last_emitted: Option<LevelMap>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            view: LevelMap::new(),
            last_emitted: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Current running view
    pub fn view(&self) -> &LevelMap {
        &self.view
    }

    /// Legend lines `A: entity`, one per allocated alias
    pub fn legend(&self, allocator: &AliasAllocator) -> Vec<String> {
        allocator
            .legend()
            .map(|(entity, alias)| format!("{}: {}", alias, entity))
            .collect()
    }

    /// Merge a snapshot into the running view.
    ///
    /// Returns the lines to print, or `None` when the view did not change
    /// since the last emitted line.
    pub fn render(&mut self, snapshot: &CollatedSnapshot) -> Option<Vec<String>> {
        self.view.merge(&snapshot.levels);
        if self.last_emitted.as_ref() == Some(&self.view) {
            return None;
        }
        self.last_emitted = Some(self.view.clone());

        let mut lines = vec![format!(
            "{} -{}-{}",
            self.format_time(&snapshot.anchor),
            self.strip(),
            self.labels()
        )];
        if self.config.show_raw {
            lines.extend(raw_lines(snapshot));
        }
        Some(lines)
    }

    /// Write the legend, a blank line and every changed snapshot.
    ///
    /// Returns the number of chart lines written.
    pub fn write_chart<W: Write>(
        &mut self,
        allocator: &AliasAllocator,
        snapshots: &[CollatedSnapshot],
        out: &mut W,
    ) -> std::io::Result<usize> {
        for line in self.legend(allocator) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;

        let mut emitted = 0;
        for snapshot in snapshots {
            if let Some(lines) = self.render(snapshot) {
                tracing::debug!(anchor = %snapshot.anchor, merged = snapshot.merged, "chart line");
                for line in lines {
                    writeln!(out, "{}", line)?;
                }
                emitted += 1;
            } else {
                tracing::trace!(anchor = %snapshot.anchor, "no change, line suppressed");
            }
        }
        Ok(emitted)
    }

    fn format_time(&self, time: &DateTime<FixedOffset>) -> String {
        match self.config.utc_offset {
            Some(offset) => time.with_timezone(&offset).format(TIME_FORMAT).to_string(),
            None => time.with_timezone(&Local).format(TIME_FORMAT).to_string(),
        }
    }

    /// Column for a level, or a boundary marker position when out of range
    fn place(&self, level: f64) -> Placement {
        let width = self.config.width;
        let pos = ((level / self.config.max_level) * (width - 3) as f64).round();
        if pos < 0.0 {
            Placement::Below
        } else if pos > (width - 2) as f64 {
            Placement::Above
        } else {
            Placement::Column(pos as usize + 1)
        }
    }

    fn strip(&self) -> String {
        let width = self.config.width;
        let mut strip = vec![' '; width];
        for (alias, level) in self.view.iter() {
            let Some(level) = *level else { continue };
            match self.place(level) {
                Placement::Below => strip[0] = '<',
                Placement::Above => strip[width - 1] = '>',
                Placement::Column(col) => strip[col] = alias.as_char(),
            }
        }
        strip.into_iter().collect()
    }

    fn labels(&self) -> String {
        let mut labels = String::new();
        for (alias, level) in self.view.iter() {
            let Some(level) = *level else { continue };
            match self.volume(alias, level) {
                Some(volume) => {
                    labels.push_str(&format!(" {} {:.1} ({:.0} L) ", alias, level, volume))
                }
                None => labels.push_str(&format!(" {} {:.1} ", alias, level)),
            }
        }
        for &(a, b) in &self.config.pairs {
            if let (Some(Some(x)), Some(Some(y))) = (self.view.get(a), self.view.get(b)) {
                labels.push_str(&format!(" {}+{} {:.1} ", a, b, x + y));
            }
        }
        labels
    }

    fn volume(&self, alias: Alias, level: f64) -> Option<f64> {
        self.config
            .volumes
            .iter()
            .find(|(a, _)| *a == alias)
            .and_then(|(_, map)| map.estimate(level))
    }
}

enum Placement {
    Below,
    Above,
    Column(usize),
}

/// Dimmed raw segment vectors of a snapshot, sorted by alias
fn raw_lines(snapshot: &CollatedSnapshot) -> Vec<String> {
    let mut raw: Vec<_> = snapshot.raw.iter().collect();
    raw.sort_by_key(|(alias, _)| *alias);
    raw.into_iter()
        .map(|(alias, segments)| {
            let text = match segments {
                Some(s) => format!("{:?}", s),
                None => "None".to_string(),
            };
            format!("  \u{1b}[2m{}: {}\u{1b}[0m", alias, text)
        })
        .collect()
}
