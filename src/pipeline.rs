// Seelevel - Segment decoding workbench
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! End-to-end pipeline
//!
//! history rows → [`RecordParser`] → [`SampleBuilder`] → [`Collator`] →
//! [`Renderer`] → text.
//!
//! Nothing is written until every row has been read and decoded, so fatal
//! errors (header mismatch, alias exhaustion) never leave partial output.

use std::io::{Read, Write};
use std::path::Path;

use crate::collator::Collator;
use crate::config::PipelineConfig;
use crate::decoder::DecoderSet;
use crate::error::{Result, RowIssue};
use crate::history::HistoryReader;
use crate::record::RecordParser;
use crate::render::Renderer;
use crate::sample::SampleBuilder;

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Data rows read (header excluded)
    pub rows: usize,
    /// Samples decoded
    pub samples: usize,
    /// Snapshots after collation
    pub snapshots: usize,
    /// Chart lines emitted
    pub lines: usize,
    /// Rows skipped, with reasons
    pub skipped: Vec<RowIssue>,
}

/// A configured decoding run
#[derive(Debug)]
pub struct Pipeline {
    reader: HistoryReader,
    builder: SampleBuilder,
    collator: Collator,
    renderer: Renderer,
}

impl Pipeline {
    /// Validate the configuration and build every stage
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let decoders = DecoderSet::from_choices(&config.decoders)?;
        tracing::debug!(decoders = ?decoders, segments = config.segment_count, "pipeline configured");

        Ok(Self {
            reader: HistoryReader::new(RecordParser::new(config.segment_count)),
            builder: SampleBuilder::new(decoders),
            collator: Collator::new(&config.collation),
            renderer: Renderer::new(config.render),
        })
    }

    /// Run over a history file on disk
    pub fn run_path<P: AsRef<Path>, W: Write>(self, path: P, out: &mut W) -> Result<RunSummary> {
        let file = std::fs::File::open(path)?;
        self.run(file, out)
    }

    /// Run over a history export, writing the chart to `out`
    pub fn run<R: Read, W: Write>(mut self, input: R, out: &mut W) -> Result<RunSummary> {
        let history = self.reader.read(input)?;

        let samples = history
            .records
            .into_iter()
            .map(|record| self.builder.build(record))
            .collect::<Result<Vec<_>>>()?;
        let sample_count = samples.len();

        let snapshots = self.collator.collate(samples);
        let lines = self
            .renderer
            .write_chart(self.builder.allocator(), &snapshots, out)?;
        out.flush()?;

        let summary = RunSummary {
            rows: history.rows_read,
            samples: sample_count,
            snapshots: snapshots.len(),
            lines,
            skipped: history.issues,
        };
        tracing::info!(
            rows = summary.rows,
            samples = summary.samples,
            snapshots = summary.snapshots,
            lines = summary.lines,
            skipped = summary.skipped.len(),
            "run complete"
        );
        Ok(summary)
    }
}
