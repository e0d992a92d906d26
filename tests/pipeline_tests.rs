// Seelevel - Segment decoding workbench
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! End-to-end tests for the decoding pipeline
//!
//! History exports are written to temporary files and run through the
//! whole pipeline: parse, decode, collate, render.

use std::io::Write;

use chrono::FixedOffset;
use seelevel::{
    Alias, CollatorConfig, DecoderChoice, Pipeline, PipelineConfig, RenderConfig, RowError,
    SeelevelError,
};
use tempfile::NamedTempFile;

const HEADER: &str = "entity_id,state,last_changed";

// ============================================================================
// Helper Functions
// ============================================================================

fn history_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

fn utc_config(decoders: Vec<DecoderChoice>) -> PipelineConfig {
    PipelineConfig {
        decoders,
        render: RenderConfig::with_offset(FixedOffset::east_opt(0).unwrap()),
        ..Default::default()
    }
}

fn run(config: PipelineConfig, file: &NamedTempFile) -> (String, seelevel::RunSummary) {
    let mut out = Vec::new();
    let summary = Pipeline::new(config)
        .unwrap()
        .run_path(file.path(), &mut out)
        .unwrap();
    (String::from_utf8(out).unwrap(), summary)
}

fn chart_lines(output: &str) -> Vec<&str> {
    output
        .split("\n\n")
        .nth(1)
        .map(|chart| chart.lines().collect())
        .unwrap_or_default()
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_stepwise_single_tank() {
    let file = history_file(&["tank1,\"512,500,480,300,50,10,5,0,0\",2024-01-01T00:00:00+00:00"]);
    let (output, summary) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    assert_eq!(summary.samples, 1);
    assert!(summary.skipped.is_empty());
    assert!(output.starts_with("W: tank1\n\n"));

    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("01/01/24 00:00:00 -"));
    assert!(lines[0].ends_with("- W 4.0 "));
}

#[test]
fn test_two_decoders_side_by_side() {
    let file = history_file(&[
        "sensor.gray_tank,\"512,500,480,300,50,10,5,0,0\",2024-01-01T00:00:00+00:00",
    ]);
    let (output, _) = run(
        utc_config(vec![DecoderChoice::Stepwise, DecoderChoice::BoundaryTracking]),
        &file,
    );

    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" G 4.0  g 3.5 "));
}

#[test]
fn test_proportional_decoder_selected() {
    let file = history_file(&["tank1,\"180,180,180,180,180,180,100,20,20\",2024-01-01T00:00:00Z"]);
    let (output, _) = run(
        utc_config(vec![
            DecoderChoice::Stepwise,
            DecoderChoice::Proportional { mix: 0.6 },
        ]),
        &file,
    );

    // thresh = 20 + 160 * 0.6 = 116, (100 - 20) / 96 -> 6.8
    let lines = chart_lines(&output);
    assert!(lines[0].ends_with(" W 6.0  w 6.8 "));
}

#[test]
fn test_unknown_state_is_absent_but_processing_continues() {
    let file = history_file(&[
        "tank1,unknown,2024-01-01T00:00:00Z",
        "tank1,\"200,200,200,200,0,0,0,0,0\",2024-01-01T00:01:00Z",
    ]);
    let (output, summary) = run(
        utc_config(vec![DecoderChoice::Stepwise, DecoderChoice::BoundaryTracking]),
        &file,
    );

    assert_eq!(summary.samples, 2);
    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 2);
    // First line has no defined level: empty strip, no labels
    assert_eq!(lines[0], format!("01/01/24 00:00:00 -{}-", " ".repeat(60)));
    assert!(lines[1].contains(" W 4.0 "));
}

// ============================================================================
// Collation and rendering
// ============================================================================

#[test]
fn test_entities_collated_into_one_line() {
    let file = history_file(&[
        "sensor.fresh,\"200,200,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
        "sensor.grey,\"200,200,200,0,0,0,0,0,0\",2024-01-01T00:00:14Z",
    ]);
    let (output, summary) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    assert_eq!(summary.snapshots, 1);
    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" F 2.0  G 3.0  F+G 5.0 "));
}

#[test]
fn test_entities_outside_window_render_separately() {
    let file = history_file(&[
        "sensor.fresh,\"200,200,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
        "sensor.grey,\"200,200,200,0,0,0,0,0,0\",2024-01-01T00:00:16Z",
    ]);
    let (output, summary) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    assert_eq!(summary.snapshots, 2);
    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" F 2.0 "));
    assert!(lines[1].ends_with(" F 2.0  G 3.0  F+G 5.0 "));
}

#[test]
fn test_unchanged_levels_suppressed() {
    let file = history_file(&[
        "tank1,\"200,200,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
        "tank1,\"201,210,0,0,0,0,0,0,0\",2024-01-01T00:05:00Z",
        "tank1,\"200,200,200,0,0,0,0,0,0\",2024-01-01T00:10:00Z",
    ]);
    let (output, summary) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    assert_eq!(summary.snapshots, 3);
    assert_eq!(summary.lines, 2);
    assert_eq!(chart_lines(&output).len(), 2);
}

#[test]
fn test_rows_sorted_by_timestamp() {
    let file = history_file(&[
        "tank1,\"200,200,200,0,0,0,0,0,0\",2024-01-01T01:00:00Z",
        "tank1,\"200,0,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
    ]);
    let (output, _) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    let lines = chart_lines(&output);
    assert!(lines[0].starts_with("01/01/24 00:00:00"));
    assert!(lines[0].ends_with(" W 1.0 "));
    assert!(lines[1].starts_with("01/01/24 01:00:00"));
}

#[test]
fn test_custom_window_and_pairs() {
    let file = history_file(&[
        "tank_a,\"200,0,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
        "tank_b,\"200,200,0,0,0,0,0,0,0\",2024-01-01T00:00:40Z",
    ]);
    let config = PipelineConfig {
        decoders: vec![DecoderChoice::Stepwise],
        collation: CollatorConfig::with_window_secs(60),
        render: RenderConfig {
            pairs: vec![(Alias::new('W'), Alias::new('X'))],
            ..RenderConfig::with_offset(FixedOffset::east_opt(0).unwrap())
        },
        ..Default::default()
    };
    let (output, _) = run(config, &file);

    assert!(output.starts_with("W: tank_a\nX: tank_b\n\n"));
    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" W 1.0  X 2.0  W+X 3.0 "));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_rows_reported_and_skipped() {
    let file = history_file(&[
        "tank1,\"200,200,0,0,0,0,0,0,0\"",
        "tank1,\"200,x,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
        "tank1,\"200,200\",2024-01-01T00:00:00Z",
        "tank1,,2024-01-01T00:00:00Z",
        "tank1,\"200,200,0,0,0,0,0,0,0\",not-a-time",
        "tank1,\"200,200,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z",
    ]);
    let (output, summary) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    assert_eq!(summary.rows, 6);
    assert_eq!(summary.samples, 1);
    let errors: Vec<_> = summary.skipped.iter().map(|i| i.error.clone()).collect();
    assert!(matches!(errors[0], RowError::FieldCount { .. }));
    assert!(matches!(errors[1], RowError::InvalidSegment { .. }));
    assert!(matches!(errors[2], RowError::SegmentCount { .. }));
    assert_eq!(errors[3], RowError::EmptyState);
    assert!(matches!(errors[4], RowError::InvalidTimestamp { .. }));
    assert_eq!(chart_lines(&output).len(), 1);
}

#[test]
fn test_undecodable_row_does_not_stop_run() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "tank1,\"200,0,0,0,0,0,0,0,0\",2024-01-01T00:00:00Z").unwrap();
    file.write_all(b"tank\xff,\"200,0,0,0,0,0,0,0,0\",2024-01-01T00:01:00Z\n")
        .unwrap();
    writeln!(file, "tank1,\"200,200,0,0,0,0,0,0,0\",2024-01-01T00:02:00Z").unwrap();
    file.flush().unwrap();

    let (output, summary) = run(utc_config(vec![DecoderChoice::Stepwise]), &file);

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.samples, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].line, 3);
    assert!(matches!(summary.skipped[0].error, RowError::Encoding { .. }));
    assert!(output.starts_with("W: tank1\n\n"));
    let lines = chart_lines(&output);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" W 1.0 "));
    assert!(lines[1].ends_with(" W 2.0 "));
}

#[test]
fn test_header_mismatch_fails_run() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "entity_id,state,last_updated").unwrap();
    writeln!(file, "tank1,unknown,2024-01-01T00:00:00Z").unwrap();
    file.flush().unwrap();

    let mut out = Vec::new();
    let result = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_path(file.path(), &mut out);
    assert!(matches!(result, Err(SeelevelError::Format(_))));
    assert!(out.is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let mut out = Vec::new();
    let result = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_path("/nonexistent/history.csv", &mut out);
    assert!(matches!(result, Err(SeelevelError::Io(_))));
}

fn unknown_rows(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("tank{},unknown,2024-01-01T00:{:02}:00Z", i, i))
        .collect()
}

#[test]
fn test_many_unmatched_entities_with_two_decoders() {
    let rows = unknown_rows(5);
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = history_file(&refs);

    let (output, summary) = run(
        utc_config(vec![DecoderChoice::Stepwise, DecoderChoice::BoundaryTracking]),
        &file,
    );
    assert_eq!(summary.samples, 5);
    assert!(output.starts_with("W: tank0\nX: tank1\nY: tank2\nZ: tank3\nA: tank4\n\n"));
}

#[test]
fn test_allocator_exhaustion_is_fatal() {
    let rows = unknown_rows(27);
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = history_file(&refs);

    // Two decoder slots: only the 26 letters with a distinct lowercase form
    let mut out = Vec::new();
    let result = Pipeline::new(utc_config(vec![
        DecoderChoice::Stepwise,
        DecoderChoice::BoundaryTracking,
    ]))
    .unwrap()
    .run_path(file.path(), &mut out);
    assert!(matches!(
        result,
        Err(SeelevelError::AllocatorExhausted { .. })
    ));
    assert!(out.is_empty());
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_repeated_runs_are_identical() {
    let file = history_file(&[
        "sensor.fresh,\"250,240,230,220,130,100,40,0,0\",2024-01-01T00:00:00+01:00",
        "sensor.gray,\"250,240,100,0,0,0,0,0,0\",2024-01-01T00:00:05+01:00",
        "sensor.black,unavailable,2024-01-01T00:00:09+01:00",
        "sensor.fresh,\"250,240,230,220,210,100,40,0,0\",2024-01-01T00:30:00+01:00",
        "sensor.gray,\"250,240,230,0,0,0,0,0,0\",2024-01-01T01:00:00+01:00",
    ]);
    let config = || utc_config(vec![DecoderChoice::Stepwise, DecoderChoice::BoundaryTracking]);

    let (first, _) = run(config(), &file);
    let (second, _) = run(config(), &file);
    assert_eq!(first, second);
    assert!(first.starts_with("F: sensor.fresh\nG: sensor.gray\nB: sensor.black\n\n"));
}
