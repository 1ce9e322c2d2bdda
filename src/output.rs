//! Report rendering and persistence.
//!
//! Supports the segment report as CSV (with tier colouring columns) and JSON,
//! the integrity-gap CSV, and log summaries. A path of `-` writes to stdout.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{ComparisonResult, IntegrityGap, Report};

/// Default file name of the exported segment report.
pub const DEFAULT_REPORT: &str = "Nуч_по_перегонам.csv";

const SEGMENT_COLUMNS: &[&str] = &[
    "Направление",
    "Путь",
    "Перегон",
    "КМ нач",
    "КМ кон",
    "5 (Отл)",
    "4 (Хор)",
    "3 (Удов)",
    "2 (Неуд)",
    "Всего КМ",
    "Nуч",
    "Категория",
    "Цвет",
];

const COMPARISON_COLUMNS: &[&str] = &["Nуч пред", "Δ Nуч", "История", "Изменения КМ"];

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(std::io::stdout().lock()));
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("cannot create {path}"))?;
    Ok(Box::new(file))
}

/// `"16: 4→2; 17: 3→4"`
pub fn format_changes(row: &ComparisonResult) -> String {
    row.changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn segment_record(row: &ComparisonResult, with_comparison: bool) -> Vec<String> {
    let seg = &row.segment;
    let tier = seg.tier();
    let mut record = vec![
        seg.key.direction_id.to_string(),
        seg.key.track_id.to_string(),
        seg.key.label(),
        seg.km_start.to_string(),
        seg.km_end.to_string(),
        seg.counts.s5.to_string(),
        seg.counts.s4.to_string(),
        seg.counts.s3.to_string(),
        seg.counts.s2.to_string(),
        seg.total_km.to_string(),
        seg.score.to_string(),
        tier.label().to_string(),
        tier.fill_color().to_string(),
    ];
    if with_comparison {
        record.push(row.prior_score.to_string());
        record.push(row.delta.to_string());
        record.push(if row.has_history { "да" } else { "нет истории" }.to_string());
        record.push(format_changes(row));
    }
    record
}

/// Writes one row per segment, worst first. Comparison columns are added
/// only when the report has a prior run.
#[tracing::instrument(skip(report), fields(rows = report.rows.len()))]
pub fn write_report_csv(path: &str, report: &Report) -> Result<()> {
    let with_comparison = report.has_comparison();
    let mut writer = WriterBuilder::new().from_writer(open_output(path)?);

    let mut header: Vec<&str> = SEGMENT_COLUMNS.to_vec();
    if with_comparison {
        header.extend_from_slice(COMPARISON_COLUMNS);
    }
    writer.write_record(&header)?;

    for row in &report.rows {
        writer.write_record(segment_record(row, with_comparison))?;
    }
    writer.flush()?;

    debug!(path, with_comparison, "Segment report written");
    Ok(())
}

/// Writes the whole report, summary included, as pretty-printed JSON.
pub fn write_report_json(path: &str, report: &Report) -> Result<()> {
    let mut out = open_output(path)?;
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()?;
    debug!(path, "JSON report written");
    Ok(())
}

#[derive(Debug, Serialize)]
struct IntegrityRow<'a> {
    #[serde(rename = "Направление")]
    direction_id: i64,
    #[serde(rename = "Путь")]
    track_id: i64,
    #[serde(rename = "ПЧ")]
    label: &'a str,
    #[serde(rename = "КМ нач")]
    km_start: i64,
    #[serde(rename = "КМ кон")]
    km_end: i64,
    #[serde(rename = "Пропущено КМ")]
    missing_count: usize,
    #[serde(rename = "Пропущенные КМ")]
    missing: String,
}

impl<'a> From<&'a IntegrityGap> for IntegrityRow<'a> {
    fn from(gap: &'a IntegrityGap) -> Self {
        IntegrityRow {
            direction_id: gap.row.direction_id,
            track_id: gap.row.track_id,
            label: &gap.row.label,
            km_start: gap.row.km_start,
            km_end: gap.row.km_end,
            missing_count: gap.missing_count(),
            missing: gap
                .missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Writes one row per structure segment with missing kilometers.
pub fn write_integrity_csv(path: &str, gaps: &[IntegrityGap]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(open_output(path)?);
    for gap in gaps {
        writer.serialize(IntegrityRow::from(gap))?;
    }
    writer.flush()?;
    debug!(path, gaps = gaps.len(), "Integrity report written");
    Ok(())
}

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Logs the summary and the `worst` lowest-scoring segments.
pub fn log_summary(report: &Report, worst: usize) {
    let summary = &report.summary;
    info!(
        current = %report.current_run,
        prior = report.prior_run.as_deref().unwrap_or("-"),
        segments = summary.segments,
        mean_score = summary.mean_score,
        improved = summary.improved,
        worsened = summary.worsened,
        without_history = summary.without_history,
        "Report summary"
    );
    for (tier, count) in &summary.tiers {
        info!(tier = tier.label(), count, "Tier");
    }
    for row in report.rows.iter().take(worst) {
        info!(
            segment = %row.segment.key.label(),
            direction = row.segment.key.direction_id,
            track = row.segment.key.track_id,
            score = row.score(),
            delta = row.delta,
            "Worst segment"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::analyze;
    use crate::context::ReferenceContext;
    use crate::inspection::{InspectionRecord, InspectionRun};
    use crate::structure::StructureRow;
    use crate::topology::{Station, Topology};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn report(with_prior: bool) -> Report {
        let stations = [(10.0, "А"), (20.0, "Б"), (30.0, "В")].map(|(position, name)| Station {
            direction_id: 24602,
            position,
            name: name.to_string(),
        });
        let ctx = ReferenceContext::new(Topology::from_stations(stations), [24602]);
        let current = InspectionRun::new(
            "current.csv",
            vec![
                InspectionRecord::new(24602, 1, 15, 5),
                InspectionRecord::new(24602, 1, 16, 2),
                InspectionRecord::new(24602, 1, 25, 4),
            ],
        );
        let prior = InspectionRun::new(
            "prior.csv",
            vec![
                InspectionRecord::new(24602, 1, 15, 5),
                InspectionRecord::new(24602, 1, 16, 4),
            ],
        );
        analyze(&ctx, &current, with_prior.then_some(&prior))
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&report(false));
    }

    #[test]
    fn test_log_summary_does_not_panic() {
        log_summary(&report(true), 3);
    }

    #[test]
    fn test_report_csv_without_comparison() {
        let path = temp_path("track_rater_output_plain.csv");
        let _ = fs::remove_file(&path);

        write_report_csv(&path, &report(false)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Направление,Путь,Перегон"));
        assert!(!lines[0].contains("Δ Nуч"));
        // А - Б scores 0 and comes first
        assert!(lines[1].contains("А - Б"));
        assert!(lines[1].contains("неудовлетворительно"));
        assert!(lines[2].contains("Б - В"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_report_csv_with_comparison() {
        let path = temp_path("track_rater_output_compare.csv");
        let _ = fs::remove_file(&path);

        write_report_csv(&path, &report(true)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert!(lines[0].ends_with("Nуч пред,Δ Nуч,История,Изменения КМ"));
        assert!(lines[1].ends_with("4.5,-4.5,да,16: 4→2"));
        assert!(lines[2].ends_with(",0,нет истории,"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_report_json() {
        let path = temp_path("track_rater_output_report.json");
        let _ = fs::remove_file(&path);

        write_report_json(&path, &report(true)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["current_run"], "current.csv");
        assert_eq!(value["summary"]["segments"], 2);
        assert_eq!(value["summary"]["tiers"]["poor"], 1);
        assert_eq!(value["rows"][0]["segment"]["key"]["station_a"], "А");
        assert_eq!(value["rows"][0]["changes"][0]["kilometer"], 16);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_integrity_csv() {
        let path = temp_path("track_rater_output_gaps.csv");
        let _ = fs::remove_file(&path);

        let gaps = vec![IntegrityGap {
            row: StructureRow {
                direction_id: 24602,
                track_id: 1,
                km_start: 100,
                km_end: 105,
                label: "ПЧ-1".into(),
            },
            missing: vec![102, 104],
        }];
        write_integrity_csv(&path, &gaps).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Направление,Путь,ПЧ,КМ нач,КМ кон,Пропущено КМ,Пропущенные КМ"
        );
        assert_eq!(lines[1], "24602,1,ПЧ-1,100,105,2,\"102, 104\"");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_output_creates_parent_dirs() {
        let dir = temp_path("track_rater_output_nested");
        let _ = fs::remove_dir_all(&dir);
        let path = format!("{dir}/reports/out.csv");

        write_integrity_csv(&path, &[]).unwrap();
        assert!(Path::new(&path).exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
