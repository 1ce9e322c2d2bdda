//! Per-kilometer inspection grades for one run.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::TableError;
use crate::table::{RawTable, TableSource, cell, coerce_integer};

pub const KILOMETER: &[&str] = &["КМ"];
pub const GRADE: &[&str] = &["ОЦЕНКА"];
pub const DIRECTION: &[&str] = &["КОДНАПР", "НАПРАВЛЕНИЕ"];
pub const TRACK: &[&str] = &["ПУТЬ"];

/// Track assigned to every record when the table has no track column.
pub const DEFAULT_TRACK: i64 = 1;

/// Default label of the sheet holding the grades inside a workbook.
pub const DEFAULT_SHEET_LABEL: &str = "Оценка КМ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InspectionRecord {
    pub direction_id: i64,
    pub track_id: i64,
    pub kilometer: i64,
    pub grade: i64,
}

impl InspectionRecord {
    pub fn new(direction_id: i64, track_id: i64, kilometer: i64, grade: i64) -> Self {
        Self {
            direction_id,
            track_id,
            kilometer,
            grade,
        }
    }
}

/// The cleaned records of one run, with a label for reports and logs.
#[derive(Debug, Clone, Default)]
pub struct InspectionRun {
    pub label: String,
    pub records: Vec<InspectionRecord>,
}

impl InspectionRun {
    pub fn new(label: impl Into<String>, records: Vec<InspectionRecord>) -> Self {
        Self {
            label: label.into(),
            records,
        }
    }
}

/// Converts a grade table into records.
///
/// Rows with a blank or non-integer kilometer, grade, direction or track are
/// dropped without error. Only structurally missing columns fail.
pub fn normalize(table: &RawTable) -> Result<Vec<InspectionRecord>, TableError> {
    let cols = table.require(&[
        ("КМ", KILOMETER),
        ("ОЦЕНКА", GRADE),
        ("КОДНАПР", DIRECTION),
    ])?;
    let (km_col, grade_col, dir_col) = (cols[0], cols[1], cols[2]);
    let track_col = table.column(TRACK);

    let mut dropped = 0usize;
    let mut records = Vec::with_capacity(table.len());
    for row in table.rows() {
        let record = (|| {
            let track_id = match track_col {
                Some(c) => coerce_integer(cell(row, c)?)?,
                None => DEFAULT_TRACK,
            };
            Some(InspectionRecord {
                direction_id: coerce_integer(cell(row, dir_col)?)?,
                track_id,
                kilometer: coerce_integer(cell(row, km_col)?)?,
                grade: coerce_integer(cell(row, grade_col)?)?,
            })
        })();
        match record {
            Some(r) => records.push(r),
            None => dropped += 1,
        }
    }

    debug!(
        kept = records.len(),
        dropped,
        has_track = track_col.is_some(),
        "Inspection rows normalized"
    );
    Ok(records)
}

/// Loads a run from a file, URL or workbook directory. In a workbook the
/// grades are taken from the sheet matching `sheet_label`.
#[tracing::instrument(skip(sheet_label))]
pub fn load_run(source: &str, sheet_label: &str) -> Result<InspectionRun, TableError> {
    let loaded = TableSource::load(source)?;
    let table = loaded.resolve(sheet_label)?;
    let records = normalize(table)?;
    info!(records = records.len(), "Inspection run loaded");
    Ok(InspectionRun::new(source, records))
}

/// Like [`load_run`], but a structural problem is logged as a warning and
/// the run is treated as absent. `role` names the run in the log line.
pub fn load_optional_run(source: &str, sheet_label: &str, role: &str) -> Option<InspectionRun> {
    match load_run(source, sheet_label) {
        Ok(run) => Some(run),
        Err(e) => {
            warn!(source, role, error = %e, "Run skipped");
            None
        }
    }
}
