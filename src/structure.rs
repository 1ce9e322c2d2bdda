//! Administrative structure reference: the authoritative kilometer range each
//! maintenance unit is responsible for, per direction and track.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::table::{RawTable, TableSource, cell, coerce_integer};

pub const DIRECTION: &[&str] = &["КОДНАПР", "НАПРАВЛЕНИЕ"];
pub const TRACK: &[&str] = &["ПУТЬ"];
pub const KM_START: &[&str] = &["КМ НАЧ", "НАЧ КМ", "КМНАЧ"];
pub const KM_END: &[&str] = &["КМ КОН", "КОН КМ", "КМКОН"];
pub const LABEL: &[&str] = &["ПЧ", "ПОДРАЗДЕЛЕНИЕ", "НАИМЕНОВАНИЕ"];

/// Longest kilometer range a single structure row may cover. Wider rows are
/// data-entry errors and are dropped.
pub const MAX_SPAN_KM: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureRow {
    pub direction_id: i64,
    pub track_id: i64,
    pub km_start: i64,
    pub km_end: i64,
    pub label: String,
}

/// Parses a structure table. Rows with a missing numeric field or a range
/// wider than [`MAX_SPAN_KM`] are dropped; a reversed range is stored with its
/// bounds swapped.
pub fn from_table(table: &RawTable) -> Result<Vec<StructureRow>> {
    let cols = table
        .require(&[
            ("КОДНАПР", DIRECTION),
            ("ПУТЬ", TRACK),
            ("КМ НАЧ", KM_START),
            ("КМ КОН", KM_END),
        ])
        .context("structure table is missing required columns")?;
    let label_col = table.column(LABEL);

    let mut oversized = 0usize;
    let rows: Vec<StructureRow> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let start = coerce_integer(cell(row, cols[2])?)?;
            let end = coerce_integer(cell(row, cols[3])?)?;
            let (km_start, km_end) = (start.min(end), start.max(end));
            if km_end.checked_sub(km_start).is_none_or(|span| span > MAX_SPAN_KM) {
                oversized += 1;
                return None;
            }
            Some(StructureRow {
                direction_id: coerce_integer(cell(row, cols[0])?)?,
                track_id: coerce_integer(cell(row, cols[1])?)?,
                km_start,
                km_end,
                label: label_col
                    .and_then(|c| cell(row, c))
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect();

    if oversized > 0 {
        warn!(
            oversized,
            max_span_km = MAX_SPAN_KM,
            "Structure rows with oversized ranges dropped"
        );
    }
    debug!(
        kept = rows.len(),
        dropped = table.len() - rows.len(),
        "Structure rows parsed"
    );
    Ok(rows)
}

/// Loads the structure reference. Failure is fatal for the integrity check.
#[tracing::instrument]
pub fn load(source: &str) -> Result<Vec<StructureRow>> {
    let loaded = TableSource::load(source)
        .with_context(|| format!("structure reference '{source}' is unavailable"))?;
    let table = loaded
        .primary()
        .with_context(|| format!("structure reference '{source}' has no sheets"))?;
    let rows = from_table(table)
        .with_context(|| format!("structure reference '{source}' is unusable"))?;
    info!(rows = rows.len(), "Structure reference loaded");
    Ok(rows)
}
