use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::analyzers::types::IntegrityGap;
use crate::inspection::InspectionRun;
use crate::structure::StructureRow;

/// Reports every structure row whose kilometer range is not fully present in
/// the run. Presence only: any grade value counts as inspected.
pub fn check(structure: &[StructureRow], run: &InspectionRun) -> Vec<IntegrityGap> {
    let mut present: HashMap<(i64, i64), BTreeSet<i64>> = HashMap::new();
    for record in &run.records {
        present
            .entry((record.direction_id, record.track_id))
            .or_default()
            .insert(record.kilometer);
    }
    let empty = BTreeSet::new();

    let gaps: Vec<IntegrityGap> = structure
        .iter()
        .filter_map(|row| {
            let actual = present
                .get(&(row.direction_id, row.track_id))
                .unwrap_or(&empty);
            let missing: Vec<i64> = (row.km_start..=row.km_end)
                .filter(|km| !actual.contains(km))
                .collect();
            (!missing.is_empty()).then(|| IntegrityGap {
                row: row.clone(),
                missing,
            })
        })
        .collect();

    debug!(rows = structure.len(), gaps = gaps.len(), "Integrity checked");
    gaps
}
