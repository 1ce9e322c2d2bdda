use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::types::{GradeCounts, Segment, SegmentKey};
use crate::analyzers::utility::round2;
use crate::context::ReferenceContext;
use crate::inspection::{InspectionRecord, InspectionRun};
use crate::topology::Station;

/// Weight of each grade in the segment score. Grade 2 is a penalty and
/// weighs 5, not 2.
pub const WEIGHT_5: f64 = 5.0;
pub const WEIGHT_4: f64 = 4.0;
pub const WEIGHT_3: f64 = 3.0;
pub const PENALTY_2: f64 = 5.0;

/// Segment score (Nуч):
/// `round((5·s5 + 4·s4 + 3·s3 − 5·s2) / total, 2)`.
///
/// `total` includes kilometers with grades outside 2..=5, which add nothing
/// to the numerator. Returns `None` when there are no kilometers.
pub fn segment_score(counts: &GradeCounts) -> Option<f64> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    let weighted = WEIGHT_5 * counts.s5 as f64
        + WEIGHT_4 * counts.s4 as f64
        + WEIGHT_3 * counts.s3 as f64
        - PENALTY_2 * counts.s2 as f64;
    Some(round2(weighted / total as f64))
}

/// Kilometer range `[start, end]` of the segment between two consecutive
/// stations. The first station's own kilometer belongs to the previous
/// segment.
pub fn segment_range(a: &Station, b: &Station) -> (i64, i64) {
    (a.km() + 1, b.km())
}

/// Builds the segments of one direction and track.
///
/// `stations` must be sorted by position; `records` are the run's records for
/// this direction and track. Station pairs with no record in range produce
/// no segment.
pub fn aggregate_track(
    direction_id: i64,
    track_id: i64,
    stations: &[Station],
    records: &[&InspectionRecord],
) -> Vec<Segment> {
    stations
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let (km_start, km_end) = segment_range(a, b);

            let selected: Vec<&InspectionRecord> = records
                .iter()
                .copied()
                .filter(|r| (km_start..=km_end).contains(&r.kilometer))
                .collect();

            let counts = GradeCounts::from_grades(selected.iter().map(|r| r.grade));
            let score = segment_score(&counts)?;

            Some(Segment {
                key: SegmentKey {
                    direction_id,
                    track_id,
                    station_a: a.name.clone(),
                    station_b: b.name.clone(),
                },
                km_start,
                km_end,
                counts,
                total_km: counts.total(),
                score,
                grades: selected.iter().map(|r| (r.kilometer, r.grade)).collect(),
            })
        })
        .collect()
}

/// Builds every segment of a run, for each allowed direction and each track
/// the run has on it. Directions not on the allow-list are skipped.
///
/// Output order is direction, track, then station order.
#[tracing::instrument(skip_all, fields(run = %run.label))]
pub fn aggregate(context: &ReferenceContext, run: &InspectionRun) -> Vec<Segment> {
    let mut by_track: BTreeMap<(i64, i64), Vec<&InspectionRecord>> = BTreeMap::new();
    for record in &run.records {
        if context.is_allowed(record.direction_id) {
            by_track
                .entry((record.direction_id, record.track_id))
                .or_default()
                .push(record);
        }
    }

    let mut segments = Vec::new();
    for direction_id in context.directions() {
        let stations = context.topology().stations(direction_id);
        let tracks = by_track.range((direction_id, i64::MIN)..=(direction_id, i64::MAX));
        for ((_, track_id), records) in tracks {
            let built = aggregate_track(direction_id, *track_id, stations, records);
            debug!(direction_id, track_id, segments = built.len(), "Track aggregated");
            segments.extend(built);
        }
    }
    segments
}
