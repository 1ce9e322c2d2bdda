//! Data types produced by the aggregation pipeline.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::tier::ScoreTier;
use crate::structure::StructureRow;

/// Identity of a segment across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SegmentKey {
    pub direction_id: i64,
    pub track_id: i64,
    pub station_a: String,
    pub station_b: String,
}

impl SegmentKey {
    /// `"A - B"`, the segment name shown in reports.
    pub fn label(&self) -> String {
        format!("{} - {}", self.station_a, self.station_b)
    }
}

/// `direction_track_stationA_stationB`
impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.direction_id, self.track_id, self.station_a, self.station_b
        )
    }
}

/// Number of kilometers per grade. `other` holds grades outside 2..=5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    pub s5: usize,
    pub s4: usize,
    pub s3: usize,
    pub s2: usize,
    pub other: usize,
}

impl GradeCounts {
    pub fn from_grades(grades: impl IntoIterator<Item = i64>) -> Self {
        let mut counts = Self::default();
        for grade in grades {
            counts.add(grade);
        }
        counts
    }

    pub fn add(&mut self, grade: i64) {
        match grade {
            5 => self.s5 += 1,
            4 => self.s4 += 1,
            3 => self.s3 += 1,
            2 => self.s2 += 1,
            _ => self.other += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.s5 + self.s4 + self.s3 + self.s2 + self.other
    }
}

/// Track interval between two consecutive stations on one direction and
/// track, with its inspection results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub key: SegmentKey,
    pub km_start: i64,
    pub km_end: i64,
    pub counts: GradeCounts,
    pub total_km: usize,
    pub score: f64,
    /// Grade per inspected kilometer
    #[serde(skip)]
    pub grades: BTreeMap<i64, i64>,
}

impl Segment {
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KmChange {
    pub kilometer: i64,
    pub old_grade: i64,
    pub new_grade: i64,
}

impl fmt::Display for KmChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}→{}", self.kilometer, self.old_grade, self.new_grade)
    }
}

/// A current-run segment paired with its prior-run counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub segment: Segment,
    pub prior_score: f64,
    pub delta: f64,
    /// Whether a prior segment with the same key was found. Without one,
    /// `prior_score` equals the current score and `delta` is 0.
    pub has_history: bool,
    pub changes: Vec<KmChange>,
}

impl ComparisonResult {
    pub fn score(&self) -> f64 {
        self.segment.score
    }
}

/// Structure row whose kilometer range is not fully covered by the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityGap {
    pub row: StructureRow,
    pub missing: Vec<i64>,
}

impl IntegrityGap {
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub segments: usize,
    pub mean_score: f64,
    pub tiers: BTreeMap<ScoreTier, usize>,
    pub improved: usize,
    pub worsened: usize,
    pub without_history: usize,
}

/// Segment report for one run, worst segments first.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub current_run: String,
    pub prior_run: Option<String>,
    pub summary: ReportSummary,
    pub rows: Vec<ComparisonResult>,
}

impl Report {
    /// Whether a prior run took part. Comparison columns are only reported
    /// when it did.
    pub fn has_comparison(&self) -> bool {
        self.prior_run.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
