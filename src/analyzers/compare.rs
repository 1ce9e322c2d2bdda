use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::analyzers::types::{ComparisonResult, KmChange, Segment};
use crate::analyzers::utility::round2;

/// Kilometers inspected in both runs whose grade differs, ascending.
/// Kilometers present in only one run are not changes.
pub fn grade_changes(current: &BTreeMap<i64, i64>, prior: &BTreeMap<i64, i64>) -> Vec<KmChange> {
    current
        .iter()
        .filter_map(|(km, new_grade)| {
            let old_grade = prior.get(km)?;
            (old_grade != new_grade).then_some(KmChange {
                kilometer: *km,
                old_grade: *old_grade,
                new_grade: *new_grade,
            })
        })
        .collect()
}

/// Pairs each current segment with the prior segment of the same key.
///
/// A segment without a prior counterpart (no prior run, or a station renamed
/// between runs) gets `prior_score = score` and `delta = 0`, with
/// `has_history = false`.
pub fn compare(current: &[Segment], prior: Option<&[Segment]>) -> Vec<ComparisonResult> {
    let prior_by_key: HashMap<String, &Segment> = prior
        .unwrap_or_default()
        .iter()
        .map(|seg| (seg.key.to_string(), seg))
        .collect();

    let results: Vec<ComparisonResult> = current
        .iter()
        .map(|seg| match prior_by_key.get(&seg.key.to_string()) {
            Some(old) => ComparisonResult {
                segment: seg.clone(),
                prior_score: old.score,
                delta: round2(seg.score - old.score),
                has_history: true,
                changes: grade_changes(&seg.grades, &old.grades),
            },
            None => ComparisonResult {
                segment: seg.clone(),
                prior_score: seg.score,
                delta: 0.0,
                has_history: false,
                changes: Vec::new(),
            },
        })
        .collect();

    debug!(
        segments = results.len(),
        matched = results.iter().filter(|r| r.has_history).count(),
        "Runs compared"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{GradeCounts, SegmentKey};

    fn segment(a: &str, b: &str, score: f64, grades: &[(i64, i64)]) -> Segment {
        let grades: BTreeMap<i64, i64> = grades.iter().copied().collect();
        let counts = GradeCounts::from_grades(grades.values().copied());
        Segment {
            key: SegmentKey {
                direction_id: 24602,
                track_id: 1,
                station_a: a.to_string(),
                station_b: b.to_string(),
            },
            km_start: 11,
            km_end: 20,
            counts,
            total_km: counts.total(),
            score,
            grades,
        }
    }

    #[test]
    fn test_no_prior_means_zero_delta() {
        let current = vec![segment("А", "Б", 2.83, &[(15, 5)]), segment("Б", "В", 4.0, &[(25, 4)])];
        let results = compare(&current, None);
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.delta, 0.0);
            assert_eq!(r.prior_score, r.score());
            assert!(!r.has_history);
            assert!(r.changes.is_empty());
        }
    }

    #[test]
    fn test_matched_segment_delta_and_changes() {
        let prior = vec![segment("А", "Б", 3.5, &[(15, 5), (16, 4), (17, 3), (30, 2)])];
        let current = vec![segment("А", "Б", 2.83, &[(15, 5), (16, 2), (17, 4), (18, 5)])];

        let results = compare(&current, Some(prior.as_slice()));
        let r = &results[0];
        assert!(r.has_history);
        assert_eq!(r.prior_score, 3.5);
        assert_eq!(r.delta, -0.67);
        assert_eq!(
            r.changes,
            vec![
                KmChange {
                    kilometer: 16,
                    old_grade: 4,
                    new_grade: 2,
                },
                KmChange {
                    kilometer: 17,
                    old_grade: 3,
                    new_grade: 4,
                },
            ]
        );
    }

    #[test]
    fn test_renamed_station_has_no_history() {
        let prior = vec![segment("А", "Б", 3.0, &[(15, 5)])];
        let current = vec![segment("А", "Бе", 4.0, &[(15, 4)])];
        let results = compare(&current, Some(prior.as_slice()));
        let r = &results[0];
        assert!(!r.has_history);
        assert_eq!(r.delta, 0.0);
        assert_eq!(r.prior_score, 4.0);
    }

    #[test]
    fn test_track_is_part_of_identity() {
        let prior = vec![segment("А", "Б", 3.0, &[(15, 5)])];
        let mut other_track = segment("А", "Б", 4.0, &[(15, 4)]);
        other_track.key.track_id = 2;
        let results = compare(&[other_track], Some(prior.as_slice()));
        let r = &results[0];
        assert!(!r.has_history);
    }

    #[test]
    fn test_delta_rounded() {
        let prior = vec![segment("А", "Б", 4.33, &[])];
        let current = vec![segment("А", "Б", 4.67, &[])];
        assert_eq!(compare(&current, Some(prior.as_slice()))[0].delta, 0.34);
    }
}
