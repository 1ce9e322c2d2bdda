use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::Utc;
use tracing::info;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::compare::compare;
use crate::analyzers::integrity::check;
use crate::analyzers::tier::ScoreTier;
use crate::analyzers::types::{ComparisonResult, IntegrityGap, Report, ReportSummary};
use crate::analyzers::utility::{mean, round2};
use crate::context::ReferenceContext;
use crate::inspection::InspectionRun;

/// Scores the current run per segment and compares it with the prior run when
/// one is given. Rows come back worst first.
#[tracing::instrument(
    skip_all,
    fields(current = %current.label, prior = prior.map(|p| p.label.as_str()))
)]
pub fn analyze(
    context: &ReferenceContext,
    current: &InspectionRun,
    prior: Option<&InspectionRun>,
) -> Report {
    let current_segments = aggregate(context, current);
    let prior_segments = prior.map(|run| aggregate(context, run));

    let mut rows = compare(&current_segments, prior_segments.as_deref());
    sort_worst_first(&mut rows);
    let summary = summarize(&rows);

    info!(
        segments = summary.segments,
        mean_score = summary.mean_score,
        prior_segments = prior_segments.as_ref().map(Vec::len),
        "Analysis complete"
    );

    Report {
        generated_at: Utc::now(),
        current_run: current.label.clone(),
        prior_run: prior.map(|run| run.label.clone()),
        summary,
        rows,
    }
}

/// Ascending by score; ties by direction, track, then start kilometer.
pub fn sort_worst_first(rows: &mut [ComparisonResult]) {
    rows.sort_by(|a, b| {
        a.score()
            .total_cmp(&b.score())
            .then_with(|| a.segment.key.direction_id.cmp(&b.segment.key.direction_id))
            .then_with(|| a.segment.key.track_id.cmp(&b.segment.key.track_id))
            .then_with(|| a.segment.km_start.cmp(&b.segment.km_start))
    });
}

pub fn summarize(rows: &[ComparisonResult]) -> ReportSummary {
    let scores: Vec<f64> = rows.iter().map(ComparisonResult::score).collect();

    let mut tiers: BTreeMap<ScoreTier, usize> = ScoreTier::ALL.iter().map(|t| (*t, 0)).collect();
    for row in rows {
        *tiers.entry(row.segment.tier()).or_default() += 1;
    }

    ReportSummary {
        segments: rows.len(),
        mean_score: round2(mean(&scores)),
        tiers,
        improved: rows.iter().filter(|r| r.has_history && r.delta > 0.0).count(),
        worsened: rows.iter().filter(|r| r.has_history && r.delta < 0.0).count(),
        without_history: rows.iter().filter(|r| !r.has_history).count(),
    }
}

/// Checks the run's kilometer coverage against the structure reference held
/// by `context`.
///
/// # Errors
///
/// Fails when the context was built without a structure reference.
#[tracing::instrument(skip_all, fields(run = %run.label))]
pub fn check_integrity(
    context: &ReferenceContext,
    run: &InspectionRun,
) -> Result<Vec<IntegrityGap>> {
    let structure = context
        .structure()
        .ok_or_else(|| anyhow!("no structure reference configured"))?;
    let gaps = check(structure, run);
    info!(
        structure_rows = structure.len(),
        gaps = gaps.len(),
        missing_km = gaps.iter().map(IntegrityGap::missing_count).sum::<usize>(),
        "Integrity check complete"
    );
    Ok(gaps)
}
