use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::scoring::{
    build_scorecards, category_cutoffs, group_cutoffs, group_stats, normalize, stats,
    validate_quantiles, BulkScores, CandidateScore, CategoryCutoff, EngineError, GroupCutoff, GroupStats,
    Normalized, NormalizationTarget, Population, Scope, Scorecard, ScoringConfig,
    SkippedCandidate,
};

/// Quantiles reported per group when none are requested.
pub const DEFAULT_QUANTILES: [f64; 2] = [0.90, 0.70];

/// A scored, optionally normalized population ready for ranking.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    pub population: Population,
    pub skipped: Vec<SkippedCandidate>,
    pub normalization: Option<Normalized>,
    /// Scopes with at least one keyed candidate, overall first.
    pub scopes: Vec<Scope>,
}

impl EvaluationRun {
    pub fn scorecards(&self) -> Vec<Scorecard> {
        build_scorecards(&self.population, &self.scopes)
    }
}

/// Scopes worth ranking in: overall, plus category and shift when present.
pub fn available_scopes(population: &Population) -> Vec<Scope> {
    [Scope::Overall, Scope::Category, Scope::Shift]
        .into_iter()
        .filter(|&s| s == Scope::Overall || population.has_scope(s))
        .collect()
}

/// Turn a bulk scoring pass into a population, normalizing by `group_by`
/// when asked.
pub fn evaluate_population(
    bulk: BulkScores,
    group_by: Option<Scope>,
    config: &ScoringConfig,
) -> Result<EvaluationRun, EngineError> {
    if bulk.scores.is_empty() {
        return Err(EngineError::validation(format!(
            "no candidate could be scored ({} skipped)",
            bulk.skipped.len()
        )));
    }

    let (scores, normalization) = match group_by {
        Some(scope) if scope != Scope::Overall => {
            let normalized = normalize(&bulk.scores, |c| scope.key(c), &config.normalization)?;
            (normalized.scores.clone(), Some(normalized))
        }
        _ => (bulk.scores, None),
    };

    let population = Population::from_scores(scores)?;
    let scopes = available_scopes(&population);
    info!(
        "Evaluated {} candidates ({} skipped)",
        population.len(),
        bulk.skipped.len()
    );

    Ok(EvaluationRun {
        population,
        skipped: bulk.skipped,
        normalization,
        scopes,
    })
}

/// A single sheet's score as shown in student mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentResult {
    #[serde(flatten)]
    pub score: CandidateScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    /// Total mapped through `scoring.student_scale`, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaled_total: Option<f64>,
}

pub fn student_result(
    score: CandidateScore,
    medium: Option<String>,
    config: &ScoringConfig,
) -> StudentResult {
    let scaled_total = config.student_scale.map(|scale| scale.apply(score.raw_total));
    StudentResult {
        score,
        medium: medium
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        scaled_total,
    }
}

/// A candidate left out of a report, in exportable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub roll: String,
    pub code: &'static str,
    pub reason: String,
}

impl From<&SkippedCandidate> for SkippedRow {
    fn from(skipped: &SkippedCandidate) -> Self {
        Self {
            roll: skipped.roll.clone(),
            code: skipped.error.code(),
            reason: skipped.error.to_string(),
        }
    }
}

/// Normalization result without the per-candidate copy of the population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationSummary {
    pub scope: Scope,
    pub target: NormalizationTarget,
    pub group_stats: Vec<GroupStats>,
    pub unscaled_groups: Vec<String>,
}

/// Everything admin mode prints or exports.
#[derive(Debug, Clone, Serialize)]
pub struct AdminReport {
    pub generated_at: DateTime<Utc>,
    pub candidates: usize,
    pub average: f64,
    pub group_scope: Scope,
    pub group_stats: Vec<GroupStats>,
    pub cutoffs: Vec<GroupCutoff>,
    pub category_cutoffs: Vec<CategoryCutoff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalization: Option<NormalizationSummary>,
    pub scorecards: Vec<Scorecard>,
    pub skipped: Vec<SkippedRow>,
    /// Problems that did not stop the report (e.g. a shift with no spread).
    pub warnings: Vec<String>,
}

/// Build the admin report from pre-aggregated marks.
///
/// Average and group statistics describe raw totals. When the grouping scope
/// is not overall the population is normalized first, and quantile cutoffs,
/// category cutoffs and scorecards all use normalized totals; candidates the
/// normalization could not place are left out of those. If normalization
/// fails the report falls back to raw totals and carries a warning.
pub fn admin_report(
    bulk: BulkScores,
    quantiles: &[f64],
    group_by: Option<Scope>,
    config: &ScoringConfig,
) -> Result<AdminReport, EngineError> {
    validate_quantiles(quantiles).map_err(|errors| EngineError::validation(errors.join("; ")))?;
    if bulk.scores.is_empty() {
        return Err(EngineError::validation(format!(
            "no candidate could be scored ({} skipped)",
            bulk.skipped.len()
        )));
    }

    let raw = Population::from_scores(bulk.scores)?;
    let candidates = raw.candidates();
    let group_scope = group_by.unwrap_or(if raw.has_scope(Scope::Shift) {
        Scope::Shift
    } else {
        Scope::Overall
    });

    let totals: Vec<f64> = candidates.iter().map(|c| c.raw_total).collect();
    let average = stats::mean(&totals).unwrap_or(0.0);
    let group_stats = group_stats(candidates, |c| group_scope.key(c));

    let mut warnings = Vec::new();
    let mut normalization = None;
    let mut ranked = raw.clone();
    if group_scope != Scope::Overall {
        match normalize(candidates, |c| group_scope.key(c), &config.normalization) {
            Ok(normalized) => {
                normalization = Some(NormalizationSummary {
                    scope: group_scope,
                    target: normalized.target,
                    group_stats: normalized.stats,
                    unscaled_groups: normalized.unscaled_groups,
                });
                ranked = Population::from_scores(normalized.scores)?;
            }
            Err(e) => {
                warn!("Normalization preview unavailable: {}", e);
                warnings.push(format!("Normalization preview unavailable: {}", e));
            }
        }
    }

    let pool: Vec<CandidateScore> = if ranked.has_normalized() {
        ranked
            .candidates()
            .iter()
            .filter(|c| c.normalized_total.is_some())
            .cloned()
            .collect()
    } else {
        ranked.candidates().to_vec()
    };
    let mut cutoffs = Vec::new();
    for &q in quantiles {
        cutoffs.extend(group_cutoffs(&pool, |c| group_scope.key(c), q)?);
    }
    let category_cutoffs = category_cutoffs(&pool, config)?;

    let scorecards = build_scorecards(&ranked, &available_scopes(&ranked));
    info!(
        "Admin report: {} candidates, {} groups, {} cutoff rows",
        raw.len(),
        group_stats.len(),
        cutoffs.len()
    );

    Ok(AdminReport {
        generated_at: Utc::now(),
        candidates: raw.len(),
        average,
        group_scope,
        group_stats,
        cutoffs,
        category_cutoffs,
        normalization,
        scorecards,
        skipped: bulk.skipped.iter().map(SkippedRow::from).collect(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{DegeneratePolicy, StudentScale};

    fn bulk(scores: Vec<CandidateScore>) -> BulkScores {
        BulkScores {
            scores,
            skipped: Vec::new(),
        }
    }

    fn shifted() -> Vec<CandidateScore> {
        vec![
            CandidateScore::new("1", 60.0).with_shift("S1").with_category("General"),
            CandidateScore::new("2", 80.0).with_shift("S1").with_category("OBC"),
            CandidateScore::new("3", 40.0).with_shift("S2").with_category("General"),
            CandidateScore::new("4", 50.0).with_shift("S2").with_category("OBC"),
        ]
    }

    #[test]
    fn test_evaluate_population_without_grouping() {
        let run = evaluate_population(bulk(shifted()), None, &ScoringConfig::default()).unwrap();
        assert!(run.normalization.is_none());
        assert!(!run.population.has_normalized());
        assert_eq!(run.scopes, vec![Scope::Overall, Scope::Category, Scope::Shift]);
    }

    #[test]
    fn test_evaluate_population_by_shift() {
        let run =
            evaluate_population(bulk(shifted()), Some(Scope::Shift), &ScoringConfig::default())
                .unwrap();
        let normalized = run.normalization.as_ref().unwrap();
        assert_eq!(normalized.target.reference_group.as_deref(), Some("S1"));
        let candidates = run.population.candidates();
        // reference group keeps raw totals
        assert_eq!(candidates[0].normalized_total, Some(60.0));
        // S2 top scorer maps onto S1 top scorer
        assert!((candidates[3].normalized_total.unwrap() - 80.0).abs() < 1e-9);

        let cards = run.scorecards();
        assert_eq!(cards[1].standing(Scope::Overall).unwrap().standing.rank, 1);
    }

    #[test]
    fn test_evaluate_population_empty_is_error() {
        let result = evaluate_population(BulkScores::default(), None, &ScoringConfig::default());
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_evaluate_population_duplicate_roll() {
        let scores = vec![CandidateScore::new("1", 1.0), CandidateScore::new("1", 2.0)];
        let result = evaluate_population(bulk(scores), None, &ScoringConfig::default());
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_student_result_scale_and_medium() {
        let mut config = ScoringConfig::default();
        config.student_scale = Some(StudentScale {
            max_marks: 100.0,
            floor: 20.0,
            ceiling: 100.0,
        });
        let result = student_result(
            CandidateScore::new("candidate", 55.0),
            Some(" Odia ".to_string()),
            &config,
        );
        assert_eq!(result.medium.as_deref(), Some("Odia"));
        assert!((result.scaled_total.unwrap() - 64.0).abs() < 1e-12);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["roll"], "candidate");
        assert_eq!(json["medium"], "Odia");

        let plain = student_result(
            CandidateScore::new("candidate", 55.0),
            Some("  ".to_string()),
            &ScoringConfig::default(),
        );
        assert!(plain.medium.is_none());
        assert!(plain.scaled_total.is_none());
        assert!(serde_json::to_value(&plain).unwrap().get("scaled_total").is_none());
    }

    #[test]
    fn test_admin_report() {
        let report = admin_report(
            bulk(shifted()),
            &DEFAULT_QUANTILES,
            None,
            &ScoringConfig::default(),
        )
        .unwrap();
        assert_eq!(report.candidates, 4);
        assert!((report.average - 57.5).abs() < 1e-12);
        assert_eq!(report.group_scope, Scope::Shift);
        assert_eq!(report.group_stats.len(), 2);
        assert_eq!(report.cutoffs.len(), 4);
        assert_eq!(report.category_cutoffs.len(), 3);
        assert!(report.normalization.is_some());
        assert!(report.warnings.is_empty());
        assert_eq!(report.scorecards.len(), 4);
    }

    #[test]
    fn test_admin_report_cutoffs_use_normalized_totals() {
        let report =
            admin_report(bulk(shifted()), &[0.5], None, &ScoringConfig::default()).unwrap();
        // raw S2 totals [40, 50] map onto S1's [60, 80]
        let s2_normalized: Vec<f64> = report
            .scorecards
            .iter()
            .filter(|c| c.shift.as_deref() == Some("S2"))
            .filter_map(|c| c.normalized_total)
            .collect();
        let expected = stats::quantile(&s2_normalized, 0.5).unwrap();

        let s2 = report.cutoffs.iter().find(|c| c.group == "S2").unwrap();
        assert!((s2.cutoff - expected).abs() < 1e-9);
        assert!((s2.cutoff - 70.0).abs() < 1e-9);
        let s1 = report.cutoffs.iter().find(|c| c.group == "S1").unwrap();
        assert!((s1.cutoff - 70.0).abs() < 1e-9);

        // General members are rolls 1 and 3, both 60 after normalization
        let general = &report.category_cutoffs[0];
        assert_eq!(general.category, "General");
        assert!((general.cutoff - 60.0).abs() < 1e-9);

        // group statistics still describe raw marks
        assert_eq!(report.group_stats[1].mean, 45.0);
    }

    #[test]
    fn test_admin_report_cutoffs_skip_candidates_outside_normalization() {
        let mut scores = shifted();
        scores.push(CandidateScore::new("5", 100.0).with_category("General"));
        let report =
            admin_report(bulk(scores), &[0.5], None, &ScoringConfig::default()).unwrap();
        let general = &report.category_cutoffs[0];
        assert!((general.cutoff - 60.0).abs() < 1e-9);
        let unplaced = report.scorecards.iter().find(|c| c.roll == "5").unwrap();
        assert!(unplaced.standings.is_empty());
    }

    #[test]
    fn test_admin_report_degenerate_shift_warns() {
        let scores = vec![
            CandidateScore::new("1", 50.0).with_shift("S1"),
            CandidateScore::new("2", 50.0).with_shift("S1"),
            CandidateScore::new("3", 40.0).with_shift("S2"),
            CandidateScore::new("4", 60.0).with_shift("S2"),
        ];
        let report =
            admin_report(bulk(scores), &[0.5], None, &ScoringConfig::default()).unwrap();
        assert!(report.normalization.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.scorecards.iter().all(|c| c.normalized_total.is_none()));
    }

    #[test]
    fn test_admin_report_unscaled_policy() {
        let scores = vec![
            CandidateScore::new("1", 50.0).with_shift("S1"),
            CandidateScore::new("2", 40.0).with_shift("S2"),
            CandidateScore::new("3", 60.0).with_shift("S2"),
        ];
        let mut config = ScoringConfig::default();
        config.normalization.degenerate_groups = DegeneratePolicy::Unscaled;
        let report = admin_report(bulk(scores), &[0.5], None, &config).unwrap();
        let summary = report.normalization.unwrap();
        assert_eq!(summary.unscaled_groups, vec!["S1"]);
    }

    #[test]
    fn test_admin_report_without_shift_uses_overall() {
        let scores = vec![CandidateScore::new("1", 10.0), CandidateScore::new("2", 20.0)];
        let report =
            admin_report(bulk(scores), &DEFAULT_QUANTILES, None, &ScoringConfig::default())
                .unwrap();
        assert_eq!(report.group_scope, Scope::Overall);
        assert_eq!(report.group_stats[0].group, Scope::OVERALL_KEY);
        assert!(report.normalization.is_none());
    }

    #[test]
    fn test_admin_report_rejects_bad_quantile() {
        let result = admin_report(bulk(shifted()), &[1.2], None, &ScoringConfig::default());
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
