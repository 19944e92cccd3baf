use log::debug;
use serde::Serialize;

use super::config::ScoringConfig;
use super::error::EngineError;
use super::stats::{mean, partition, population_std, quantile, same_group};
use super::types::CandidateScore;

/// One row of the admin cutoff report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCutoff {
    pub group: String,
    pub quantile: f64,
    pub cutoff: f64,
    pub count: usize,
    pub mean: f64,
    pub population_std: f64,
}

/// Predicted cutoff for one category under the configured policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCutoff {
    pub category: String,
    pub quantile: f64,
    pub multiplier: f64,
    /// Quantile of the reference scores before the multiplier.
    pub base_value: f64,
    pub cutoff: f64,
}

fn check_quantile(q: f64) -> Result<(), EngineError> {
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "quantile {} is outside [0, 1]",
            q
        )))
    }
}

/// The `q` quantile of effective scores within each group, in key order.
pub fn group_cutoffs<F>(
    candidates: &[CandidateScore],
    group_key: F,
    q: f64,
) -> Result<Vec<GroupCutoff>, EngineError>
where
    F: Fn(&CandidateScore) -> Option<&str>,
{
    check_quantile(q)?;

    let mut rows = Vec::new();
    for (group, members) in partition(candidates, group_key) {
        let values: Vec<f64> = members
            .iter()
            .map(|&i| candidates[i].effective_total())
            .collect();
        let (Some(m), Some(cutoff)) = (mean(&values), quantile(&values, q)) else {
            continue;
        };
        rows.push(GroupCutoff {
            group,
            quantile: q,
            cutoff,
            count: values.len(),
            mean: m,
            population_std: population_std(&values, m),
        });
    }
    Ok(rows)
}

/// Apply the cutoff policy: each rule's quantile of the reference scores,
/// times the rule's multiplier.
///
/// Reference scores are those of `reference_category` when it has members,
/// otherwise the whole population.
pub fn category_cutoffs(
    candidates: &[CandidateScore],
    config: &ScoringConfig,
) -> Result<Vec<CategoryCutoff>, EngineError> {
    let policy = &config.cutoff_policy;

    let reference: Vec<f64> = match policy.reference_category.as_deref() {
        Some(category) => candidates
            .iter()
            .filter(|c| c.category.as_deref().is_some_and(|own| same_group(own, category)))
            .map(|c| c.effective_total())
            .collect(),
        None => Vec::new(),
    };
    let reference = if reference.is_empty() {
        debug!("Cutoff reference: whole population");
        candidates.iter().map(|c| c.effective_total()).collect()
    } else {
        debug!("Cutoff reference: {} candidates", reference.len());
        reference
    };

    if reference.is_empty() {
        return Err(EngineError::validation(
            "cannot predict cutoffs for an empty population",
        ));
    }

    policy
        .rules
        .iter()
        .map(|rule| {
            check_quantile(rule.quantile)?;
            let base_value = quantile(&reference, rule.quantile).ok_or_else(|| {
                EngineError::validation(format!("no quantile for category '{}'", rule.category))
            })?;
            let multiplier = config.multiplier_for(rule);
            Ok(CategoryCutoff {
                category: rule.category.clone(),
                quantile: rule.quantile,
                multiplier,
                base_value,
                cutoff: base_value * multiplier,
            })
        })
        .collect()
}
