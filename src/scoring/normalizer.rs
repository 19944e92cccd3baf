use log::{debug, info};
use serde::Serialize;

use super::config::{Anchor, DegeneratePolicy, NormalizationConfig};
use super::error::EngineError;
use super::stats::{mean, partition, population_std, same_group, ZERO_VARIANCE_EPSILON};
use super::types::{CandidateScore, GroupStats};

/// Mean and spread every group is mapped onto.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationTarget {
    /// Reference group name, or `None` when anchored on all grouped candidates.
    pub reference_group: Option<String>,
    pub mean: f64,
    pub population_std: f64,
}

/// Output of a normalization pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    /// Input candidates in input order, `normalized_total` filled for every
    /// candidate that belongs to a group.
    pub scores: Vec<CandidateScore>,
    pub stats: Vec<GroupStats>,
    pub target: NormalizationTarget,
    /// Groups left unscaled under `DegeneratePolicy::Unscaled`.
    pub unscaled_groups: Vec<String>,
}

/// Mean and population std of raw totals per group, in group key order.
pub fn group_stats<F>(candidates: &[CandidateScore], group_key: F) -> Vec<GroupStats>
where
    F: Fn(&CandidateScore) -> Option<&str>,
{
    partition(candidates, group_key)
        .into_iter()
        .filter_map(|(group, members)| {
            let values: Vec<f64> = members.iter().map(|&i| candidates[i].raw_total).collect();
            let m = mean(&values)?;
            Some(GroupStats {
                group,
                count: values.len(),
                mean: m,
                population_std: population_std(&values, m),
            })
        })
        .collect()
}

/// Group with the highest mean. Ties go to the first group in key order.
pub fn reference_group(stats: &[GroupStats]) -> Option<&GroupStats> {
    stats.iter().fold(None, |best: Option<&GroupStats>, s| match best {
        Some(b) if b.mean >= s.mean => Some(b),
        _ => Some(s),
    })
}

fn is_degenerate(stats: &GroupStats) -> bool {
    stats.population_std <= ZERO_VARIANCE_EPSILON
}

/// z-score transform of one raw score onto the target distribution.
pub fn rescale(raw: f64, group: &GroupStats, target: &NormalizationTarget) -> f64 {
    (raw - group.mean) / group.population_std * target.population_std + target.mean
}

/// Rescale raw totals so every group shares the target mean and spread.
///
/// `normalized = ((raw - mean_g) / std_g) * std_ref + mean_ref`, with the
/// reference group's own members kept at their raw score. Candidates without
/// a group key keep `normalized_total = None`.
pub fn normalize<F>(
    candidates: &[CandidateScore],
    group_key: F,
    config: &NormalizationConfig,
) -> Result<Normalized, EngineError>
where
    F: Fn(&CandidateScore) -> Option<&str>,
{
    let stats = group_stats(candidates, &group_key);
    if stats.is_empty() {
        return Err(EngineError::validation(
            "no candidate belongs to a normalization group",
        ));
    }

    let target = match config.anchor {
        Anchor::HighestMeanGroup => {
            let reference = reference_group(&stats).ok_or_else(|| {
                EngineError::validation("no reference group could be chosen")
            })?;
            NormalizationTarget {
                reference_group: Some(reference.group.clone()),
                mean: reference.mean,
                population_std: reference.population_std,
            }
        }
        Anchor::Overall => {
            let values: Vec<f64> = candidates
                .iter()
                .filter(|c| group_key(c).is_some())
                .map(|c| c.raw_total)
                .collect();
            let m = mean(&values).unwrap_or(0.0);
            NormalizationTarget {
                reference_group: None,
                mean: m,
                population_std: population_std(&values, m),
            }
        }
    };

    info!(
        "Normalizing {} groups onto mean {:.3}, std {:.3} ({})",
        stats.len(),
        target.mean,
        target.population_std,
        target.reference_group.as_deref().unwrap_or("all groups")
    );

    let mut unscaled_groups = Vec::new();
    for group in stats.iter().filter(|s| is_degenerate(s)) {
        match config.degenerate_groups {
            DegeneratePolicy::Fail => {
                return Err(EngineError::DegenerateGroup {
                    group: group.group.clone(),
                    members: group.count,
                });
            }
            DegeneratePolicy::Unscaled => {
                debug!("Leaving degenerate group '{}' unscaled", group.group);
                unscaled_groups.push(group.group.clone());
            }
        }
    }

    let scores = candidates
        .iter()
        .map(|candidate| {
            let mut scored = candidate.clone();
            scored.normalized_total = group_key(candidate).and_then(|key| {
                let group = stats.iter().find(|s| same_group(&s.group, key))?;
                let keep_raw = target
                    .reference_group
                    .as_deref()
                    .is_some_and(|reference| same_group(reference, key))
                    || unscaled_groups.iter().any(|g| same_group(g, key));
                Some(if keep_raw {
                    candidate.raw_total
                } else {
                    rescale(candidate.raw_total, group, &target)
                })
            });
            scored
        })
        .collect();

    Ok(Normalized {
        scores,
        stats,
        target,
        unscaled_groups,
    })
}
