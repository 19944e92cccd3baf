use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scoring configuration.
///
/// Controls how raw scores are normalized and how category cutoffs are
/// predicted. Every section is optional and falls back to the defaults below.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   normalization:
///     anchor: highest_mean_group
///     degenerate_groups: fail
///   cutoff_policy:
///     reference_category: General
///     rules:
///       - { category: General, quantile: 0.90 }
///       - { category: OBC, quantile: 0.70, multiplier: 0.95 }
///   cutoff_multipliers:
///     OBC: 0.93
///   student_scale: { max_marks: 100, floor: 20, ceiling: 100 }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub normalization: NormalizationConfig,

    #[serde(default)]
    pub cutoff_policy: CutoffPolicy,

    /// Per-category multiplier overrides, applied on top of `cutoff_policy`
    /// rules with the same category name.
    #[serde(default)]
    pub cutoff_multipliers: BTreeMap<String, f64>,

    /// Linear rescale shown beside a single sheet's total in student mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_scale: Option<StudentScale>,
}

impl ScoringConfig {
    /// Multiplier for `rule`, honouring a `cutoff_multipliers` override.
    pub fn multiplier_for(&self, rule: &CutoffRule) -> f64 {
        self.cutoff_multipliers
            .iter()
            .find(|(category, _)| category.eq_ignore_ascii_case(&rule.category))
            .map(|(_, m)| *m)
            .unwrap_or(rule.multiplier)
    }
}

/// Maps a raw total in `[0, max_marks]` linearly onto `[floor, ceiling]`.
///
/// One sheet has no group to normalize against, so this is a fixed
/// scale, not a z-score.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StudentScale {
    pub max_marks: f64,
    pub floor: f64,
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
}

impl StudentScale {
    pub fn apply(&self, raw_total: f64) -> f64 {
        raw_total / self.max_marks * (self.ceiling - self.floor) + self.floor
    }
}

fn default_ceiling() -> f64 {
    100.0
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub anchor: Anchor,

    #[serde(default)]
    pub degenerate_groups: DegeneratePolicy,
}

/// Distribution every group is rescaled onto.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Mean and spread of the group with the highest mean raw score.
    #[default]
    HighestMeanGroup,
    /// Mean and spread of every grouped candidate taken together.
    Overall,
}

/// What to do with a group whose scores have no spread.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Abort normalization with `DegenerateGroup`.
    #[default]
    Fail,
    /// Leave the group's members at their raw score.
    Unscaled,
}

/// Category cutoff prediction rules.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CutoffPolicy {
    /// Category whose scores the quantiles are taken over. When unset, or when
    /// no candidate belongs to it, the whole population is used.
    #[serde(default)]
    pub reference_category: Option<String>,

    #[serde(default)]
    pub rules: Vec<CutoffRule>,
}

impl Default for CutoffPolicy {
    fn default() -> Self {
        Self {
            reference_category: Some("General".to_string()),
            rules: vec![
                CutoffRule {
                    category: "General".to_string(),
                    quantile: 0.90,
                    multiplier: 1.0,
                },
                CutoffRule {
                    category: "OBC".to_string(),
                    quantile: 0.70,
                    multiplier: 0.95,
                },
                CutoffRule {
                    category: "SC/ST".to_string(),
                    quantile: 0.70,
                    multiplier: 0.85,
                },
            ],
        }
    }
}

/// Cutoff for one category: `multiplier` times the `quantile` of the
/// reference scores.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CutoffRule {
    pub category: String,

    pub quantile: f64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}
