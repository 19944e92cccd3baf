pub mod config;
pub mod cutoff;
pub mod error;
pub mod evaluator;
pub mod normalizer;
pub mod ranking;
pub mod scorecard;
pub mod stats;
pub mod types;
pub mod validation;

pub use config::*;
pub use cutoff::{category_cutoffs, group_cutoffs, CategoryCutoff, GroupCutoff};
pub use error::EngineError;
pub use evaluator::{
    classify, evaluate, outcome_counts, raw_total, score_candidate, score_responses, BulkScores,
    CandidateResponses, SkippedCandidate,
};
pub use normalizer::{group_stats, normalize, reference_group, NormalizationTarget, Normalized};
pub use ranking::{competition_ranks, percentile_at_or_below, rank};
pub use scorecard::{build_scorecards, scorecard_for, ScopedStanding, Scorecard};
pub use types::*;
pub use validation::{validate_quantiles, validate_scoring};
