use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::EngineError;

/// Marks awarded for a correct answer.
pub const CORRECT_MARK: f64 = 1.0;
/// Marks awarded for a wrong answer (one third of a mark is deducted).
pub const WRONG_MARK: f64 = -1.0 / 3.0;
/// Marks awarded for an unattempted question.
pub const UNATTEMPTED_MARK: f64 = 0.0;

/// One question as it appears on a response sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question_id: String,
    pub correct_answer: Option<String>,
    pub given_answer: Option<String>,
}

impl ResponseRecord {
    pub fn new(
        question_id: impl Into<String>,
        correct_answer: Option<&str>,
        given_answer: Option<&str>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            correct_answer: correct_answer.map(str::to_string),
            given_answer: given_answer.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    Unattempted,
}

impl Outcome {
    pub fn marks(self) -> f64 {
        match self {
            Outcome::Correct => CORRECT_MARK,
            Outcome::Wrong => WRONG_MARK,
            Outcome::Unattempted => UNATTEMPTED_MARK,
        }
    }
}

/// A response record after classification against its answer key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub question_id: String,
    pub correct_answer: String,
    pub given_answer: Option<String>,
    pub outcome: Outcome,
    pub item_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub correct: u32,
    pub wrong: u32,
    pub unattempted: u32,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::Unattempted => self.unattempted += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.correct + self.wrong + self.unattempted
    }

    pub fn attempted(&self) -> u32 {
        self.correct + self.wrong
    }
}

/// Aggregate result for one candidate.
///
/// Identity fields (`roll`, `name`) are carried through untouched. `category`
/// and `shift` are the grouping keys and are never reassigned after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub roll: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    pub raw_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_counts: Option<OutcomeCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_total: Option<f64>,
}

impl CandidateScore {
    pub fn new(roll: impl Into<String>, raw_total: f64) -> Self {
        Self {
            roll: roll.into(),
            name: None,
            category: None,
            shift: None,
            raw_total,
            outcome_counts: None,
            normalized_total: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_shift(mut self, shift: impl Into<String>) -> Self {
        self.shift = Some(shift.into());
        self
    }

    /// Score used for ranking and cutoffs: normalized when available, raw otherwise.
    pub fn effective_total(&self) -> f64 {
        self.normalized_total.unwrap_or(self.raw_total)
    }
}

/// Grouping dimension for statistics, normalization and ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Overall,
    Category,
    Shift,
}

impl Scope {
    /// Key shared by every candidate in the overall scope.
    pub const OVERALL_KEY: &'static str = "All";

    /// Group key of `candidate` in this scope, `None` when the candidate has no
    /// value for the dimension and is therefore outside the scope.
    pub fn key<'a>(&self, candidate: &'a CandidateScore) -> Option<&'a str> {
        match self {
            Scope::Overall => Some(Self::OVERALL_KEY),
            Scope::Category => candidate.category.as_deref(),
            Scope::Shift => candidate.shift.as_deref(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scope::Overall => "Overall",
            Scope::Category => "Category",
            Scope::Shift => "Shift",
        }
    }
}

/// Per-group summary over raw totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (denominator N).
    pub population_std: f64,
}

/// Position of a candidate within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub percentile: f64,
    pub group_size: usize,
}

/// The full cohort of candidate scores for one analysis.
///
/// Built once from an ingested dataset and never edited in place; a new upload
/// or a normalization pass produces a new `Population`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Population {
    candidates: Vec<CandidateScore>,
}

impl Population {
    /// Build a population, rejecting duplicate candidate identifiers.
    pub fn from_scores(candidates: Vec<CandidateScore>) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        for candidate in &candidates {
            if !seen.insert(candidate.roll.as_str()) {
                return Err(EngineError::validation(format!(
                    "duplicate candidate identifier '{}'",
                    candidate.roll
                )));
            }
        }
        Ok(Self { candidates })
    }

    pub fn candidates(&self) -> &[CandidateScore] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Index and score of the candidate with identifier `roll`.
    pub fn find(&self, roll: &str) -> Result<(usize, &CandidateScore), EngineError> {
        let roll = roll.trim();
        self.candidates
            .iter()
            .enumerate()
            .find(|(_, c)| c.roll == roll)
            .ok_or_else(|| EngineError::LookupNotFound {
                candidate: roll.to_string(),
            })
    }

    pub fn has_normalized(&self) -> bool {
        self.candidates.iter().any(|c| c.normalized_total.is_some())
    }

    /// Whether any candidate carries a key for `scope`.
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.candidates.iter().any(|c| scope.key(c).is_some())
    }
}
