use log::{debug, warn};
use std::collections::HashSet;

use super::error::EngineError;
use super::types::{CandidateScore, Outcome, OutcomeCounts, ResponseRecord, ScoredRecord};

/// All response rows of one candidate, plus the identity fields the ingestion
/// layer found for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateResponses {
    pub roll: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub shift: Option<String>,
    pub records: Vec<ResponseRecord>,
}

/// A candidate left out of a bulk pass, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCandidate {
    pub roll: String,
    pub error: EngineError,
}

/// Result of a bulk pass: everyone who could be scored, and everyone who could not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkScores {
    pub scores: Vec<CandidateScore>,
    pub skipped: Vec<SkippedCandidate>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Classify one answer. Blank answers are unattempted; otherwise the trimmed
/// answer must equal the trimmed key exactly (case preserved).
pub fn classify(correct_answer: &str, given_answer: Option<&str>) -> Outcome {
    match non_blank(given_answer) {
        None => Outcome::Unattempted,
        Some(given) if given == correct_answer.trim() => Outcome::Correct,
        Some(_) => Outcome::Wrong,
    }
}

/// Score every record of one response sheet.
///
/// Fails if a question id repeats or any record lacks its correct answer;
/// nothing is scored in that case.
pub fn evaluate(records: &[ResponseRecord]) -> Result<Vec<ScoredRecord>, EngineError> {
    let mut seen = HashSet::new();
    let mut scored = Vec::with_capacity(records.len());

    for record in records {
        let question_id = record.question_id.trim();
        if question_id.is_empty() {
            return Err(EngineError::validation("response row without a question id"));
        }
        if !seen.insert(question_id) {
            return Err(EngineError::validation(format!(
                "question '{}' appears more than once",
                question_id
            )));
        }

        let correct_answer = non_blank(record.correct_answer.as_deref()).ok_or_else(|| {
            EngineError::MissingAnswerKey {
                candidate: None,
                question_id: question_id.to_string(),
            }
        })?;

        let outcome = classify(correct_answer, record.given_answer.as_deref());
        scored.push(ScoredRecord {
            question_id: question_id.to_string(),
            correct_answer: correct_answer.to_string(),
            given_answer: non_blank(record.given_answer.as_deref()).map(str::to_string),
            outcome,
            item_score: outcome.marks(),
        });
    }

    Ok(scored)
}

/// Sum of item scores, unrounded.
pub fn raw_total(scored: &[ScoredRecord]) -> f64 {
    scored.iter().map(|r| r.item_score).sum()
}

pub fn outcome_counts(scored: &[ScoredRecord]) -> OutcomeCounts {
    let mut counts = OutcomeCounts::default();
    for record in scored {
        counts.record(record.outcome);
    }
    counts
}

/// Evaluate one candidate's sheet into a `CandidateScore`.
pub fn score_candidate(candidate: &CandidateResponses) -> Result<CandidateScore, EngineError> {
    let scored = evaluate(&candidate.records).map_err(|e| match e {
        EngineError::MissingAnswerKey { question_id, .. } => EngineError::MissingAnswerKey {
            candidate: Some(candidate.roll.clone()),
            question_id,
        },
        other => other,
    })?;

    let counts = outcome_counts(&scored);
    let total = raw_total(&scored);
    debug!(
        "Scored {}: {} correct, {} wrong, {} unattempted -> {}",
        candidate.roll, counts.correct, counts.wrong, counts.unattempted, total
    );

    Ok(CandidateScore {
        roll: candidate.roll.clone(),
        name: candidate.name.clone(),
        category: candidate.category.clone(),
        shift: candidate.shift.clone(),
        raw_total: total,
        outcome_counts: Some(counts),
        normalized_total: None,
    })
}

/// Score every candidate. A candidate that fails is reported in
/// `skipped` and does not stop the others.
pub fn score_responses(candidates: &[CandidateResponses]) -> BulkScores {
    let mut result = BulkScores::default();

    for candidate in candidates {
        match score_candidate(candidate) {
            Ok(score) => result.scores.push(score),
            Err(error) => {
                warn!("Skipping candidate {}: {}", candidate.roll, error);
                result.skipped.push(SkippedCandidate {
                    roll: candidate.roll.clone(),
                    error,
                });
            }
        }
    }

    result
}
