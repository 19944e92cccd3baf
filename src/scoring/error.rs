use std::fmt;

/// Failures raised by the scoring engine.
///
/// Every variant is local to one input or one candidate; callers doing a bulk
/// pass record the failure and keep going.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Missing or malformed required data. The whole input is rejected.
    Validation(String),
    /// An item has no correct answer to compare against.
    MissingAnswerKey {
        candidate: Option<String>,
        question_id: String,
    },
    /// A group has zero spread, so its scores cannot be z-transformed.
    DegenerateGroup { group: String, members: usize },
    /// The requested candidate is not part of the population.
    LookupNotFound { candidate: String },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    /// Short stable code used in exports and logs.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::MissingAnswerKey { .. } => "missing_answer_key",
            EngineError::DegenerateGroup { .. } => "degenerate_group",
            EngineError::LookupNotFound { .. } => "lookup_not_found",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            EngineError::MissingAnswerKey {
                candidate: Some(candidate),
                question_id,
            } => write!(
                f,
                "No answer key for question '{}' (candidate {})",
                question_id, candidate
            ),
            EngineError::MissingAnswerKey {
                candidate: None,
                question_id,
            } => write!(f, "No answer key for question '{}'", question_id),
            EngineError::DegenerateGroup { group, members } => write!(
                f,
                "Group '{}' has zero score variance ({} member{}); cannot normalize",
                group,
                members,
                if *members == 1 { "" } else { "s" }
            ),
            EngineError::LookupNotFound { candidate } => {
                write!(f, "Candidate '{}' not found in population", candidate)
            }
        }
    }
}

impl std::error::Error for EngineError {}
