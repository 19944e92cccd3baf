use std::collections::BTreeMap;

use crate::scoring::EngineError;

/// Canonical columns the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Roll,
    Name,
    Category,
    Shift,
    QuestionId,
    CorrectAnswer,
    GivenAnswer,
    Marks,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Roll,
        Column::Name,
        Column::Category,
        Column::Shift,
        Column::QuestionId,
        Column::CorrectAnswer,
        Column::GivenAnswer,
        Column::Marks,
    ];

    pub fn canonical(self) -> &'static str {
        match self {
            Column::Roll => "roll",
            Column::Name => "name",
            Column::Category => "category",
            Column::Shift => "shift",
            Column::QuestionId => "question_id",
            Column::CorrectAnswer => "correct_answer",
            Column::GivenAnswer => "given_answer",
            Column::Marks => "marks",
        }
    }

    pub fn from_canonical(name: &str) -> Option<Column> {
        let key = header_key(name);
        Column::ALL
            .into_iter()
            .find(|c| header_key(c.canonical()) == key)
    }

    /// Header spellings seen on exam portals and admin uploads.
    fn builtin_aliases(self) -> &'static [&'static str] {
        match self {
            Column::Roll => &[
                "Roll",
                "Roll No",
                "Roll Number",
                "Registration No",
                "Registration Number",
                "Application No",
                "Candidate ID",
            ],
            Column::Name => &["Name", "Candidate Name", "Full Name"],
            Column::Category => &["Category", "Caste Category", "Social Category"],
            Column::Shift => &["Shift", "Session", "Exam Shift", "Batch"],
            Column::QuestionId => &[
                "Question ID",
                "Question No",
                "Question Number",
                "Q No",
                "Q.No.",
                "QID",
            ],
            Column::CorrectAnswer => &[
                "Correct_Answer",
                "Correct Answer",
                "Answer Key",
                "Key",
                "Correct Option",
            ],
            Column::GivenAnswer => &[
                "Response",
                "Your Answer",
                "Given Answer",
                "Chosen Option",
                "Candidate Response",
                "Marked Answer",
            ],
            Column::Marks => &["Marks", "Total", "Total Marks", "Score", "Raw Score"],
        }
    }
}

/// Comparison form of a header: lowercase letters and digits only, so
/// "Q.No.", "q_no" and "Q No" all compare equal.
pub fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Declarative header alias table: built-in spellings plus any configured ones.
#[derive(Debug, Clone, Default)]
pub struct ColumnAliases {
    extra: BTreeMap<Column, Vec<String>>,
}

impl ColumnAliases {
    /// Build from the `columns:` config section (canonical name -> spellings).
    pub fn from_config(columns: &BTreeMap<String, Vec<String>>) -> Result<Self, EngineError> {
        let mut extra: BTreeMap<Column, Vec<String>> = BTreeMap::new();
        for (name, spellings) in columns {
            let column = Column::from_canonical(name).ok_or_else(|| {
                EngineError::validation(format!("unknown column '{}' in alias table", name))
            })?;
            extra.entry(column).or_default().extend(spellings.iter().cloned());
        }
        Ok(Self { extra })
    }

    fn matches(&self, column: Column, key: &str) -> bool {
        header_key(column.canonical()) == key
            || column.builtin_aliases().iter().any(|a| header_key(a) == key)
            || self
                .extra
                .get(&column)
                .is_some_and(|spellings| spellings.iter().any(|a| header_key(a) == key))
    }

    /// Map each header to a canonical column. The first header matching a
    /// column wins; headers matching nothing are returned as `unmatched`.
    pub fn resolve(&self, headers: &[String]) -> ResolvedHeaders {
        let mut positions = BTreeMap::new();
        let mut unmatched = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            let key = header_key(header);
            let column = Column::ALL
                .into_iter()
                .find(|&c| !positions.contains_key(&c) && self.matches(c, &key));
            match column {
                Some(c) => {
                    positions.insert(c, idx);
                }
                None => unmatched.push((idx, header.trim().to_string())),
            }
        }

        ResolvedHeaders {
            positions,
            unmatched,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHeaders {
    positions: BTreeMap<Column, usize>,
    pub unmatched: Vec<(usize, String)>,
}

impl ResolvedHeaders {
    pub fn get(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    pub fn has(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    /// Fail with a `Validation` error naming every missing column.
    pub fn require(&self, columns: &[Column]) -> Result<(), EngineError> {
        let missing: Vec<&str> = columns
            .iter()
            .filter(|c| !self.has(**c))
            .map(|c| c.canonical())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::validation(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_key() {
        assert_eq!(header_key("Q.No."), "qno");
        assert_eq!(header_key(" Correct_Answer "), "correctanswer");
        assert_eq!(header_key("Your Answer"), "youranswer");
    }

    #[test]
    fn test_resolve_portal_headers() {
        let resolved =
            ColumnAliases::default().resolve(&headers(&["Q.No.", "Answer Key", "Your Answer"]));
        assert_eq!(resolved.get(Column::QuestionId), Some(0));
        assert_eq!(resolved.get(Column::CorrectAnswer), Some(1));
        assert_eq!(resolved.get(Column::GivenAnswer), Some(2));
        assert!(resolved.unmatched.is_empty());
    }

    #[test]
    fn test_resolve_canonical_headers() {
        let resolved = ColumnAliases::default().resolve(&headers(&[
            "roll",
            "question_id",
            "correct_answer",
            "given_answer",
        ]));
        assert!(resolved
            .require(&[
                Column::Roll,
                Column::QuestionId,
                Column::CorrectAnswer,
                Column::GivenAnswer
            ])
            .is_ok());
    }

    #[test]
    fn test_unmatched_headers_reported() {
        let resolved =
            ColumnAliases::default().resolve(&headers(&["Roll", "Maths", "Reasoning", "Shift"]));
        assert_eq!(resolved.get(Column::Shift), Some(3));
        assert_eq!(
            resolved.unmatched,
            vec![(1, "Maths".to_string()), (2, "Reasoning".to_string())]
        );
    }

    #[test]
    fn test_first_matching_header_wins() {
        let resolved = ColumnAliases::default().resolve(&headers(&["Marks", "Total"]));
        assert_eq!(resolved.get(Column::Marks), Some(0));
        assert_eq!(resolved.unmatched, vec![(1, "Total".to_string())]);
    }

    #[test]
    fn test_require_names_missing_columns() {
        let resolved = ColumnAliases::default().resolve(&headers(&["Question No"]));
        let err = resolved
            .require(&[Column::QuestionId, Column::CorrectAnswer, Column::GivenAnswer])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: missing required column(s): correct_answer, given_answer"
        );
    }

    #[test]
    fn test_configured_aliases() {
        let mut config = BTreeMap::new();
        config.insert("given_answer".to_string(), vec!["Option Ticked".to_string()]);
        let aliases = ColumnAliases::from_config(&config).unwrap();
        let resolved = aliases.resolve(&headers(&["Option Ticked"]));
        assert_eq!(resolved.get(Column::GivenAnswer), Some(0));
    }

    #[test]
    fn test_unknown_configured_column() {
        let mut config = BTreeMap::new();
        config.insert("percentile".to_string(), vec!["Pct".to_string()]);
        assert!(ColumnAliases::from_config(&config).is_err());
    }
}
