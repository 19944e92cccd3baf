//! Ingestion adapter: turns uploaded files or fetched response sheets into the
//! canonical records the scoring engine consumes.
//!
//! Format detection and header matching live here; the engine only ever sees
//! `CandidateResponses` and `CandidateScore` values.

pub mod columns;
pub mod html;
pub mod remote;
pub mod table;

pub use columns::{header_key, Column, ColumnAliases, ResolvedHeaders};
pub use table::Table;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

use crate::scoring::{
    BulkScores, CandidateResponses, CandidateScore, EngineError, ResponseRecord, SkippedCandidate,
};

/// Roll assigned to a response sheet that carries no candidate column.
pub const SINGLE_CANDIDATE_ROLL: &str = "candidate";

/// Load raw text from a local path or an `https://` link.
pub async fn read_source(source: &str) -> Result<String> {
    if remote::is_remote(source) {
        remote::fetch_text(source).await
    } else {
        let path = Path::new(source);
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Parse a document as HTML (first data table) or CSV, by sniffing its content.
pub fn parse_document(text: &str) -> Result<Table> {
    let table = if html::looks_like_html(text) {
        debug!("Parsing source as HTML");
        html::extract_table(text)?
    } else {
        debug!("Parsing source as CSV");
        Table::from_csv_str(text)?
    };
    info!(
        "Read {} rows with columns: {}",
        table.rows.len(),
        table.headers.join(", ")
    );
    Ok(table)
}

fn owned(cell: Option<&str>) -> Option<String> {
    cell.map(str::to_string)
}

/// Group per-item rows by candidate.
///
/// Requires question id, correct answer and given answer columns; a missing
/// column rejects the whole table before anything is scored. Without a roll
/// column every row belongs to one candidate. Candidates keep the order of
/// their first row.
pub fn responses_from_table(
    table: &Table,
    aliases: &ColumnAliases,
) -> Result<Vec<CandidateResponses>, EngineError> {
    let resolved = aliases.resolve(&table.headers);
    resolved.require(&[Column::QuestionId, Column::CorrectAnswer, Column::GivenAnswer])?;
    if table.is_empty() {
        return Err(EngineError::validation("response sheet has no rows"));
    }

    let col = |c: Column| resolved.get(c);
    let (q_col, key_col, given_col) = match (
        col(Column::QuestionId),
        col(Column::CorrectAnswer),
        col(Column::GivenAnswer),
    ) {
        (Some(q), Some(k), Some(g)) => (q, k, g),
        _ => return Err(EngineError::validation("response columns could not be resolved")),
    };

    let mut candidates: Vec<CandidateResponses> = Vec::new();
    for row in 0..table.rows.len() {
        let roll = match col(Column::Roll) {
            Some(c) => table.cell(row, c).ok_or_else(|| {
                EngineError::validation(format!("row {} has no candidate roll", row + 1))
            })?,
            None => SINGLE_CANDIDATE_ROLL,
        };

        let position = match candidates.iter().position(|c| c.roll == roll) {
            Some(p) => p,
            None => {
                candidates.push(CandidateResponses {
                    roll: roll.to_string(),
                    ..Default::default()
                });
                candidates.len() - 1
            }
        };
        let candidate = &mut candidates[position];

        for (column, slot) in [
            (Column::Name, &mut candidate.name),
            (Column::Category, &mut candidate.category),
            (Column::Shift, &mut candidate.shift),
        ] {
            if slot.is_none() {
                *slot = col(column).and_then(|c| owned(table.cell(row, c)));
            }
        }

        candidate.records.push(ResponseRecord {
            question_id: table.cell(row, q_col).unwrap_or_default().to_string(),
            correct_answer: owned(table.cell(row, key_col)),
            given_answer: owned(table.cell(row, given_col)),
        });
    }

    info!(
        "Found {} candidate(s) in {} response rows",
        candidates.len(),
        table.rows.len()
    );
    Ok(candidates)
}

fn parse_marks(value: Option<&str>, column: &str) -> Result<f64, EngineError> {
    let value = value
        .ok_or_else(|| EngineError::validation(format!("'{}' is blank", column)))?;
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            EngineError::validation(format!("'{}' is not a number: '{}'", column, value))
        })
}

/// Header keys of running serial-number columns, never summed as marks.
const SERIAL_HEADERS: [&str; 7] = ["sno", "slno", "srno", "serialno", "serialnumber", "sn", "sl"];

fn is_serial_header(header: &str) -> bool {
    SERIAL_HEADERS.contains(&header_key(header).as_str())
}

fn has_numeric_cell(table: &Table, col: usize) -> bool {
    (0..table.rows.len()).any(|row| {
        table
            .cell(row, col)
            .and_then(|v| v.parse::<f64>().ok())
            .is_some_and(f64::is_finite)
    })
}

/// Build candidate scores from pre-aggregated marks.
///
/// Uses the `marks` column when present, otherwise sums the section score
/// columns: unrecognised columns holding at least one number, minus serial
/// number columns. A row with a blank or non-numeric mark is skipped and
/// reported; a table with no mark columns at all is rejected. Rows without a
/// roll get a positional identifier.
pub fn scores_from_table(table: &Table, aliases: &ColumnAliases) -> Result<BulkScores, EngineError> {
    let resolved = aliases.resolve(&table.headers);
    if resolved.has(Column::QuestionId) {
        return Err(EngineError::validation(
            "table has per-question rows; expected one row per candidate",
        ));
    }

    let sections: Vec<(usize, String)> = match resolved.get(Column::Marks) {
        Some(c) => vec![(c, Column::Marks.canonical().to_string())],
        None => resolved
            .unmatched
            .iter()
            .filter(|(_, header)| !header.is_empty())
            .filter(|(c, header)| {
                if is_serial_header(header) {
                    debug!("Ignoring serial number column '{}'", header);
                    false
                } else if !has_numeric_cell(table, *c) {
                    info!("Ignoring non-numeric column '{}'", header);
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect(),
    };
    if sections.is_empty() {
        return Err(EngineError::validation(
            "missing required column(s): marks (or section score columns)",
        ));
    }
    if resolved.get(Column::Marks).is_none() {
        debug!(
            "Summing section columns: {}",
            sections
                .iter()
                .map(|(_, h)| h.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let mut result = BulkScores::default();
    for row in 0..table.rows.len() {
        let roll = resolved
            .get(Column::Roll)
            .and_then(|c| table.cell(row, c))
            .map(str::to_string)
            .unwrap_or_else(|| format!("row-{}", row + 1));

        let total: Result<f64, EngineError> = sections
            .iter()
            .map(|(c, header)| parse_marks(table.cell(row, *c), header))
            .sum();

        match total {
            Ok(raw_total) => {
                let field = |c: Column| resolved.get(c).and_then(|i| owned(table.cell(row, i)));
                result.scores.push(CandidateScore {
                    roll,
                    name: field(Column::Name),
                    category: field(Column::Category),
                    shift: field(Column::Shift),
                    raw_total,
                    outcome_counts: None,
                    normalized_total: None,
                });
            }
            Err(error) => {
                warn!("Skipping {}: {}", roll, error);
                result.skipped.push(SkippedCandidate { roll, error });
            }
        }
    }

    info!(
        "Loaded {} candidate score(s), skipped {}",
        result.scores.len(),
        result.skipped.len()
    );
    Ok(result)
}
