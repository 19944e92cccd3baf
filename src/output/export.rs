use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::Serialize;
use std::path::Path;

use crate::pipeline::AdminReport;
use crate::scoring::{Scope, Scorecard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// The whole report, pretty-printed.
    Json,
    /// One row per candidate.
    Csv,
}

impl ExportFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => anyhow::bail!(
                "Cannot export to {}: use a .json or .csv file name",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScorecardRow<'a> {
    roll: &'a str,
    name: Option<&'a str>,
    category: Option<&'a str>,
    shift: Option<&'a str>,
    raw_total: f64,
    normalized_total: Option<f64>,
    overall_rank: Option<usize>,
    overall_percentile: Option<f64>,
    category_rank: Option<usize>,
    shift_rank: Option<usize>,
}

impl<'a> From<&'a Scorecard> for ScorecardRow<'a> {
    fn from(card: &'a Scorecard) -> Self {
        let rank_in = |scope| card.standing(scope).map(|s| s.standing.rank);
        Self {
            roll: &card.roll,
            name: card.name.as_deref(),
            category: card.category.as_deref(),
            shift: card.shift.as_deref(),
            raw_total: card.raw_total,
            normalized_total: card.normalized_total,
            overall_rank: rank_in(Scope::Overall),
            overall_percentile: card
                .standing(Scope::Overall)
                .map(|s| s.standing.percentile),
            category_rank: rank_in(Scope::Category),
            shift_rank: rank_in(Scope::Shift),
        }
    }
}

/// Write `value` as pretty JSON, atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, value).context("Failed to serialize export")?;

    file.commit()
        .with_context(|| format!("Failed to save export to {}", path.display()))?;
    Ok(())
}

/// Write one CSV row per scorecard, atomically.
pub fn write_scorecards_csv(path: &Path, cards: &[Scorecard]) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    {
        let mut writer = csv::Writer::from_writer(&mut file);
        for card in cards {
            writer
                .serialize(ScorecardRow::from(card))
                .with_context(|| format!("Failed to write row for {}", card.roll))?;
        }
        writer.flush().context("Failed to flush CSV export")?;
    }

    file.commit()
        .with_context(|| format!("Failed to save export to {}", path.display()))?;
    Ok(())
}

/// Export an admin report in the format implied by `path`.
pub fn export_report(path: &Path, report: &AdminReport) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path)?;
    match format {
        ExportFormat::Json => write_json(path, report)?,
        ExportFormat::Csv => write_scorecards_csv(path, &report.scorecards)?,
    }
    log::info!("Exported report to {}", path.display());
    Ok(format)
}
