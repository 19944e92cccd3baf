use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::pipeline::{AdminReport, SkippedRow, StudentResult};
use crate::scoring::{Scope, Scorecard};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Marks rounded to two decimals. Rounding happens here only; totals are
/// carried unrounded everywhere else.
pub fn format_marks(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn label_line(label: &str, value: &str, use_colors: bool) -> String {
    if use_colors {
        format!("  {}: {}", label.dimmed(), value)
    } else {
        format!("  {}: {}", label, value)
    }
}

/// Result of scoring a single response sheet (student mode).
pub fn format_student_result(result: &StudentResult, use_colors: bool) -> String {
    let score = &result.score;
    let title = score.name.as_deref().unwrap_or(&score.roll);
    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title.to_string()
    }];
    if let Some(medium) = result.medium.as_deref() {
        lines.push(label_line("Medium", medium, use_colors));
    }

    if let Some(counts) = score.outcome_counts {
        let correct = counts.correct.to_string();
        let wrong = counts.wrong.to_string();
        if use_colors {
            lines.push(label_line("Correct", &correct.green().to_string(), true));
            lines.push(label_line("Wrong", &wrong.red().to_string(), true));
        } else {
            lines.push(label_line("Correct", &correct, false));
            lines.push(label_line("Wrong", &wrong, false));
        }
        lines.push(label_line(
            "Unattempted",
            &counts.unattempted.to_string(),
            use_colors,
        ));
        lines.push(label_line(
            "Attempted",
            &format!("{} of {}", counts.attempted(), counts.total()),
            use_colors,
        ));
    }

    let total = format_marks(score.raw_total);
    let total = if use_colors {
        total.bold().to_string()
    } else {
        total
    };
    lines.push(label_line("Total marks", &total, use_colors));
    if let Some(scaled) = result.scaled_total {
        lines.push(label_line("Normalized marks", &format_marks(scaled), use_colors));
    }
    lines.join("\n")
}

/// Student result as one tab-separated line:
/// roll, name, medium, correct, wrong, unattempted, total, normalized
pub fn format_student_tsv(result: &StudentResult) -> String {
    let score = &result.score;
    let counts = score.outcome_counts.unwrap_or_default();
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        score.roll,
        score.name.as_deref().unwrap_or(""),
        result.medium.as_deref().unwrap_or(""),
        counts.correct,
        counts.wrong,
        counts.unattempted,
        format_marks(score.raw_total),
        result.scaled_total.map(format_marks).unwrap_or_default()
    )
}

/// One candidate's scorecard with every scope it was ranked in.
pub fn format_scorecard_detail(card: &Scorecard, use_colors: bool) -> String {
    let heading = match card.name.as_deref() {
        Some(name) => format!("{} ({})", name, card.roll),
        None => card.roll.clone(),
    };
    let mut lines = vec![if use_colors {
        heading.bold().to_string()
    } else {
        heading
    }];

    if let Some(category) = card.category.as_deref() {
        lines.push(label_line("Category", category, use_colors));
    }
    if let Some(shift) = card.shift.as_deref() {
        lines.push(label_line("Shift", shift, use_colors));
    }
    if let Some(counts) = card.outcome_counts {
        lines.push(label_line(
            "Answers",
            &format!(
                "{} correct, {} wrong, {} unattempted",
                counts.correct, counts.wrong, counts.unattempted
            ),
            use_colors,
        ));
    }
    lines.push(label_line("Raw marks", &format_marks(card.raw_total), use_colors));
    if let Some(normalized) = card.normalized_total {
        lines.push(label_line(
            "Normalized marks",
            &format_marks(normalized),
            use_colors,
        ));
    }

    for s in &card.standings {
        let label = match s.scope {
            Scope::Overall => "Overall".to_string(),
            scope => format!("{} {}", scope.label(), s.group),
        };
        lines.push(label_line(
            &label,
            &format!(
                "rank {} of {}, percentile {}",
                s.standing.rank,
                s.standing.group_size,
                format_marks(s.standing.percentile)
            ),
            use_colors,
        ));
    }

    lines.join("\n")
}

/// Scorecards as a table ordered by overall rank.
/// Columns: Rank, Marks, Percentile, Roll, Name (name truncated to the terminal)
pub fn format_scorecard_table(cards: &[Scorecard], use_colors: bool) -> String {
    if cards.is_empty() {
        return "No candidates scored.".to_string();
    }

    let mut ordered: Vec<&Scorecard> = cards.iter().collect();
    ordered.sort_by_key(|c| c.standing(Scope::Overall).map_or(usize::MAX, |s| s.standing.rank));

    let roll_width = ordered
        .iter()
        .map(|c| c.roll.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    let term_width = get_terminal_width();
    // rank(5) + marks(8) + percentile(8) + separators
    let fixed_width = 5 + 8 + 8 + roll_width + 2 * 4;

    let header = format!(
        "{:>5}  {:>8}  {:>8}  {:<roll_width$}  {}",
        "Rank",
        "Marks",
        "Pctile",
        "Roll",
        "Name",
        roll_width = roll_width
    );
    let mut lines = vec![if use_colors {
        header.dimmed().to_string()
    } else {
        header
    }];

    for card in ordered {
        let (rank, percentile) = card
            .standing(Scope::Overall)
            .map(|s| (s.standing.rank.to_string(), format_marks(s.standing.percentile)))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        let marks = format_marks(card.normalized_total.unwrap_or(card.raw_total));
        let name = card.name.as_deref().unwrap_or("");
        let name = match term_width {
            Some(width) if width > fixed_width + 10 => truncate_name(name, width - fixed_width),
            Some(_) => truncate_name(name, 20),
            None => name.to_string(),
        };

        let rank = format!("{:>5}", rank);
        let marks = format!("{:>8}", marks);
        let line = if use_colors {
            format!(
                "{}  {}  {:>8}  {:<roll_width$}  {}",
                rank.dimmed(),
                marks.bold(),
                percentile,
                card.roll,
                name,
                roll_width = roll_width
            )
        } else {
            format!(
                "{}  {}  {:>8}  {:<roll_width$}  {}",
                rank,
                marks,
                percentile,
                card.roll,
                name,
                roll_width = roll_width
            )
        };
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Scorecards as tab-separated values for scripting
/// Columns: roll, name, category, shift, raw, normalized, rank, percentile (no headers, no colors)
pub fn format_tsv(cards: &[Scorecard]) -> String {
    cards
        .iter()
        .map(|card| {
            let overall = card.standing(Scope::Overall);
            [
                card.roll.clone(),
                card.name.clone().unwrap_or_default(),
                card.category.clone().unwrap_or_default(),
                card.shift.clone().unwrap_or_default(),
                format_marks(card.raw_total),
                card.normalized_total.map(format_marks).unwrap_or_default(),
                overall
                    .map(|s| s.standing.rank.to_string())
                    .unwrap_or_default(),
                overall
                    .map(|s| format_marks(s.standing.percentile))
                    .unwrap_or_default(),
            ]
            .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn section(title: &str, use_colors: bool) -> String {
    if use_colors {
        format!("\n{}", title.bold().underline())
    } else {
        format!("\n{}", title)
    }
}

/// Admin summary: average, group statistics, quantile cutoffs and the
/// predicted category cutoffs.
pub fn format_admin_report(report: &AdminReport, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let average = format_marks(report.average);
    lines.push(format!(
        "Candidates: {}   Average marks: {}",
        report.candidates,
        if use_colors {
            average.bold().to_string()
        } else {
            average
        }
    ));

    lines.push(section(
        &format!("Statistics by {}", report.group_scope.label().to_lowercase()),
        use_colors,
    ));
    lines.push(format!(
        "  {:<12} {:>6} {:>9} {:>9}",
        "Group", "Count", "Mean", "Std dev"
    ));
    for s in &report.group_stats {
        lines.push(format!(
            "  {:<12} {:>6} {:>9} {:>9}",
            s.group,
            s.count,
            format_marks(s.mean),
            format_marks(s.population_std)
        ));
    }

    lines.push(section("Quantile cutoffs", use_colors));
    for c in &report.cutoffs {
        lines.push(format!(
            "  {:<12} q={:<5} {:>9}",
            c.group,
            c.quantile,
            format_marks(c.cutoff)
        ));
    }

    if !report.category_cutoffs.is_empty() {
        lines.push(section("Predicted category cutoffs", use_colors));
        for c in &report.category_cutoffs {
            let cutoff = format_marks(c.cutoff);
            let cutoff = if use_colors {
                cutoff.green().to_string()
            } else {
                cutoff
            };
            lines.push(format!(
                "  {:<12} {:>9}   ({} x q{})",
                c.category,
                cutoff,
                c.multiplier,
                c.quantile
            ));
        }
    }

    if let Some(n) = &report.normalization {
        lines.push(section("Normalization preview", use_colors));
        lines.push(format!(
            "  Target: mean {}, std dev {} ({})",
            format_marks(n.target.mean),
            format_marks(n.target.population_std),
            n.target
                .reference_group
                .as_deref()
                .map(|g| format!("reference {} {}", n.scope.label().to_lowercase(), g))
                .unwrap_or_else(|| "all candidates".to_string())
        ));
        if !n.unscaled_groups.is_empty() {
            lines.push(format!("  Left unscaled: {}", n.unscaled_groups.join(", ")));
        }
    }

    for warning in &report.warnings {
        let line = format!("Warning: {}", warning);
        lines.push(if use_colors {
            line.yellow().to_string()
        } else {
            line
        });
    }

    lines.join("\n")
}

/// Candidates left out of a bulk pass, one per line.
pub fn format_skipped(skipped: &[SkippedRow], use_colors: bool) -> String {
    skipped
        .iter()
        .map(|s| {
            let roll = if use_colors {
                s.roll.yellow().to_string()
            } else {
                s.roll.clone()
            };
            format!("Skipped {}: {}", roll, s.reason)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{admin_report, student_result, DEFAULT_QUANTILES};
    use crate::scoring::{
        build_scorecards, BulkScores, CandidateScore, OutcomeCounts, Population, ScoringConfig,
        StudentScale,
    };

    fn population() -> Population {
        Population::from_scores(vec![
            CandidateScore::new("R1", 42.666666).with_category("OBC").with_shift("S1"),
            CandidateScore::new("R2", 50.0).with_shift("S2"),
            CandidateScore::new("R3", 50.0).with_shift("S1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_format_marks() {
        assert_eq!(format_marks(42.666666), "42.67");
        assert_eq!(format_marks(-1.0 / 3.0), "-0.33");
        assert_eq!(format_marks(-0.001), "0.00");
        assert_eq!(format_marks(0.0), "0.00");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Ananya", 10), "Ananya");
        assert_eq!(truncate_name("Ananya Krishnamurthy", 10), "Ananya ...");
        assert_eq!(truncate_name("Ananya", 2), "An");
    }

    fn student(score: CandidateScore) -> StudentResult {
        student_result(score, None, &ScoringConfig::default())
    }

    #[test]
    fn test_format_student_result() {
        let mut score = CandidateScore::new("candidate", 1.0 - 1.0 / 3.0);
        score.outcome_counts = Some(OutcomeCounts {
            correct: 1,
            wrong: 1,
            unattempted: 1,
        });
        let result = format_student_result(&student(score), false);
        assert!(result.contains("Correct: 1"));
        assert!(result.contains("Wrong: 1"));
        assert!(result.contains("Unattempted: 1"));
        assert!(result.contains("Attempted: 2 of 3"));
        assert!(result.contains("Total marks: 0.67"));
        assert!(!result.contains("Medium"));
        assert!(!result.contains("Normalized marks"));
    }

    #[test]
    fn test_format_student_result_with_medium_and_scale() {
        let mut config = ScoringConfig::default();
        config.student_scale = Some(StudentScale {
            max_marks: 100.0,
            floor: 20.0,
            ceiling: 100.0,
        });
        let result = student_result(
            CandidateScore::new("candidate", 42.0),
            Some("English".to_string()),
            &config,
        );
        let text = format_student_result(&result, false);
        assert!(text.contains("Medium: English"));
        assert!(text.contains("Total marks: 42.00"));
        assert!(text.contains("Normalized marks: 53.60"));
    }

    #[test]
    fn test_format_student_tsv() {
        let mut score = CandidateScore::new("candidate", 2.0);
        score.name = Some("Ravi".to_string());
        score.outcome_counts = Some(OutcomeCounts {
            correct: 2,
            wrong: 0,
            unattempted: 4,
        });
        assert_eq!(
            format_student_tsv(&student(score)),
            "candidate\tRavi\t\t2\t0\t4\t2.00\t"
        );
    }

    #[test]
    fn test_format_scorecard_detail() {
        let cards = build_scorecards(&population(), &[Scope::Overall, Scope::Shift]);
        let result = format_scorecard_detail(&cards[0], false);
        assert!(result.starts_with("R1"));
        assert!(result.contains("Category: OBC"));
        assert!(result.contains("Raw marks: 42.67"));
        assert!(result.contains("Overall: rank 3 of 3, percentile 33.33"));
        assert!(result.contains("Shift S1: rank 2 of 2, percentile 50.00"));
    }

    #[test]
    fn test_format_scorecard_table_orders_by_rank() {
        let cards = build_scorecards(&population(), &[Scope::Overall]);
        let result = format_scorecard_table(&cards, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Rank"));
        assert!(lines[1].contains("R2"));
        assert!(lines[3].contains("R1"));
        assert!(lines[3].trim_start().starts_with('3'));
    }

    #[test]
    fn test_format_scorecard_table_empty() {
        assert_eq!(format_scorecard_table(&[], false), "No candidates scored.");
    }

    #[test]
    fn test_format_tsv() {
        let cards = build_scorecards(&population(), &[Scope::Overall]);
        let result = format_tsv(&cards);
        let first: Vec<&str> = result.lines().next().unwrap().split('\t').collect();
        assert_eq!(first, vec!["R1", "", "OBC", "S1", "42.67", "", "3", "33.33"]);
    }

    #[test]
    fn test_format_admin_report() {
        let bulk = BulkScores {
            scores: population().candidates().to_vec(),
            skipped: Vec::new(),
        };
        let report =
            admin_report(bulk, &DEFAULT_QUANTILES, None, &ScoringConfig::default()).unwrap();
        let result = format_admin_report(&report, false);
        assert!(result.contains("Candidates: 3"));
        assert!(result.contains("Statistics by shift"));
        assert!(result.contains("Predicted category cutoffs"));
        assert!(result.contains("SC/ST"));
    }

    #[test]
    fn test_format_skipped() {
        let skipped = vec![SkippedRow {
            roll: "R9".to_string(),
            code: "missing_answer_key",
            reason: "no key".to_string(),
        }];
        assert_eq!(format_skipped(&skipped, false), "Skipped R9: no key");
    }
}
