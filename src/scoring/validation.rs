use std::collections::HashSet;

use super::config::ScoringConfig;

fn check_fraction(value: f64) -> Option<&'static str> {
    if !value.is_finite() {
        Some("must be a finite number")
    } else if !(0.0..=1.0).contains(&value) {
        Some("must be within [0, 1]")
    } else {
        None
    }
}

fn check_multiplier(value: f64) -> Option<&'static str> {
    if !value.is_finite() {
        Some("must be a finite number")
    } else if value <= 0.0 {
        Some("must be positive")
    } else {
        None
    }
}

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let policy = &config.cutoff_policy;

    if let Some(ref reference) = policy.reference_category {
        if reference.trim().is_empty() {
            errors.push("scoring.cutoff_policy.reference_category: must not be empty".to_string());
        }
    }

    let mut seen = HashSet::new();
    for (i, rule) in policy.rules.iter().enumerate() {
        let category = rule.category.trim();
        if category.is_empty() {
            errors.push(format!(
                "scoring.cutoff_policy.rules[{}].category: must not be empty",
                i
            ));
        } else if !seen.insert(category.to_lowercase()) {
            errors.push(format!(
                "scoring.cutoff_policy.rules[{}].category: duplicate category '{}'",
                i, category
            ));
        }
        if let Some(problem) = check_fraction(rule.quantile) {
            errors.push(format!(
                "scoring.cutoff_policy.rules[{}].quantile: invalid '{}' - {}",
                i, rule.quantile, problem
            ));
        }
        if let Some(problem) = check_multiplier(rule.multiplier) {
            errors.push(format!(
                "scoring.cutoff_policy.rules[{}].multiplier: invalid '{}' - {}",
                i, rule.multiplier, problem
            ));
        }
    }

    for (category, multiplier) in &config.cutoff_multipliers {
        if let Some(problem) = check_multiplier(*multiplier) {
            errors.push(format!(
                "scoring.cutoff_multipliers.{}: invalid '{}' - {}",
                category, multiplier, problem
            ));
        }
        if !policy
            .rules
            .iter()
            .any(|r| r.category.trim().eq_ignore_ascii_case(category.trim()))
        {
            errors.push(format!(
                "scoring.cutoff_multipliers.{}: no cutoff rule for this category",
                category
            ));
        }
    }

    if let Some(scale) = config.student_scale {
        if let Some(problem) = check_multiplier(scale.max_marks) {
            errors.push(format!(
                "scoring.student_scale.max_marks: invalid '{}' - {}",
                scale.max_marks, problem
            ));
        }
        if !scale.floor.is_finite() || !scale.ceiling.is_finite() {
            errors.push("scoring.student_scale: floor and ceiling must be finite".to_string());
        } else if scale.floor >= scale.ceiling {
            errors.push(format!(
                "scoring.student_scale: floor {} must be below ceiling {}",
                scale.floor, scale.ceiling
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate quantiles given on the command line.
pub fn validate_quantiles(quantiles: &[f64]) -> Result<(), Vec<String>> {
    let errors: Vec<String> = quantiles
        .iter()
        .filter_map(|q| check_fraction(*q).map(|p| format!("quantile {}: {}", q, p)))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
