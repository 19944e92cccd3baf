use std::collections::BTreeMap;

use super::types::CandidateScore;

/// Spread below which a group is treated as having no variance.
pub const ZERO_VARIANCE_EPSILON: f64 = 1e-9;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation around `mean` (divides by N, not N-1).
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq_diff / values.len() as f64).sqrt()
}

/// Quantile by linear interpolation between closest ranks, `h = (n - 1) * q`.
///
/// Returns `None` for an empty slice or a `q` outside `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Whether two group keys name the same group: trimmed, ASCII case ignored.
pub fn same_group(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Partition candidate indices by group key, in key order. Candidates without
/// a key are left out.
///
/// Keys that differ only in case or surrounding whitespace share a group,
/// labelled with the first spelling seen.
pub fn partition<F>(candidates: &[CandidateScore], group_key: F) -> BTreeMap<String, Vec<usize>>
where
    F: Fn(&CandidateScore) -> Option<&str>,
{
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        let Some(key) = group_key(candidate) else {
            continue;
        };
        let label = groups
            .keys()
            .find(|label| same_group(label, key))
            .cloned()
            .unwrap_or_else(|| key.trim().to_string());
        groups.entry(label).or_default().push(idx);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_population_std_uses_n() {
        // Sample std would be ~2.138; population std is exactly 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values).unwrap();
        assert_eq!(m, 5.0);
        assert!((population_std(&values, m) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0];
        assert!((quantile(&values, 0.7).unwrap() - 81.5).abs() < 1e-9);
        assert!((quantile(&values, 0.9).unwrap() - 90.5).abs() < 1e-9);
        assert!((quantile(&values, 0.5).unwrap() - 72.5).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_unsorted_input_and_bounds() {
        let values = [30.0, 10.0, 20.0];
        assert_eq!(quantile(&values, 0.0), Some(10.0));
        assert_eq!(quantile(&values, 1.0), Some(30.0));
        assert_eq!(quantile(&values, 0.5), Some(20.0));
        assert_eq!(quantile(&values, 1.5), None);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_eq!(quantile(&[42.0], 0.9), Some(42.0));
    }

    #[test]
    fn test_partition_skips_missing_keys() {
        let candidates = vec![
            CandidateScore::new("1", 1.0).with_shift("B"),
            CandidateScore::new("2", 2.0),
            CandidateScore::new("3", 3.0).with_shift("A"),
            CandidateScore::new("4", 4.0).with_shift("B"),
        ];
        let groups = partition(&candidates, |c| c.shift.as_deref());
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(groups["B"], vec![0, 3]);
    }

    #[test]
    fn test_partition_ignores_case_and_padding() {
        let candidates = vec![
            CandidateScore::new("1", 1.0).with_category("General"),
            CandidateScore::new("2", 2.0).with_category("general "),
            CandidateScore::new("3", 3.0).with_category("OBC"),
            CandidateScore::new("4", 4.0).with_category("GENERAL"),
        ];
        let groups = partition(&candidates, |c| c.category.as_deref());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["General"], vec![0, 1, 3]);
        assert!(same_group(" obc", "OBC"));
        assert!(!same_group("S1", "S2"));
    }
}
