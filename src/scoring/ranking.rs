use super::stats::partition;
use super::types::{CandidateScore, Standing};

/// Competition ("min") ranks for a list of values, highest value first.
///
/// Tied values share the lowest rank of the tie, and the next distinct value
/// skips accordingly: `[90, 90, 80, 70]` ranks `[1, 1, 3, 4]`.
pub fn competition_ranks(values: &[f64]) -> Vec<usize> {
    let sorted = sorted_ascending(values);
    values
        .iter()
        .map(|&v| 1 + count_greater(&sorted, v))
        .collect()
}

/// Percentile of `value` among `sorted`: the share of values at or below it,
/// on a 0-100 scale. The best score always gets 100.
pub fn percentile_at_or_below(sorted: &[f64], value: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    100.0 * count_at_or_below(sorted, value) as f64 / sorted.len() as f64
}

fn sorted_ascending(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn count_at_or_below(sorted: &[f64], value: f64) -> usize {
    sorted.partition_point(|&v| v <= value)
}

fn count_greater(sorted: &[f64], value: f64) -> usize {
    sorted.len() - count_at_or_below(sorted, value)
}

/// Rank and percentile of every candidate within its scope group.
///
/// `score` picks the value ranked on; `scope` picks the group a candidate is
/// ranked within. The result is aligned with `candidates`; a candidate with
/// no scope key gets `None`.
pub fn rank<K, S>(candidates: &[CandidateScore], score: K, scope: S) -> Vec<Option<Standing>>
where
    K: Fn(&CandidateScore) -> f64,
    S: Fn(&CandidateScore) -> Option<&str>,
{
    let mut standings = vec![None; candidates.len()];

    for members in partition(candidates, scope).into_values() {
        let values: Vec<f64> = members.iter().map(|&i| score(&candidates[i])).collect();
        let sorted = sorted_ascending(&values);

        for (&idx, &value) in members.iter().zip(values.iter()) {
            standings[idx] = Some(Standing {
                rank: 1 + count_greater(&sorted, value),
                percentile: percentile_at_or_below(&sorted, value),
                group_size: sorted.len(),
            });
        }
    }

    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::Scope;

    #[test]
    fn test_competition_ranks_with_ties() {
        assert_eq!(competition_ranks(&[90.0, 90.0, 80.0, 70.0]), vec![1, 1, 3, 4]);
    }

    #[test]
    fn test_competition_ranks_order_independent() {
        assert_eq!(competition_ranks(&[70.0, 90.0, 80.0, 90.0]), vec![4, 1, 3, 1]);
    }

    #[test]
    fn test_competition_ranks_all_tied() {
        assert_eq!(competition_ranks(&[5.0, 5.0, 5.0]), vec![1, 1, 1]);
    }

    #[test]
    fn test_percentile_at_or_below() {
        let sorted = [70.0, 80.0, 90.0, 90.0];
        assert_eq!(percentile_at_or_below(&sorted, 90.0), 100.0);
        assert_eq!(percentile_at_or_below(&sorted, 80.0), 50.0);
        assert_eq!(percentile_at_or_below(&sorted, 70.0), 25.0);
        assert_eq!(percentile_at_or_below(&[], 1.0), 0.0);
    }

    #[test]
    fn test_rank_overall() {
        let candidates = vec![
            CandidateScore::new("a", 90.0),
            CandidateScore::new("b", 90.0),
            CandidateScore::new("c", 80.0),
            CandidateScore::new("d", 70.0),
        ];
        let standings = rank(&candidates, |c| c.raw_total, |c| Scope::Overall.key(c));
        let ranks: Vec<usize> = standings.iter().map(|s| s.unwrap().rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
        assert!(standings.iter().all(|s| s.unwrap().group_size == 4));
        assert_eq!(standings[3].unwrap().percentile, 25.0);
    }

    #[test]
    fn test_rank_within_scope() {
        let candidates = vec![
            CandidateScore::new("a", 50.0).with_category("OBC"),
            CandidateScore::new("b", 60.0).with_category("General"),
            CandidateScore::new("c", 40.0).with_category("OBC"),
            CandidateScore::new("d", 30.0),
        ];
        let standings = rank(&candidates, |c| c.raw_total, |c| Scope::Category.key(c));

        assert_eq!(standings[0].unwrap().rank, 1);
        assert_eq!(standings[0].unwrap().group_size, 2);
        assert_eq!(standings[1].unwrap().rank, 1);
        assert_eq!(standings[1].unwrap().group_size, 1);
        assert_eq!(standings[2].unwrap().rank, 2);
        assert_eq!(standings[2].unwrap().percentile, 50.0);
        assert!(standings[3].is_none());
    }

    #[test]
    fn test_rank_uses_effective_score() {
        let mut low_raw = CandidateScore::new("a", 10.0);
        low_raw.normalized_total = Some(95.0);
        let candidates = vec![low_raw, CandidateScore::new("b", 50.0)];
        let standings = rank(&candidates, |c| c.effective_total(), |c| Scope::Overall.key(c));
        assert_eq!(standings[0].unwrap().rank, 1);
        assert_eq!(standings[1].unwrap().rank, 2);
    }
}
