use serde::Serialize;

use super::error::EngineError;
use super::ranking::rank;
use super::types::{OutcomeCounts, Population, Scope, Standing};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopedStanding {
    pub scope: Scope,
    pub group: String,
    #[serde(flatten)]
    pub standing: Standing,
}

/// Everything reported back for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub roll: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    pub raw_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_counts: Option<OutcomeCounts>,
    pub standings: Vec<ScopedStanding>,
}

impl Scorecard {
    pub fn standing(&self, scope: Scope) -> Option<&ScopedStanding> {
        self.standings.iter().find(|s| s.scope == scope)
    }
}

/// Scorecards for the whole population, in population order.
///
/// Ranking uses the normalized total when present. Scopes the candidate has
/// no key for are omitted from its card.
///
/// In a normalized population, candidates left without a normalized total
/// (no key for the normalization scope) are not ranked in any scope, so raw
/// and normalized totals never share a ranking.
pub fn build_scorecards(population: &Population, scopes: &[Scope]) -> Vec<Scorecard> {
    let candidates = population.candidates();
    let normalized_only = population.has_normalized();
    let per_scope: Vec<(Scope, Vec<Option<Standing>>)> = scopes
        .iter()
        .map(|&scope| {
            let standings = rank(
                candidates,
                |c| c.effective_total(),
                |c| {
                    if normalized_only && c.normalized_total.is_none() {
                        None
                    } else {
                        scope.key(c)
                    }
                },
            );
            (scope, standings)
        })
        .collect();

    candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| Scorecard {
            roll: c.roll.clone(),
            name: c.name.clone(),
            category: c.category.clone(),
            shift: c.shift.clone(),
            raw_total: c.raw_total,
            normalized_total: c.normalized_total,
            outcome_counts: c.outcome_counts,
            standings: per_scope
                .iter()
                .filter_map(|(scope, standings)| {
                    let standing = standings[idx]?;
                    let group = scope.key(c)?.trim().to_string();
                    Some(ScopedStanding {
                        scope: *scope,
                        group,
                        standing,
                    })
                })
                .collect(),
        })
        .collect()
}

/// Scorecard of a single candidate, ranked against the full population.
pub fn scorecard_for(
    population: &Population,
    roll: &str,
    scopes: &[Scope],
) -> Result<Scorecard, EngineError> {
    let (idx, _) = population.find(roll)?;
    build_scorecards(population, scopes)
        .into_iter()
        .nth(idx)
        .ok_or_else(|| EngineError::LookupNotFound {
            candidate: roll.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::CandidateScore;

    fn population() -> Population {
        Population::from_scores(vec![
            CandidateScore::new("1", 90.0).with_category("General").with_shift("S1"),
            CandidateScore::new("2", 90.0).with_category("OBC").with_shift("S2"),
            CandidateScore::new("3", 80.0).with_category("OBC").with_shift("S1"),
            CandidateScore::new("4", 70.0).with_shift("S2"),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_scorecards_overall_ranks() {
        let cards = build_scorecards(&population(), &[Scope::Overall]);
        let ranks: Vec<usize> = cards
            .iter()
            .map(|c| c.standing(Scope::Overall).unwrap().standing.rank)
            .collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
    }

    #[test]
    fn test_scopes_missing_key_are_omitted() {
        let cards = build_scorecards(
            &population(),
            &[Scope::Overall, Scope::Category, Scope::Shift],
        );
        assert_eq!(cards[0].standings.len(), 3);
        assert_eq!(cards[3].standings.len(), 2);
        assert!(cards[3].standing(Scope::Category).is_none());

        let obc = cards[2].standing(Scope::Category).unwrap();
        assert_eq!(obc.group, "OBC");
        assert_eq!(obc.standing.rank, 2);
        assert_eq!(obc.standing.group_size, 2);
    }

    #[test]
    fn test_unnormalized_candidates_unranked_in_normalized_population() {
        let mut scores = vec![
            CandidateScore::new("1", 60.0).with_shift("S1"),
            CandidateScore::new("2", 40.0).with_shift("S2"),
            CandidateScore::new("3", 95.0),
        ];
        scores[0].normalized_total = Some(60.0);
        scores[1].normalized_total = Some(70.0);
        let population = Population::from_scores(scores).unwrap();

        let cards = build_scorecards(&population, &[Scope::Overall, Scope::Shift]);
        assert!(cards[2].standings.is_empty());
        let overall = cards[1].standing(Scope::Overall).unwrap();
        assert_eq!(overall.standing.rank, 1);
        assert_eq!(overall.standing.group_size, 2);
    }

    #[test]
    fn test_scorecard_for_known_candidate() {
        let card = scorecard_for(&population(), "3", &[Scope::Shift]).unwrap();
        assert_eq!(card.roll, "3");
        let shift = card.standing(Scope::Shift).unwrap();
        assert_eq!(shift.group, "S1");
        assert_eq!(shift.standing.rank, 2);
        assert_eq!(shift.standing.percentile, 50.0);
    }

    #[test]
    fn test_scorecard_for_unknown_candidate() {
        let err = scorecard_for(&population(), "99", &[Scope::Overall]).unwrap_err();
        assert_eq!(
            err,
            EngineError::LookupNotFound {
                candidate: "99".to_string()
            }
        );
    }
}
