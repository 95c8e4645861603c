use crate::models::{ImportanceWeights, LayeredCandidate, Objective, RankedCandidate, ScoreVector};

/// Sum of each objective score times the user's importance for it
///
/// Only breaks ties left after layer and crowding distance.
pub fn weighted_score(scores: &ScoreVector, importance: &ImportanceWeights) -> f64 {
    Objective::ALL
        .iter()
        .map(|&objective| objective.score(scores) * importance.weight(objective))
        .sum()
}

/// Stage 5 of the pipeline: final ordering
///
/// # Sort keys
/// 1. Layer index, ascending
/// 2. Crowding distance, descending (infinite first, infinities tie)
/// 3. Weighted score, descending
///
/// The sort is stable, so candidates equal on all three keys keep their
/// layering order.
pub fn rank(layered: Vec<LayeredCandidate>, importance: &ImportanceWeights) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = layered
        .into_iter()
        .map(|l| {
            let weighted_score = weighted_score(&l.scored.scores, importance);
            RankedCandidate {
                scored: l.scored,
                layer: l.layer,
                crowding: l.crowding,
                weighted_score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.layer
            .cmp(&b.layer)
            .then_with(|| a.crowding.cmp_more_diverse_first(&b.crowding))
            .then_with(|| b.weighted_score.total_cmp(&a.weighted_score))
    });

    ranked
}
