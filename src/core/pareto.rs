use crate::core::normalizer::DEGENERATE_EPSILON;
use crate::models::{CrowdingDistance, LayeredCandidate, Objective, ScoreVector, ScoredCandidate};

/// Drop candidates whose score vector has a component outside (0, 1]
///
/// Routine filtering rather than an error; an emptied set is a valid outcome.
pub fn retain_valid(scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let total = scored.len();
    let valid: Vec<ScoredCandidate> = scored.into_iter().filter(|s| s.scores.is_valid()).collect();

    if valid.len() < total {
        tracing::warn!(
            "Dropped {} of {} candidates with out-of-range scores",
            total - valid.len(),
            total
        );
    }

    valid
}

/// Partition `scores` into successive Pareto fronts
///
/// Returns indices into `scores`, layer 0 first. Each front is built in one
/// pass over the remaining pool: a newcomer dominated by a current front
/// member is deferred, otherwise it joins the front and evicts (defers) every
/// member it dominates. Deferred candidates form the pool for the next layer,
/// in deferral order.
pub fn pareto_layers(scores: &[ScoreVector]) -> Vec<Vec<usize>> {
    let mut layers = Vec::new();
    let mut remaining: Vec<usize> = (0..scores.len()).collect();

    while !remaining.is_empty() {
        let mut front: Vec<usize> = Vec::new();
        let mut deferred: Vec<usize> = Vec::new();

        for idx in remaining {
            let candidate = &scores[idx];

            if front.iter().any(|&member| scores[member].dominates(candidate)) {
                deferred.push(idx);
                continue;
            }

            let mut kept = Vec::with_capacity(front.len() + 1);
            for member in front {
                if candidate.dominates(&scores[member]) {
                    deferred.push(member);
                } else {
                    kept.push(member);
                }
            }
            kept.push(idx);
            front = kept;
        }

        layers.push(front);
        remaining = deferred;
    }

    layers
}

/// Crowding distance of each member of `layer`, aligned with `layer`
///
/// Layers of one or two members are all boundary points. Otherwise, per
/// objective, the best and worst members are boundaries and every interior
/// member accumulates the normalized gap between its neighbours; objectives
/// with a near-zero spread contribute nothing beyond their boundaries.
pub fn crowding_distances(scores: &[ScoreVector], layer: &[usize]) -> Vec<CrowdingDistance> {
    if layer.len() <= 2 {
        return vec![CrowdingDistance::Infinite; layer.len()];
    }

    // Accumulators keyed by position within the layer
    let mut distances = vec![CrowdingDistance::Finite(0.0); layer.len()];
    let last = layer.len() - 1;

    for objective in Objective::ALL {
        let value = |pos: usize| objective.score(&scores[layer[pos]]);

        let mut order: Vec<usize> = (0..layer.len()).collect();
        order.sort_by(|&a, &b| value(b).total_cmp(&value(a)));

        distances[order[0]] = CrowdingDistance::Infinite;
        distances[order[last]] = CrowdingDistance::Infinite;

        let range = value(order[0]) - value(order[last]);
        if range < DEGENERATE_EPSILON {
            continue;
        }

        for i in 1..last {
            if let CrowdingDistance::Finite(acc) = distances[order[i]] {
                let gap = (value(order[i - 1]) - value(order[i + 1])) / range;
                distances[order[i]] = CrowdingDistance::Finite(acc + gap);
            }
        }
    }

    distances
}

/// Stage 4 of the pipeline: layer index and crowding distance per candidate
///
/// Output is grouped by layer, best layer first.
pub fn layer_and_crowd(scored: Vec<ScoredCandidate>) -> Vec<LayeredCandidate> {
    let scores: Vec<ScoreVector> = scored.iter().map(|s| s.scores).collect();
    let layers = pareto_layers(&scores);

    tracing::debug!(
        "Partitioned {} candidates into {} Pareto layers",
        scored.len(),
        layers.len()
    );

    let mut slots: Vec<Option<ScoredCandidate>> = scored.into_iter().map(Some).collect();
    let mut layered = Vec::with_capacity(slots.len());

    for (layer_idx, layer) in layers.iter().enumerate() {
        let crowding = crowding_distances(&scores, layer);
        for (&idx, crowding) in layer.iter().zip(crowding) {
            // Every index appears in exactly one layer
            if let Some(candidate) = slots[idx].take() {
                layered.push(LayeredCandidate {
                    scored: candidate,
                    layer: layer_idx,
                    crowding,
                });
            }
        }
    }

    layered
}
