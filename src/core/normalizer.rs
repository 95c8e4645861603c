use crate::models::{EnrichedCandidate, Objective, ScoreVector, ScoredCandidate};

/// Ranges narrower than this are treated as a single value
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Relative weight of facility count against safety in the neighbourhood composite
pub const FACILITY_WEIGHT: f64 = 2.0;
pub const SAFETY_WEIGHT: f64 = 1.0;

/// Which end of a raw signal is preferable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Min-max scale `values` onto [0, 1] with the preferred end at 1
///
/// A degenerate batch (all values within [`DEGENERATE_EPSILON`]) scores 1.0
/// across the board.
pub fn min_max_normalize(values: &[f64], direction: Direction) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let range = max - min;

    if range < DEGENERATE_EPSILON {
        return vec![1.0; values.len()];
    }

    values
        .iter()
        .map(|&v| {
            let scaled = match direction {
                Direction::HigherIsBetter => (v - min) / range,
                Direction::LowerIsBetter => (max - v) / range,
            };
            scaled.clamp(0.0, 1.0)
        })
        .collect()
}

/// Neighbourhood composite per candidate, before its own normalization
///
/// Facility count and safety are each scaled within the batch first so the
/// 2:1 weighting compares like with like.
pub fn neighborhood_composite(enriched: &[EnrichedCandidate]) -> Vec<f64> {
    let facility_counts: Vec<f64> = enriched.iter().map(|e| e.facility_count() as f64).collect();
    let safety_scores: Vec<f64> = enriched.iter().map(|e| e.safety_score).collect();

    let facility_norm = min_max_normalize(&facility_counts, Direction::HigherIsBetter);
    let safety_norm = min_max_normalize(&safety_scores, Direction::HigherIsBetter);

    facility_norm
        .iter()
        .zip(&safety_norm)
        .map(|(f, s)| f * FACILITY_WEIGHT + s * SAFETY_WEIGHT)
        .collect()
}

/// Stage 3 of the pipeline: batch-relative objective scores
///
/// Scores are relative to this candidate set only; the same listing can
/// score differently against a different pool.
pub fn normalize(enriched: Vec<EnrichedCandidate>) -> Vec<ScoredCandidate> {
    let prices: Vec<f64> = enriched.iter().map(|e| f64::from(e.candidate.price)).collect();
    let commutes: Vec<f64> = enriched.iter().map(|e| e.commute_minutes).collect();
    let composite = neighborhood_composite(&enriched);

    let columns = [
        (Objective::Cost, min_max_normalize(&prices, Direction::LowerIsBetter)),
        (Objective::Commute, min_max_normalize(&commutes, Direction::LowerIsBetter)),
        (Objective::Neighborhood, min_max_normalize(&composite, Direction::HigherIsBetter)),
    ];

    enriched
        .into_iter()
        .enumerate()
        .map(|(i, enriched)| {
            let mut scores = ScoreVector::default();
            for (objective, column) in &columns {
                objective.set_score(&mut scores, column[i]);
            }
            ScoredCandidate { enriched, scores }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_is_better_inverts() {
        let scores = min_max_normalize(&[1000.0, 2000.0, 3000.0], Direction::LowerIsBetter);
        assert_eq!(scores, vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_higher_is_better() {
        let scores = min_max_normalize(&[0.0, 1.0, 4.0], Direction::HigherIsBetter);
        assert_eq!(scores, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_degenerate_range_saturates() {
        let scores = min_max_normalize(&[42.0, 42.0 + 1e-9, 42.0], Direction::LowerIsBetter);
        assert_eq!(scores, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_near_worst_score_is_not_rounded_away() {
        let scores = min_max_normalize(&[1000.0, 1996.0, 2000.0], Direction::LowerIsBetter);

        // 0.004 stays a valid score instead of collapsing to 0.00
        assert!((scores[1] - 0.004).abs() < 1e-12);
        assert!(ScoreVector::new(scores[1], 0.5, 0.5).is_valid());
    }

    #[test]
    fn test_empty_input() {
        assert!(min_max_normalize(&[], Direction::HigherIsBetter).is_empty());
        assert!(normalize(Vec::new()).is_empty());
    }
}
