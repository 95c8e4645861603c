use std::sync::Arc;
use thiserror::Error;

use crate::core::aggregator::{FeatureAggregator, FACILITY_RADIUS_M, MISSING_COMMUTE_MINUTES};
use crate::core::normalizer::normalize;
use crate::core::pareto::{layer_and_crowd, retain_valid};
use crate::core::ranking::rank;
use crate::core::retriever::{CandidateRetriever, DEFAULT_TARGET_COUNT};
use crate::models::{EnrichedCandidate, FilterCriteria, RankedCandidate};
use crate::services::{PropertyStore, StoreError};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Candidate retrieval failed: {0}")]
    Retrieval(#[source] StoreError),

    #[error("Feature aggregation failed: {0}")]
    Enrichment(#[source] StoreError),
}

/// Tunables of the ranking pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Candidate floor that triggers the fallback query
    pub target_count: usize,
    pub facility_radius_m: f64,
    pub missing_commute_minutes: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            facility_radius_m: FACILITY_RADIUS_M,
            missing_commute_minutes: MISSING_COMMUTE_MINUTES,
        }
    }
}

/// Recommendation orchestrator
///
/// # Pipeline Stages
/// 1. Candidate retrieval with a guaranteed floor
/// 2. Batched feature aggregation
/// 3. Batch-relative normalization
/// 4. Validation drop, Pareto layering and crowding distance
/// 5. Final ordering by layer, crowding and weighted score
///
/// Holds no per-request state; clones share the underlying store.
#[derive(Clone)]
pub struct RecommendationEngine {
    retriever: CandidateRetriever,
    aggregator: FeatureAggregator,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn PropertyStore>, settings: EngineSettings) -> Self {
        Self {
            retriever: CandidateRetriever::new(store.clone(), settings.target_count),
            aggregator: FeatureAggregator::new(
                store,
                settings.facility_radius_m,
                settings.missing_commute_minutes,
            ),
        }
    }

    /// Rank rental listings for `criteria`
    ///
    /// # Arguments
    /// * `criteria` - Hard constraints and importance weights of the request
    /// * `limit` - Maximum number of results; `None` returns every ranked candidate
    ///
    /// # Returns
    /// Candidates best first. An empty list is a valid outcome.
    pub async fn recommend(
        &self,
        criteria: &FilterCriteria,
        limit: Option<usize>,
    ) -> Result<Vec<RankedCandidate>, EngineError> {
        criteria.check().map_err(EngineError::InvalidCriteria)?;

        // Stage 1: Retrieval
        let candidates = self
            .retriever
            .retrieve(criteria)
            .await
            .map_err(EngineError::Retrieval)?;

        if candidates.is_empty() {
            tracing::info!("No candidates for school {}", criteria.school_id);
            return Ok(Vec::new());
        }

        // Stage 2: Enrichment
        let enriched = self
            .aggregator
            .aggregate(candidates, criteria)
            .await
            .map_err(EngineError::Enrichment)?;

        // Stages 3-5 are pure
        let mut ranked = rank_candidates(enriched, criteria);

        tracing::info!(
            "Ranked {} candidates for school {}",
            ranked.len(),
            criteria.school_id
        );

        if let Some(limit) = limit {
            ranked.truncate(limit);
        }

        Ok(ranked)
    }
}

/// CPU-bound tail of the pipeline: normalize, drop invalid vectors, layer and rank
pub fn rank_candidates(enriched: Vec<EnrichedCandidate>, criteria: &FilterCriteria) -> Vec<RankedCandidate> {
    let scored = retain_valid(normalize(enriched));
    let layered = layer_and_crowd(scored);
    rank(layered, &criteria.importance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, District, FacilityCategory, FacilityDistanceRow, ImportanceWeights};
    use crate::services::InMemoryStore;

    fn listing(id: i32, price: i32, district_id: i32) -> Candidate {
        Candidate {
            property_id: id,
            name: format!("Listing {}", id),
            price,
            area_sqft: 750,
            flat_type: "HDB".to_string(),
            location: "Kent Ridge".to_string(),
            distance_to_mrt: Some(300),
            beds: 2,
            baths: 1,
            build_time: Some(2005),
            district_id: Some(district_id),
            latitude: None,
            longitude: None,
            commute_minutes: None,
            image_url: None,
        }
    }

    fn facility(property_id: i32, category: FacilityCategory) -> FacilityDistanceRow {
        FacilityDistanceRow {
            property_id,
            category,
            name: format!("{} near {}", category.as_str(), property_id),
            distance_m: 600.0,
        }
    }

    fn district(id: i32, safety_score: f64) -> District {
        District {
            id,
            name: format!("District {}", id),
            safety_score,
        }
    }

    /// A cheap with good amenities, B expensive and far, C closest
    fn scenario_store() -> InMemoryStore {
        InMemoryStore::new()
            .with_property(listing(1, 1200, 1))
            .with_property(listing(2, 2800, 2))
            .with_property(listing(3, 1500, 3))
            .with_commute(1, 3, Some(20.0))
            .with_commute(2, 3, Some(45.0))
            .with_commute(3, 3, Some(10.0))
            .with_district(district(1, 0.8))
            .with_district(district(2, 0.2))
            .with_district(district(3, 0.5))
            .with_facility_row(facility(1, FacilityCategory::Park))
            .with_facility_row(facility(1, FacilityCategory::HawkerCentre))
            .with_facility_row(facility(3, FacilityCategory::Library))
    }

    fn scenario_criteria() -> FilterCriteria {
        FilterCriteria::new(1000, 3000, 3).with_importance(ImportanceWeights::new(5, 4, 3))
    }

    #[tokio::test]
    async fn test_three_listing_scenario() {
        let engine = RecommendationEngine::new(Arc::new(scenario_store()), EngineSettings::default());

        let ranked = engine.recommend(&scenario_criteria(), None).await.unwrap();

        // B scores zero on every objective and is dropped
        let ids: Vec<_> = ranked.iter().map(|r| r.property_id()).collect();
        assert_eq!(ids, vec![1, 3]);

        let a = &ranked[0];
        assert_eq!(a.scores().cost, 1.0);
        assert!((a.scores().commute - 25.0 / 35.0).abs() < 1e-9);
        assert_eq!(a.scores().neighborhood, 1.0);
        assert_eq!(a.layer, 0);
        assert!(a.crowding.is_infinite());

        let c = &ranked[1];
        assert!((c.scores().cost - 0.8125).abs() < 1e-9);
        assert_eq!(c.scores().commute, 1.0);
        assert!((c.scores().neighborhood - 0.5).abs() < 1e-9);
        assert!(a.weighted_score > c.weighted_score);
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let engine = RecommendationEngine::new(Arc::new(scenario_store()), EngineSettings::default());

        let ranked = engine.recommend(&scenario_criteria(), Some(1)).await.unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].property_id(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty() {
        let engine = RecommendationEngine::new(Arc::new(InMemoryStore::new()), EngineSettings::default());

        let ranked = engine.recommend(&scenario_criteria(), None).await.unwrap();

        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_single_candidate_passes_through() {
        let store = InMemoryStore::new()
            .with_property(listing(9, 1800, 1))
            .with_commute(9, 3, Some(30.0));
        let engine = RecommendationEngine::new(Arc::new(store), EngineSettings::default());

        let ranked = engine.recommend(&scenario_criteria(), None).await.unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].layer, 0);
        assert!(ranked[0].crowding.is_infinite());
        assert_eq!(ranked[0].scores().cost, 1.0);
    }

    #[tokio::test]
    async fn test_invalid_criteria_rejected() {
        let engine = RecommendationEngine::new(Arc::new(scenario_store()), EngineSettings::default());

        let result = engine.recommend(&FilterCriteria::new(3000, 1000, 3), None).await;

        assert!(matches!(result, Err(EngineError::InvalidCriteria(_))));
    }

    #[tokio::test]
    async fn test_unavailable_store_is_retrieval_error() {
        let engine = RecommendationEngine::new(Arc::new(InMemoryStore::unavailable()), EngineSettings::default());

        let result = engine.recommend(&scenario_criteria(), None).await;

        assert!(matches!(result, Err(EngineError::Retrieval(_))));
    }
}
