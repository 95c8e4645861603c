// Ranking pipeline exports
pub mod aggregator;
pub mod distance;
pub mod engine;
pub mod normalizer;
pub mod pareto;
pub mod ranking;
pub mod retriever;

pub use aggregator::FeatureAggregator;
pub use distance::{calculate_bounding_box, haversine_distance_m, is_within_bounding_box};
pub use engine::{rank_candidates, EngineError, EngineSettings, RecommendationEngine};
pub use normalizer::normalize;
pub use pareto::{crowding_distances, layer_and_crowd, pareto_layers, retain_valid};
pub use ranking::{rank, weighted_score};
pub use retriever::{remove_duplicates, CandidateRetriever};
