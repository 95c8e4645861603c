// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Candidate, CandidateQuery, CrowdingDistance, DedupKey, District, DistrictId, EnrichedCandidate,
    Facility, FacilityCategory, FacilityDistanceRow, FacilityMatch, FilterCriteria, ImportanceWeights,
    InstitutionId, LayeredCandidate, Objective, PropertyId, RankedCandidate, ScoreVector, ScoredCandidate,
};
pub use requests::RecommendRequest;
pub use responses::{ErrorResponse, HealthResponse, RecommendResponse, RecommendedProperty};
