use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{
    Candidate, CandidateQuery, District, DistrictId, FacilityMatch, InstitutionId, PropertyId,
};

/// Errors raised by a property store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to listings and their auxiliary attributes
///
/// Every lookup is batched by id set so that enriching a candidate list costs
/// one round trip per dimension, not one per candidate. Implementations are
/// shared between concurrent requests and must not keep per-request state.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Listings matching the hard constraints, joined to commute times for
    /// the query's institution.
    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>, StoreError>;

    /// Listings with a commute record for `school_id`, excluding `exclude_ids`,
    /// shortest commute first, at most `limit` rows.
    async fn query_fallback(
        &self,
        school_id: InstitutionId,
        exclude_ids: &[PropertyId],
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError>;

    async fn districts_by_ids(
        &self,
        ids: &[DistrictId],
    ) -> Result<HashMap<DistrictId, District>, StoreError>;

    async fn image_urls_by_ids(
        &self,
        ids: &[PropertyId],
    ) -> Result<HashMap<PropertyId, String>, StoreError>;

    async fn commute_minutes_by_ids(
        &self,
        ids: &[PropertyId],
        school_id: InstitutionId,
    ) -> Result<HashMap<PropertyId, f64>, StoreError>;

    /// Nearest facility per category within `radius_m` of each listing.
    async fn nearest_facilities(
        &self,
        ids: &[PropertyId],
        radius_m: f64,
    ) -> Result<HashMap<PropertyId, Vec<FacilityMatch>>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
