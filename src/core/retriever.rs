use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Candidate, CandidateQuery, FilterCriteria, PropertyId};
use crate::services::{PropertyStore, StoreError};

/// Minimum number of candidates handed to ranking when the store has them
pub const DEFAULT_TARGET_COUNT: usize = 50;

/// Stage 1 of the pipeline: hard-constraint retrieval with a guaranteed floor
///
/// # Steps
/// 1. Query listings matching the criteria (commute join, rent range and any
///    optional predicates that are present)
/// 2. If fewer than `target_count` matched, top up with the shortest-commute
///    listings for the same institution that were not already returned
/// 3. Drop duplicate listings, keeping the first occurrence
/// 4. Return at most `target_count` candidates
#[derive(Clone)]
pub struct CandidateRetriever {
    store: Arc<dyn PropertyStore>,
    target_count: usize,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn PropertyStore>, target_count: usize) -> Self {
        Self {
            store,
            target_count,
        }
    }

    /// Retrieve candidates for `criteria`
    ///
    /// Store failures are returned as-is; retrying is the caller's decision.
    pub async fn retrieve(&self, criteria: &FilterCriteria) -> Result<Vec<Candidate>, StoreError> {
        let query = CandidateQuery::from(criteria);
        let mut candidates = self.store.query_candidates(&query).await?;
        let matched = candidates.len();

        tracing::debug!(
            "Primary retrieval matched {} listings for school {}",
            matched,
            criteria.school_id
        );

        if matched < self.target_count {
            let existing_ids: Vec<PropertyId> =
                candidates.iter().map(|c| c.property_id).collect();
            let fallback = self
                .store
                .query_fallback(criteria.school_id, &existing_ids, self.target_count - matched)
                .await?;

            tracing::warn!(
                "Topped up {} primary matches with {} shortest-commute listings",
                matched,
                fallback.len()
            );
            candidates.extend(fallback);
        }

        let (mut unique, removed) = remove_duplicates(candidates);
        if removed > 0 {
            tracing::debug!("Removed {} duplicate listings", removed);
        }
        unique.truncate(self.target_count);

        Ok(unique)
    }
}

/// Remove listings that repeat an earlier listing's dedup key
///
/// Returns the surviving listings in their input order and how many were
/// removed.
pub fn remove_duplicates(candidates: Vec<Candidate>) -> (Vec<Candidate>, usize) {
    let mut seen = HashSet::with_capacity(candidates.len());
    let total = candidates.len();

    let unique: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.dedup_key()))
        .collect();
    let removed = total - unique.len();

    (unique, removed)
}
