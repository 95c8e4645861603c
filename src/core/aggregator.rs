use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::models::{
    Candidate, District, DistrictId, EnrichedCandidate, FacilityMatch, FilterCriteria, PropertyId,
};
use crate::services::{PropertyStore, StoreError};

/// Search radius of the nearest-facility index
pub const FACILITY_RADIUS_M: f64 = 2000.0;

/// Commute time assigned to listings without a commute record
pub const MISSING_COMMUTE_MINUTES: f64 = 9999.0;

/// Auxiliary attributes fetched once per candidate set
#[derive(Debug, Default, Clone)]
pub struct LookupTables {
    pub districts: HashMap<DistrictId, District>,
    pub images: HashMap<PropertyId, String>,
    pub commutes: HashMap<PropertyId, f64>,
    pub facilities: HashMap<PropertyId, Vec<FacilityMatch>>,
}

/// Stage 2 of the pipeline: batched feature joins
///
/// One store round trip per dimension (district, image, commute, facility),
/// all issued concurrently. Candidates are then projected independently from
/// the shared lookup tables.
#[derive(Clone)]
pub struct FeatureAggregator {
    store: Arc<dyn PropertyStore>,
    radius_m: f64,
    missing_commute_minutes: f64,
}

impl FeatureAggregator {
    pub fn new(store: Arc<dyn PropertyStore>, radius_m: f64, missing_commute_minutes: f64) -> Self {
        Self {
            store,
            radius_m,
            missing_commute_minutes,
        }
    }

    pub async fn aggregate(
        &self,
        candidates: Vec<Candidate>,
        criteria: &FilterCriteria,
    ) -> Result<Vec<EnrichedCandidate>, StoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let tables = self.fetch_tables(&candidates, criteria).await?;

        tracing::debug!(
            "Fetched {} districts, {} images, {} commutes, {} facility sets for {} candidates",
            tables.districts.len(),
            tables.images.len(),
            tables.commutes.len(),
            tables.facilities.len(),
            candidates.len()
        );

        Ok(candidates
            .into_iter()
            .map(|candidate| enrich(candidate, &tables, self.missing_commute_minutes))
            .collect())
    }

    async fn fetch_tables(
        &self,
        candidates: &[Candidate],
        criteria: &FilterCriteria,
    ) -> Result<LookupTables, StoreError> {
        let property_ids: Vec<PropertyId> = candidates.iter().map(|c| c.property_id).collect();
        let district_ids: Vec<DistrictId> = candidates
            .iter()
            .filter_map(|c| c.district_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (districts, images, commutes, facilities) = tokio::try_join!(
            self.store.districts_by_ids(&district_ids),
            self.store.image_urls_by_ids(&property_ids),
            self.store.commute_minutes_by_ids(&property_ids, criteria.school_id),
            self.store.nearest_facilities(&property_ids, self.radius_m),
        )?;

        Ok(LookupTables {
            districts,
            images,
            commutes,
            facilities,
        })
    }
}

/// Project one candidate through the lookup tables
///
/// Missing records never drop the candidate: an unknown district contributes
/// safety 0 and an empty name, an unknown commute the sentinel value, and
/// missing facilities an empty list.
pub fn enrich(candidate: Candidate, tables: &LookupTables, missing_commute_minutes: f64) -> EnrichedCandidate {
    let district = candidate
        .district_id
        .and_then(|id| tables.districts.get(&id));
    let (district_name, safety_score) = match district {
        Some(d) => (d.name.clone(), d.safety_score),
        None => (String::new(), 0.0),
    };

    let commute_minutes = tables
        .commutes
        .get(&candidate.property_id)
        .copied()
        .unwrap_or(missing_commute_minutes);

    let image_url = tables
        .images
        .get(&candidate.property_id)
        .cloned()
        .or_else(|| candidate.image_url.clone());

    let facilities = tables
        .facilities
        .get(&candidate.property_id)
        .cloned()
        .unwrap_or_default();

    EnrichedCandidate {
        candidate,
        district_name,
        safety_score,
        commute_minutes,
        image_url,
        facilities,
    }
}
