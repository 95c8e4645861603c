use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::distance::{build_facility_index, nearest_per_category};
use crate::models::{
    Candidate, CandidateQuery, District, DistrictId, Facility, FacilityDistanceRow, FacilityMatch,
    InstitutionId, PropertyId,
};
use crate::services::store::{PropertyStore, StoreError};

/// Property store over in-process data
///
/// Mirrors the query semantics of [`PostgresStore`](super::PostgresStore):
/// only listings with a commute record for the requested institution are
/// candidates, rows come back in id order, and the fallback query orders by
/// commute time.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    properties: Vec<Candidate>,
    commute_times: HashMap<(PropertyId, InstitutionId), Option<f64>>,
    districts: HashMap<DistrictId, District>,
    images: HashMap<PropertyId, String>,
    facility_rows: Vec<FacilityDistanceRow>,
    unavailable: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every query fails, as if the database were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_property(mut self, property: Candidate) -> Self {
        self.properties.push(property);
        self
    }

    /// Record a commute time; `None` keeps the join row but leaves the time unknown
    pub fn with_commute(
        mut self,
        property_id: PropertyId,
        school_id: InstitutionId,
        minutes: Option<f64>,
    ) -> Self {
        self.commute_times.insert((property_id, school_id), minutes);
        self
    }

    pub fn with_district(mut self, district: District) -> Self {
        self.districts.insert(district.id, district);
        self
    }

    pub fn with_image(mut self, property_id: PropertyId, url: impl Into<String>) -> Self {
        self.images.insert(property_id, url.into());
        self
    }

    pub fn with_facility_row(mut self, row: FacilityDistanceRow) -> Self {
        self.facility_rows.push(row);
        self
    }

    /// Index facilities against the coordinates of every listing added so far
    pub fn with_facilities(mut self, facilities: &[Facility], radius_m: f64) -> Self {
        let rows = build_facility_index(&self.properties, facilities, radius_m);
        self.facility_rows.extend(rows);
        self
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    /// Listings joined to their commute time for `school_id`, in id order
    fn joined(&self, school_id: InstitutionId) -> Vec<Candidate> {
        let mut joined: Vec<Candidate> = self
            .properties
            .iter()
            .filter_map(|property| {
                let minutes = self.commute_times.get(&(property.property_id, school_id))?;
                let mut candidate = property.clone();
                candidate.commute_minutes = *minutes;
                Some(candidate)
            })
            .collect();
        joined.sort_by_key(|c| c.property_id);
        joined
    }
}

fn matches_query(candidate: &Candidate, query: &CandidateQuery) -> bool {
    if candidate.price < query.min_price || candidate.price > query.max_price {
        return false;
    }

    if let Some(district_id) = query.district_id {
        if candidate.district_id != Some(district_id) {
            return false;
        }
    }

    // SQL comparison against NULL is never true
    if let Some(max_commute) = query.max_commute_minutes {
        match candidate.commute_minutes {
            Some(minutes) if minutes <= max_commute => {}
            _ => return false,
        }
    }

    if !query.flat_types.is_empty() && !query.flat_types.contains(&candidate.flat_type) {
        return false;
    }

    if let Some(max_mrt) = query.max_mrt_distance {
        match candidate.distance_to_mrt {
            Some(distance) if distance <= max_mrt => {}
            _ => return false,
        }
    }

    true
}

#[async_trait]
impl PropertyStore for InMemoryStore {
    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>, StoreError> {
        self.ensure_available()?;

        Ok(self
            .joined(query.school_id)
            .into_iter()
            .filter(|candidate| matches_query(candidate, query))
            .collect())
    }

    async fn query_fallback(
        &self,
        school_id: InstitutionId,
        exclude_ids: &[PropertyId],
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        self.ensure_available()?;

        let mut rows: Vec<Candidate> = self
            .joined(school_id)
            .into_iter()
            .filter(|candidate| !exclude_ids.contains(&candidate.property_id))
            .collect();

        // ASC NULLS LAST, then id; the sort is stable over id order
        rows.sort_by(|a, b| match (a.commute_minutes, b.commute_minutes) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        rows.truncate(limit);

        Ok(rows)
    }

    async fn districts_by_ids(
        &self,
        ids: &[DistrictId],
    ) -> Result<HashMap<DistrictId, District>, StoreError> {
        self.ensure_available()?;

        Ok(ids
            .iter()
            .filter_map(|id| self.districts.get(id).map(|d| (*id, d.clone())))
            .collect())
    }

    async fn image_urls_by_ids(
        &self,
        ids: &[PropertyId],
    ) -> Result<HashMap<PropertyId, String>, StoreError> {
        self.ensure_available()?;

        Ok(ids
            .iter()
            .filter_map(|id| self.images.get(id).map(|url| (*id, url.clone())))
            .collect())
    }

    async fn commute_minutes_by_ids(
        &self,
        ids: &[PropertyId],
        school_id: InstitutionId,
    ) -> Result<HashMap<PropertyId, f64>, StoreError> {
        self.ensure_available()?;

        Ok(ids
            .iter()
            .filter_map(|id| {
                let minutes = (*self.commute_times.get(&(*id, school_id))?)?;
                Some((*id, minutes))
            })
            .collect())
    }

    async fn nearest_facilities(
        &self,
        ids: &[PropertyId],
        radius_m: f64,
    ) -> Result<HashMap<PropertyId, Vec<FacilityMatch>>, StoreError> {
        self.ensure_available()?;

        Ok(nearest_per_category(&self.facility_rows, ids, radius_m))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: PropertyId, price: i32, flat_type: &str) -> Candidate {
        Candidate {
            property_id: id,
            name: format!("Listing {}", id),
            price,
            area_sqft: 600,
            flat_type: flat_type.to_string(),
            location: "Queenstown".to_string(),
            distance_to_mrt: Some(400),
            beds: 1,
            baths: 1,
            build_time: Some(2010),
            district_id: Some(3),
            latitude: None,
            longitude: None,
            commute_minutes: None,
            image_url: None,
        }
    }

    fn query(school_id: InstitutionId) -> CandidateQuery {
        CandidateQuery {
            school_id,
            min_price: 1000,
            max_price: 3000,
            district_id: None,
            max_commute_minutes: None,
            flat_types: vec![],
            max_mrt_distance: None,
        }
    }

    #[tokio::test]
    async fn test_query_requires_commute_join() {
        let store = InMemoryStore::new()
            .with_property(listing(1, 1500, "HDB"))
            .with_property(listing(2, 1500, "HDB"))
            .with_commute(1, 3, Some(20.0))
            .with_commute(2, 4, Some(20.0));

        let rows = store.query_candidates(&query(3)).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].property_id, 1);
        assert_eq!(rows[0].commute_minutes, Some(20.0));
    }

    #[tokio::test]
    async fn test_optional_predicates() {
        let store = InMemoryStore::new()
            .with_property(listing(1, 1500, "HDB"))
            .with_property(listing(2, 1500, "Condo"))
            .with_property(listing(3, 3500, "HDB"))
            .with_commute(1, 3, Some(20.0))
            .with_commute(2, 3, Some(50.0))
            .with_commute(3, 3, Some(10.0));

        let all = store.query_candidates(&query(3)).await.unwrap();
        assert_eq!(all.len(), 2);

        let mut limited = query(3);
        limited.max_commute_minutes = Some(30.0);
        let rows = store.query_candidates(&limited).await.unwrap();
        assert_eq!(rows.len(), 1);

        let mut typed = query(3);
        typed.flat_types = vec!["Condo".to_string()];
        let rows = store.query_candidates(&typed).await.unwrap();
        assert_eq!(rows[0].property_id, 2);
    }

    #[tokio::test]
    async fn test_fallback_orders_by_commute() {
        let store = InMemoryStore::new()
            .with_property(listing(1, 5000, "HDB"))
            .with_property(listing(2, 5000, "HDB"))
            .with_property(listing(3, 5000, "HDB"))
            .with_commute(1, 3, None)
            .with_commute(2, 3, Some(40.0))
            .with_commute(3, 3, Some(15.0));

        let rows = store.query_fallback(3, &[], 10).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|c| c.property_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let rows = store.query_fallback(3, &[3], 1).await.unwrap();
        assert_eq!(rows[0].property_id, 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = InMemoryStore::unavailable();

        assert!(matches!(
            store.query_candidates(&query(1)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(!store.health_check().await.unwrap());
    }
}
