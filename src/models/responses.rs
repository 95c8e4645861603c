use serde::{Deserialize, Serialize};
use crate::models::domain::{CrowdingDistance, FacilityMatch, RankedCandidate};

/// A ranked listing as shown to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedProperty {
    #[serde(rename = "propertyId")]
    pub property_id: i32,
    #[serde(rename = "imgSrc")]
    pub img_src: Option<String>,
    pub name: String,
    pub district: String,
    pub price: i32,
    pub beds: i32,
    pub baths: i32,
    pub area: i32,
    #[serde(rename = "buildTime")]
    pub build_time: Option<i32>,
    pub location: String,
    #[serde(rename = "timeToSchool")]
    pub time_to_school: f64,
    #[serde(rename = "distanceToMrt")]
    pub distance_to_mrt: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "publicFacilities")]
    pub public_facilities: Vec<FacilityMatch>,
    #[serde(rename = "facilityType")]
    pub facility_type: String,
    #[serde(rename = "costScore")]
    pub cost_score: f64,
    #[serde(rename = "commuteScore")]
    pub commute_score: f64,
    #[serde(rename = "neighborhoodScore")]
    pub neighborhood_score: f64,
    pub layer: usize,
    pub crowding: CrowdingDistance,
    #[serde(rename = "weightedScore")]
    pub weighted_score: f64,
}

impl From<RankedCandidate> for RecommendedProperty {
    fn from(ranked: RankedCandidate) -> Self {
        let scores = ranked.scored.scores;
        let enriched = ranked.scored.enriched;
        let candidate = enriched.candidate;

        Self {
            property_id: candidate.property_id,
            img_src: enriched.image_url,
            name: candidate.name,
            district: enriched.district_name,
            price: candidate.price,
            beds: candidate.beds,
            baths: candidate.baths,
            area: candidate.area_sqft,
            build_time: candidate.build_time,
            location: candidate.location,
            time_to_school: enriched.commute_minutes,
            distance_to_mrt: candidate.distance_to_mrt,
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            public_facilities: enriched.facilities,
            facility_type: candidate.flat_type,
            cost_score: scores.cost,
            commute_score: scores.commute,
            neighborhood_score: scores.neighborhood,
            layer: ranked.layer,
            crowding: ranked.crowding,
            weighted_score: ranked.weighted_score,
        }
    }
}

/// Response for the recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub properties: Vec<RecommendedProperty>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
