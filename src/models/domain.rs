use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Primary key of a listing in `housing_data`
pub type PropertyId = i32;

/// Primary key of a row in `districts`
pub type DistrictId = i32;

/// Primary key of a row in `universities`
pub type InstitutionId = i32;

/// A rental listing as returned by candidate retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "propertyId")]
    pub property_id: PropertyId,
    pub name: String,
    pub price: i32,
    #[serde(rename = "areaSqft")]
    pub area_sqft: i32,
    #[serde(rename = "flatType")]
    pub flat_type: String,
    pub location: String,
    #[serde(rename = "distanceToMrt", default)]
    pub distance_to_mrt: Option<i32>,
    #[serde(default)]
    pub beds: i32,
    #[serde(default)]
    pub baths: i32,
    #[serde(rename = "buildTime", default)]
    pub build_time: Option<i32>,
    #[serde(rename = "districtId", default)]
    pub district_id: Option<DistrictId>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "commuteMinutes", default)]
    pub commute_minutes: Option<f64>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

impl Candidate {
    /// Identity used for de-duplication.
    ///
    /// Two listings that agree on every field of this key are the same flat
    /// scraped twice, whatever their ids say.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            price: self.price,
            area_sqft: self.area_sqft,
            flat_type: self.flat_type.clone(),
            location: self.location.clone(),
            distance_to_mrt: self.distance_to_mrt,
            beds: self.beds,
            baths: self.baths,
        }
    }
}

/// Field tuple compared when removing duplicate listings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    name: String,
    price: i32,
    area_sqft: i32,
    flat_type: String,
    location: String,
    distance_to_mrt: Option<i32>,
    beds: i32,
    baths: i32,
}

/// District record used for the safety signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    #[serde(rename = "safetyScore")]
    pub safety_score: f64,
}

/// Facility categories covered by the nearest-facility index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilityCategory {
    Park,
    #[serde(rename = "hawkercenter")]
    HawkerCentre,
    Supermarket,
    Library,
}

impl FacilityCategory {
    pub const ALL: [FacilityCategory; 4] = [
        FacilityCategory::Park,
        FacilityCategory::HawkerCentre,
        FacilityCategory::Supermarket,
        FacilityCategory::Library,
    ];

    /// Label stored in `housing_facility_distances.facility_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityCategory::Park => "park",
            FacilityCategory::HawkerCentre => "hawkercenter",
            FacilityCategory::Supermarket => "supermarket",
            FacilityCategory::Library => "library",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(label))
    }
}

/// A facility point before distances to listings are known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub category: FacilityCategory,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Nearest facility of one category within the search radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityMatch {
    pub category: FacilityCategory,
    pub name: String,
    #[serde(rename = "distanceM")]
    pub distance_m: f64,
}

/// One row of the precomputed listing-to-facility distance index
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityDistanceRow {
    pub property_id: PropertyId,
    pub category: FacilityCategory,
    pub name: String,
    pub distance_m: f64,
}

/// Candidate joined with its auxiliary attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    pub candidate: Candidate,
    #[serde(rename = "districtName")]
    pub district_name: String,
    #[serde(rename = "safetyScore")]
    pub safety_score: f64,
    #[serde(rename = "commuteMinutes")]
    pub commute_minutes: f64,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub facilities: Vec<FacilityMatch>,
}

impl EnrichedCandidate {
    /// Number of facility categories with a match inside the radius
    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }
}

/// The three ranking objectives, all oriented so that higher is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Objective {
    Cost,
    Commute,
    Neighborhood,
}

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Cost, Objective::Commute, Objective::Neighborhood];

    pub fn score(&self, scores: &ScoreVector) -> f64 {
        match self {
            Objective::Cost => scores.cost,
            Objective::Commute => scores.commute,
            Objective::Neighborhood => scores.neighborhood,
        }
    }

    pub fn set_score(&self, scores: &mut ScoreVector, value: f64) {
        match self {
            Objective::Cost => scores.cost = value,
            Objective::Commute => scores.commute = value,
            Objective::Neighborhood => scores.neighborhood = value,
        }
    }
}

/// Normalized objective scores for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreVector {
    #[serde(rename = "costScore")]
    pub cost: f64,
    #[serde(rename = "commuteScore")]
    pub commute: f64,
    #[serde(rename = "neighborhoodScore")]
    pub neighborhood: f64,
}

impl ScoreVector {
    pub fn new(cost: f64, commute: f64, neighborhood: f64) -> Self {
        Self {
            cost,
            commute,
            neighborhood,
        }
    }

    /// Every component lies in (0, 1]; NaN is never valid.
    pub fn is_valid(&self) -> bool {
        Objective::ALL.iter().all(|objective| {
            let value = objective.score(self);
            value > 0.0 && value <= 1.0
        })
    }

    /// True when `self` is no worse on every objective and strictly better on one
    pub fn dominates(&self, other: &ScoreVector) -> bool {
        let mut strictly_better = false;
        for objective in Objective::ALL {
            let (a, b) = (objective.score(self), objective.score(other));
            if a < b {
                return false;
            }
            if a > b {
                strictly_better = true;
            }
        }
        strictly_better
    }
}

/// Candidate carrying its normalized scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub enriched: EnrichedCandidate,
    pub scores: ScoreVector,
}

/// Diversity credit of a candidate inside its Pareto layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdingDistance {
    Infinite,
    Finite(f64),
}

impl CrowdingDistance {
    pub fn is_infinite(&self) -> bool {
        matches!(self, CrowdingDistance::Infinite)
    }

    /// Orders more diverse candidates first; two infinite distances tie.
    pub fn cmp_more_diverse_first(&self, other: &CrowdingDistance) -> Ordering {
        match (self, other) {
            (CrowdingDistance::Infinite, CrowdingDistance::Infinite) => Ordering::Equal,
            (CrowdingDistance::Infinite, CrowdingDistance::Finite(_)) => Ordering::Less,
            (CrowdingDistance::Finite(_), CrowdingDistance::Infinite) => Ordering::Greater,
            (CrowdingDistance::Finite(a), CrowdingDistance::Finite(b)) => b.total_cmp(a),
        }
    }
}

/// Candidate placed in a Pareto layer with its crowding distance
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredCandidate {
    pub scored: ScoredCandidate,
    pub layer: usize,
    pub crowding: CrowdingDistance,
}

/// Final output of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub scored: ScoredCandidate,
    pub layer: usize,
    pub crowding: CrowdingDistance,
    #[serde(rename = "weightedScore")]
    pub weighted_score: f64,
}

impl RankedCandidate {
    pub fn property_id(&self) -> PropertyId {
        self.scored.enriched.candidate.property_id
    }

    pub fn scores(&self) -> &ScoreVector {
        &self.scored.scores
    }
}

/// Per-user importance of each objective, 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceWeights {
    #[serde(rename = "importanceRent", alias = "importance_rent", default = "default_importance")]
    pub rent: u8,
    #[serde(rename = "importanceLocation", alias = "importance_location", default = "default_importance")]
    pub location: u8,
    #[serde(rename = "importanceFacility", alias = "importance_facility", default = "default_importance")]
    pub facility: u8,
}

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 5;
pub const DEFAULT_IMPORTANCE: u8 = 3;

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            rent: DEFAULT_IMPORTANCE,
            location: DEFAULT_IMPORTANCE,
            facility: DEFAULT_IMPORTANCE,
        }
    }
}

impl ImportanceWeights {
    pub fn new(rent: u8, location: u8, facility: u8) -> Self {
        Self {
            rent,
            location,
            facility,
        }
    }

    pub fn weight(&self, objective: Objective) -> f64 {
        let raw = match objective {
            Objective::Cost => self.rent,
            Objective::Commute => self.location,
            Objective::Neighborhood => self.facility,
        };
        f64::from(raw)
    }

    pub fn is_in_range(&self) -> bool {
        [self.rent, self.location, self.facility]
            .iter()
            .all(|w| (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(w))
    }
}

/// Hard constraints and preferences for one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(rename = "minMonthlyRent", alias = "min_monthly_rent")]
    pub min_monthly_rent: i32,
    #[serde(rename = "maxMonthlyRent", alias = "max_monthly_rent")]
    pub max_monthly_rent: i32,
    #[serde(rename = "schoolId", alias = "school_id")]
    pub school_id: InstitutionId,
    #[serde(rename = "targetDistrictId", alias = "target_district_id", default)]
    pub target_district_id: Option<DistrictId>,
    #[serde(rename = "maxSchoolLimit", alias = "max_school_limit", default)]
    pub max_commute_minutes: Option<i32>,
    #[serde(rename = "flatTypePreference", alias = "flat_type_preference", default)]
    pub flat_types: Vec<String>,
    #[serde(rename = "maxMrtDistance", alias = "max_mrt_distance", default)]
    pub max_mrt_distance: Option<i32>,
    #[serde(flatten)]
    pub importance: ImportanceWeights,
}

impl FilterCriteria {
    /// Criteria with only the required fields set
    pub fn new(min_monthly_rent: i32, max_monthly_rent: i32, school_id: InstitutionId) -> Self {
        Self {
            min_monthly_rent,
            max_monthly_rent,
            school_id,
            target_district_id: None,
            max_commute_minutes: None,
            flat_types: Vec::new(),
            max_mrt_distance: None,
            importance: ImportanceWeights::default(),
        }
    }

    pub fn with_importance(mut self, importance: ImportanceWeights) -> Self {
        self.importance = importance;
        self
    }

    /// Check the invariants the engine relies on
    pub fn check(&self) -> Result<(), String> {
        if self.min_monthly_rent > self.max_monthly_rent {
            return Err(format!(
                "minimum rent {} exceeds maximum rent {}",
                self.min_monthly_rent, self.max_monthly_rent
            ));
        }
        if !self.importance.is_in_range() {
            return Err(format!(
                "importance weights must be between {} and {}",
                MIN_IMPORTANCE, MAX_IMPORTANCE
            ));
        }
        Ok(())
    }
}

/// Parameters of the primary candidate query
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub school_id: InstitutionId,
    pub min_price: i32,
    pub max_price: i32,
    pub district_id: Option<DistrictId>,
    pub max_commute_minutes: Option<f64>,
    pub flat_types: Vec<String>,
    pub max_mrt_distance: Option<i32>,
}

impl From<&FilterCriteria> for CandidateQuery {
    fn from(criteria: &FilterCriteria) -> Self {
        Self {
            school_id: criteria.school_id,
            min_price: criteria.min_monthly_rent,
            max_price: criteria.max_monthly_rent,
            district_id: criteria.target_district_id,
            max_commute_minutes: criteria.max_commute_minutes.map(f64::from),
            flat_types: criteria.flat_types.clone(),
            max_mrt_distance: criteria.max_mrt_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_requires_strict_improvement() {
        let a = ScoreVector::new(0.5, 0.5, 0.5);
        assert!(!a.dominates(&a));

        let b = ScoreVector::new(0.6, 0.5, 0.5);
        assert!(b.dominates(&a));
        assert!(!a.dominates(&b));
    }

    #[test]
    fn test_score_vector_validity() {
        assert!(ScoreVector::new(1.0, 0.01, 0.5).is_valid());
        assert!(!ScoreVector::new(0.0, 0.5, 0.5).is_valid());
        assert!(!ScoreVector::new(1.5, 0.5, 0.5).is_valid());
        assert!(!ScoreVector::new(f64::NAN, 0.5, 0.5).is_valid());
    }

    #[test]
    fn test_crowding_ordering() {
        let inf = CrowdingDistance::Infinite;
        let big = CrowdingDistance::Finite(2.0);
        let small = CrowdingDistance::Finite(0.5);

        assert_eq!(inf.cmp_more_diverse_first(&big), Ordering::Less);
        assert_eq!(big.cmp_more_diverse_first(&small), Ordering::Less);
        assert_eq!(inf.cmp_more_diverse_first(&inf), Ordering::Equal);
    }

    #[test]
    fn test_missing_importance_defaults_to_three() {
        let json = r#"{"minMonthlyRent": 1000, "maxMonthlyRent": 3000, "schoolId": 3}"#;
        let criteria: FilterCriteria = serde_json::from_str(json).unwrap();

        assert_eq!(criteria.importance, ImportanceWeights::new(3, 3, 3));
        assert!(criteria.flat_types.is_empty());
        assert!(criteria.check().is_ok());
    }

    #[test]
    fn test_criteria_check_rejects_inverted_range() {
        let criteria = FilterCriteria::new(3000, 1000, 1);
        assert!(criteria.check().is_err());

        let criteria = FilterCriteria::new(1000, 3000, 1).with_importance(ImportanceWeights::new(0, 3, 3));
        assert!(criteria.check().is_err());
    }

    #[test]
    fn test_facility_category_labels() {
        for category in FacilityCategory::ALL {
            assert_eq!(FacilityCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(FacilityCategory::parse("cinema"), None);
    }

    #[test]
    fn test_facility_index_labels_parse() {
        // Labels written to housing_facility_distances.facility_type
        let parsed: Vec<_> = ["park", "hawkercenter", "supermarket", "library"]
            .iter()
            .filter_map(|label| FacilityCategory::parse(label))
            .collect();

        assert_eq!(parsed, FacilityCategory::ALL.to_vec());
    }
}
