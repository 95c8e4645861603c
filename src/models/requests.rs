use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::models::domain::{FilterCriteria, MAX_IMPORTANCE, MIN_IMPORTANCE};

/// Request to rank rental listings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_recommend_request"))]
pub struct RecommendRequest {
    #[serde(flatten)]
    pub criteria: FilterCriteria,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

fn validate_recommend_request(req: &RecommendRequest) -> Result<(), ValidationError> {
    let criteria = &req.criteria;

    if criteria.min_monthly_rent < 0 {
        let mut err = ValidationError::new("negative_rent");
        err.message = Some("minMonthlyRent must not be negative".into());
        return Err(err);
    }

    if criteria.min_monthly_rent > criteria.max_monthly_rent {
        let mut err = ValidationError::new("rent_range");
        err.message = Some("minMonthlyRent must not exceed maxMonthlyRent".into());
        return Err(err);
    }

    if !criteria.importance.is_in_range() {
        let mut err = ValidationError::new("importance_range");
        err.message = Some(
            format!("importance weights must be between {} and {}", MIN_IMPORTANCE, MAX_IMPORTANCE).into(),
        );
        return Err(err);
    }

    Ok(())
}
