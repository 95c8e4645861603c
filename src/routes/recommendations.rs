use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::config::EngineConfig;
use crate::core::{EngineError, RecommendationEngine};
use crate::models::{ErrorResponse, HealthResponse, RecommendRequest, RecommendResponse, RecommendedProperty};
use crate::services::PropertyStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: RecommendationEngine,
    pub store: Arc<dyn PropertyStore>,
    pub limits: EngineConfig,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/recommendations", web::post().to(recommend));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommendation endpoint
///
/// POST /api/v1/recommendations
///
/// Request body:
/// ```json
/// {
///   "minMonthlyRent": 1000,
///   "maxMonthlyRent": 3000,
///   "schoolId": 3,
///   "importanceRent": 5,
///   "importanceLocation": 4,
///   "importanceFacility": 3,
///   "limit": 10
/// }
/// ```
async fn recommend(state: web::Data<AppState>, req: web::Json<RecommendRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommendation request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    let limit = state.limits.clamp_limit(req.limit);

    tracing::info!(
        "Recommendation request {}: school {}, rent {}-{}, limit {}",
        request_id,
        req.criteria.school_id,
        req.criteria.min_monthly_rent,
        req.criteria.max_monthly_rent,
        limit
    );

    match state.engine.recommend(&req.criteria, Some(limit)).await {
        Ok(ranked) => {
            let properties: Vec<RecommendedProperty> = ranked.into_iter().map(RecommendedProperty::from).collect();
            let total_count = properties.len();

            HttpResponse::Ok().json(RecommendResponse {
                request_id,
                properties,
                total_count,
            })
        }
        Err(e) => error_response(&request_id, e),
    }
}

fn error_response(request_id: &str, err: EngineError) -> HttpResponse {
    match err {
        EngineError::InvalidCriteria(message) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid criteria".to_string(),
            message,
            status_code: 400,
        }),
        e @ (EngineError::Retrieval(_) | EngineError::Enrichment(_)) => {
            tracing::error!("Recommendation request {} failed: {}", request_id, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Property store unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            })
        }
    }
}
