//! Rental Recommender - multi-objective ranking of rental listings for students
//!
//! Retrieves candidate listings for an institution, enriches them with commute,
//! facility and district-safety features, and orders them by Pareto layer,
//! crowding distance and the user's importance weights.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{EngineError, EngineSettings, RecommendationEngine};
pub use crate::models::{FilterCriteria, ImportanceWeights, RankedCandidate, RecommendRequest, RecommendResponse};
pub use crate::services::{InMemoryStore, PostgresStore, PropertyStore, StoreError};
