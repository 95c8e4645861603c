use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{
    Candidate, CandidateQuery, District, DistrictId, FacilityCategory, FacilityMatch, InstitutionId,
    PropertyId,
};
use crate::services::store::{PropertyStore, StoreError};

/// Columns shared by the primary and fallback candidate queries
const CANDIDATE_SELECT: &str = r#"
    SELECT
        h.id,
        COALESCE(h.name, '') AS name,
        COALESCE(h.price, 0) AS price,
        COALESCE(h.area_sqft, 0) AS area_sqft,
        COALESCE(h.type, '') AS flat_type,
        COALESCE(h.location, '') AS location,
        h.distance_to_mrt,
        COALESCE(h.beds_num, 0) AS beds_num,
        COALESCE(h.baths_num, 0) AS baths_num,
        h.build_time,
        h.district_id,
        h.latitude,
        h.longitude,
        c.commute_time_minutes::float8 AS commute_time_minutes
    FROM housing_data h
    JOIN commute_times c ON c.housing_id = h.id
"#;

/// PostgreSQL-backed property store
///
/// Reads listings, districts, images, commute times and the precomputed
/// nearest-facility table. The pool is owned by the caller's process; the
/// store only borrows connections per query.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn candidate_from_row(row: &PgRow) -> Result<Candidate, StoreError> {
    Ok(Candidate {
        property_id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        area_sqft: row.try_get("area_sqft")?,
        flat_type: row.try_get("flat_type")?,
        location: row.try_get("location")?,
        distance_to_mrt: row.try_get("distance_to_mrt")?,
        beds: row.try_get("beds_num")?,
        baths: row.try_get("baths_num")?,
        build_time: row.try_get("build_time")?,
        district_id: row.try_get("district_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        commute_minutes: row.try_get("commute_time_minutes")?,
        image_url: None,
    })
}

#[async_trait]
impl PropertyStore for PostgresStore {
    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(CANDIDATE_SELECT);
        builder
            .push(" WHERE c.university_id = ")
            .push_bind(query.school_id)
            .push(" AND h.price >= ")
            .push_bind(query.min_price)
            .push(" AND h.price <= ")
            .push_bind(query.max_price);

        // Absent criteria add no predicate at all
        if let Some(district_id) = query.district_id {
            builder.push(" AND h.district_id = ").push_bind(district_id);
        }
        if let Some(max_commute) = query.max_commute_minutes {
            builder
                .push(" AND c.commute_time_minutes <= ")
                .push_bind(max_commute);
        }
        if !query.flat_types.is_empty() {
            builder
                .push(" AND h.type = ANY(")
                .push_bind(query.flat_types.clone())
                .push(")");
        }
        if let Some(max_mrt) = query.max_mrt_distance {
            builder.push(" AND h.distance_to_mrt <= ").push_bind(max_mrt);
        }
        builder.push(" ORDER BY h.id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let candidates = rows
            .iter()
            .map(candidate_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Primary query for school {} returned {} rows",
            query.school_id,
            candidates.len()
        );

        Ok(candidates)
    }

    async fn query_fallback(
        &self,
        school_id: InstitutionId,
        exclude_ids: &[PropertyId],
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query = format!(
            "{} WHERE c.university_id = $1 AND NOT (h.id = ANY($2)) \
             ORDER BY c.commute_time_minutes ASC NULLS LAST, h.id LIMIT $3",
            CANDIDATE_SELECT
        );

        let rows = sqlx::query(&query)
            .bind(school_id)
            .bind(exclude_ids.to_vec())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(candidate_from_row).collect()
    }

    async fn districts_by_ids(
        &self,
        ids: &[DistrictId],
    ) -> Result<HashMap<DistrictId, District>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = r#"
            SELECT
                id,
                COALESCE(district_name, '') AS district_name,
                COALESCE(safety_score, 0)::float8 AS safety_score
            FROM districts
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(query).bind(ids.to_vec()).fetch_all(&self.pool).await?;

        let mut districts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let district = District {
                id: row.try_get("id")?,
                name: row.try_get("district_name")?,
                safety_score: row.try_get("safety_score")?,
            };
            districts.insert(district.id, district);
        }

        Ok(districts)
    }

    async fn image_urls_by_ids(
        &self,
        ids: &[PropertyId],
    ) -> Result<HashMap<PropertyId, String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = r#"
            SELECT id, public_url
            FROM images
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(query).bind(ids.to_vec()).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<(PropertyId, String), StoreError> {
                Ok((row.try_get("id")?, row.try_get("public_url")?))
            })
            .collect()
    }

    async fn commute_minutes_by_ids(
        &self,
        ids: &[PropertyId],
        school_id: InstitutionId,
    ) -> Result<HashMap<PropertyId, f64>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = r#"
            SELECT housing_id, commute_time_minutes::float8 AS commute_time_minutes
            FROM commute_times
            WHERE housing_id = ANY($1)
              AND university_id = $2
              AND commute_time_minutes IS NOT NULL
        "#;

        let rows = sqlx::query(query)
            .bind(ids.to_vec())
            .bind(school_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<(PropertyId, f64), StoreError> {
                Ok((row.try_get("housing_id")?, row.try_get("commute_time_minutes")?))
            })
            .collect()
    }

    async fn nearest_facilities(
        &self,
        ids: &[PropertyId],
        radius_m: f64,
    ) -> Result<HashMap<PropertyId, Vec<FacilityMatch>>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = r#"
            SELECT DISTINCT ON (housing_id, facility_type)
                housing_id,
                facility_type,
                COALESCE(facility_name, '') AS facility_name,
                distance_m::float8 AS distance_m
            FROM housing_facility_distances
            WHERE housing_id = ANY($1)
              AND distance_m <= $2
            ORDER BY housing_id, facility_type, distance_m
        "#;

        let rows = sqlx::query(query)
            .bind(ids.to_vec())
            .bind(radius_m)
            .fetch_all(&self.pool)
            .await?;

        let mut facilities: HashMap<PropertyId, Vec<FacilityMatch>> = HashMap::new();
        for row in &rows {
            let housing_id: PropertyId = row.try_get("housing_id")?;
            let label: String = row.try_get("facility_type")?;
            let Some(category) = FacilityCategory::parse(&label) else {
                tracing::warn!("Skipping facility row with unknown type '{}'", label);
                continue;
            };

            facilities.entry(housing_id).or_default().push(FacilityMatch {
                category,
                name: row.try_get("facility_name")?,
                distance_m: row.try_get("distance_m")?,
            });
        }

        Ok(facilities)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
