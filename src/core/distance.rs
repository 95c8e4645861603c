use geo::{point, HaversineDistance};
use std::collections::HashMap;

use crate::models::{Candidate, Facility, FacilityDistanceRow, FacilityMatch, PropertyId};

/// Metres per degree of latitude
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Great-circle distance between two points in metres
#[inline]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = point!(x: lon1, y: lat1);
    let b = point!(x: lon2, y: lat2);
    a.haversine_distance(&b)
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than haversine and used to discard far-away facilities
/// before computing exact distances.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_m: f64) -> BoundingBox {
    let lat_delta = radius_m / METERS_PER_DEGREE;
    let lon_delta = radius_m / (METERS_PER_DEGREE * lat.to_radians().cos().abs());

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}

/// Build listing-to-facility distance rows for every pair within `radius_m`
///
/// Listings without coordinates produce no rows. This is the offline
/// precomputation behind the nearest-facility index.
pub fn build_facility_index(
    properties: &[Candidate],
    facilities: &[Facility],
    radius_m: f64,
) -> Vec<FacilityDistanceRow> {
    let mut rows = Vec::new();

    for property in properties {
        let (Some(lat), Some(lon)) = (property.latitude, property.longitude) else {
            continue;
        };
        let bbox = calculate_bounding_box(lat, lon, radius_m);

        for facility in facilities {
            if !is_within_bounding_box(facility.latitude, facility.longitude, &bbox) {
                continue;
            }
            let distance_m = haversine_distance_m(lat, lon, facility.latitude, facility.longitude);
            if distance_m <= radius_m {
                rows.push(FacilityDistanceRow {
                    property_id: property.property_id,
                    category: facility.category,
                    name: facility.name.clone(),
                    distance_m,
                });
            }
        }
    }

    rows
}

/// Closest row per (listing, category) within `radius_m`, restricted to `ids`
///
/// Matches are ordered by category label, the order the SQL index query
/// returns them in.
pub fn nearest_per_category(
    rows: &[FacilityDistanceRow],
    ids: &[PropertyId],
    radius_m: f64,
) -> HashMap<PropertyId, Vec<FacilityMatch>> {
    let mut nearest: HashMap<PropertyId, Vec<FacilityMatch>> = HashMap::new();

    for row in rows {
        if row.distance_m > radius_m || !ids.contains(&row.property_id) {
            continue;
        }

        let matches = nearest.entry(row.property_id).or_default();
        match matches.iter_mut().find(|m| m.category == row.category) {
            Some(existing) if row.distance_m < existing.distance_m => {
                existing.name = row.name.clone();
                existing.distance_m = row.distance_m;
            }
            Some(_) => {}
            None => matches.push(FacilityMatch {
                category: row.category,
                name: row.name.clone(),
                distance_m: row.distance_m,
            }),
        }
    }

    for matches in nearest.values_mut() {
        matches.sort_by(|a, b| a.category.as_str().cmp(b.category.as_str()));
    }

    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacilityCategory;

    fn listing(id: PropertyId, lat: f64, lon: f64) -> Candidate {
        Candidate {
            property_id: id,
            name: format!("Listing {}", id),
            price: 2000,
            area_sqft: 700,
            flat_type: "Condo".to_string(),
            location: "Clementi".to_string(),
            distance_to_mrt: Some(300),
            beds: 2,
            baths: 1,
            build_time: None,
            district_id: Some(1),
            latitude: Some(lat),
            longitude: Some(lon),
            commute_minutes: None,
            image_url: None,
        }
    }

    fn facility(category: FacilityCategory, name: &str, lat: f64, lon: f64) -> Facility {
        Facility {
            category,
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_haversine_distance() {
        // One thousandth of a degree of latitude is roughly 111 m
        let distance = haversine_distance_m(1.3000, 103.8000, 1.3010, 103.8000);
        assert!((distance - 111.0).abs() < 2.0, "Distance should be ~111m, got {}", distance);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(1.3, 103.8, 2000.0);

        assert!(is_within_bounding_box(1.3, 103.8, &bbox));
        assert!(is_within_bounding_box(1.31, 103.81, &bbox));
        assert!(!is_within_bounding_box(1.4, 103.8, &bbox));
    }

    #[test]
    fn test_index_respects_radius() {
        let properties = vec![listing(1, 1.3000, 103.8000)];
        let facilities = vec![
            facility(FacilityCategory::Park, "Near Park", 1.3050, 103.8000),
            facility(FacilityCategory::Park, "Far Park", 1.3500, 103.8000),
        ];

        let rows = build_facility_index(&properties, &facilities, 2000.0);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Near Park");
    }

    #[test]
    fn test_listing_without_coordinates_has_no_rows() {
        let mut property = listing(1, 0.0, 0.0);
        property.latitude = None;
        let facilities = vec![facility(FacilityCategory::Library, "Library", 0.0, 0.0)];

        assert!(build_facility_index(&[property], &facilities, 2000.0).is_empty());
    }

    #[test]
    fn test_nearest_per_category_keeps_closest() {
        let properties = vec![listing(1, 1.3000, 103.8000), listing(2, 1.3000, 103.8100)];
        let facilities = vec![
            facility(FacilityCategory::Park, "Park A", 1.3020, 103.8000),
            facility(FacilityCategory::Park, "Park B", 1.3005, 103.8000),
            facility(FacilityCategory::HawkerCentre, "Hawker", 1.3000, 103.8010),
        ];
        let rows = build_facility_index(&properties, &facilities, 2000.0);

        let nearest = nearest_per_category(&rows, &[1], 2000.0);

        assert!(!nearest.contains_key(&2));
        let matches = &nearest[&1];
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].category, FacilityCategory::HawkerCentre);
        assert_eq!(matches[1].name, "Park B");
    }
}
