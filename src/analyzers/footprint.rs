//! Counting TRI facilities inside a city's footprint.

use geo::{HaversineDistance, Point};
use std::f64::consts::PI;

use crate::analyzers::types::{FacilityFootprint, FootprintKind};
use crate::config::City;
use crate::sources::boundaries::Boundaries;
use crate::sources::tri::Facility;

/// How footprints are drawn for this run.
pub enum FootprintSource<'a> {
    /// Boundary polygons were supplied; cities without one get no footprint.
    Boundaries(&'a Boundaries),
    /// No boundaries file: a circle of this many km around each centroid.
    Radius(f64),
}

pub fn footprint_for(
    city: &City,
    facilities: &[Facility],
    source: &FootprintSource<'_>,
) -> Option<FacilityFootprint> {
    match source {
        FootprintSource::Boundaries(boundaries) => {
            let boundary = boundaries.for_city(city)?;
            let count = facilities
                .iter()
                .filter(|f| boundary.contains(&f.point))
                .count();
            Some(FacilityFootprint {
                kind: FootprintKind::Boundary,
                facilities: count as u32,
                area_km2: boundary.area_km2,
            })
        }
        FootprintSource::Radius(radius_km) => {
            let centroid = Point::new(city.longitude, city.latitude);
            let radius_m = radius_km * 1000.0;
            let count = facilities
                .iter()
                .filter(|f| f.point.haversine_distance(&centroid) <= radius_m)
                .count();
            Some(FacilityFootprint {
                kind: FootprintKind::Radius,
                facilities: count as u32,
                area_km2: PI * radius_km * radius_km,
            })
        }
    }
}

/// Facilities per 100 km²; 0 for an empty area.
pub fn density_per_100km2(facilities: u32, area_km2: f64) -> f64 {
    if area_km2 <= 0.0 {
        0.0
    } else {
        facilities as f64 / area_km2 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(lat: f64, lon: f64) -> Facility {
        Facility {
            id: None,
            point: Point::new(lon, lat),
        }
    }

    #[test]
    fn test_radius_counts_by_great_circle_distance() {
        let city = City::new("Houston", 29.7604, -95.3698);
        let facilities = vec![
            facility(29.7604, -95.3698),
            // ~22 km north
            facility(29.96, -95.3698),
            // ~33 km north
            facility(30.06, -95.3698),
        ];

        let fp = footprint_for(&city, &facilities, &FootprintSource::Radius(25.0)).unwrap();
        assert_eq!(fp.kind, FootprintKind::Radius);
        assert_eq!(fp.facilities, 2);
        assert!((fp.area_km2 - PI * 625.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_without_city_has_no_footprint() {
        let boundaries = Boundaries::default();
        let city = City::new("Tampa", 27.95, -82.46);
        let fp = footprint_for(&city, &[], &FootprintSource::Boundaries(&boundaries));
        assert!(fp.is_none());
    }

    #[test]
    fn test_boundary_counts_contained_facilities() {
        let boundaries = Boundaries::from_geojson_str(
            r#"{ "type": "FeatureCollection", "features": [{
                "type": "Feature",
                "properties": { "NAME": "Tampa" },
                "geometry": { "type": "Polygon", "coordinates": [[
                    [-82.6, 27.8], [-82.3, 27.8], [-82.3, 28.1], [-82.6, 28.1], [-82.6, 27.8]
                ]] }
            }] }"#,
            "t",
        )
        .unwrap();
        let city = City::new("Tampa", 27.95, -82.46);
        let facilities = vec![facility(27.9, -82.5), facility(28.0, -82.4), facility(28.5, -82.4)];

        let fp = footprint_for(&city, &facilities, &FootprintSource::Boundaries(&boundaries)).unwrap();
        assert_eq!(fp.kind, FootprintKind::Boundary);
        assert_eq!(fp.facilities, 2);
        assert!(fp.area_km2 > 0.0);
    }

    #[test]
    fn test_density() {
        assert_eq!(density_per_100km2(5, 50.0), 10.0);
        assert_eq!(density_per_100km2(5, 0.0), 0.0);
    }
}
