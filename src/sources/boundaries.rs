//! City boundary polygons (e.g. TIGER/Line places exported to GeoJSON).

use anyhow::{Context, Result, bail};
use geo::{BoundingRect, Contains, Coord, GeodesicArea, LineString, MultiPolygon, Point, Polygon, Rect};
use geojson::{GeoJson, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{City, city_key};

#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub shape: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
    pub area_km2: f64,
}

impl Boundary {
    pub fn new(name: &str, shape: MultiPolygon<f64>) -> Self {
        let bbox = shape.bounding_rect();
        let area_km2 = shape.geodesic_area_unsigned() / 1_000_000.0;
        Self {
            name: name.to_string(),
            shape,
            bbox,
            area_km2,
        }
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        let Some(bbox) = self.bbox else {
            return false;
        };
        let (min, max) = (bbox.min(), bbox.max());
        if point.x() < min.x || point.x() > max.x || point.y() < min.y || point.y() > max.y {
            return false;
        }
        self.shape.contains(point)
    }
}

/// Boundaries grouped by city key; several places may share a name.
#[derive(Debug, Default)]
pub struct Boundaries {
    by_key: HashMap<String, Vec<Boundary>>,
}

impl Boundaries {
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading boundaries {}", path.display()))?;
        Self::from_geojson_str(&text, &path.display().to_string())
    }

    pub fn from_geojson_str(text: &str, origin: &str) -> Result<Self> {
        let gj: GeoJson = text
            .parse()
            .with_context(|| format!("{origin}: parsing GeoJSON"))?;
        let GeoJson::FeatureCollection(fc) = gj else {
            bail!("{origin}: expected a FeatureCollection");
        };

        let mut by_key: HashMap<String, Vec<Boundary>> = HashMap::new();
        let mut skipped = 0usize;

        for feature in fc.features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|m| m.get("NAME").or_else(|| m.get("name")))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let shape = feature.geometry.as_ref().and_then(|g| shape_of(&g.value));

            let (Some(name), Some(shape)) = (name, shape) else {
                skipped += 1;
                continue;
            };
            by_key
                .entry(city_key(&name))
                .or_default()
                .push(Boundary::new(&name, shape));
        }

        debug!(places = by_key.len(), skipped, "Boundaries loaded");
        Ok(Self { by_key })
    }

    /// The boundary for `city`: the same-named place containing its
    /// centroid, or the first same-named place.
    pub fn for_city(&self, city: &City) -> Option<&Boundary> {
        let candidates = self.by_key.get(&city.key())?;
        let centroid = Point::new(city.longitude, city.latitude);

        match candidates.iter().find(|b| b.contains(&centroid)) {
            Some(boundary) => Some(boundary),
            None => {
                if candidates.len() > 1 {
                    warn!(
                        city = %city.name,
                        candidates = candidates.len(),
                        "No same-named boundary contains the centroid, using the first"
                    );
                }
                candidates.first()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn shape_of(value: &Value) -> Option<MultiPolygon<f64>> {
    match value {
        Value::Polygon(rings) => Some(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        Value::MultiPolygon(polys) => {
            let polys: Vec<_> = polys.iter().filter_map(|r| polygon_from_rings(r)).collect();
            (!polys.is_empty()).then(|| MultiPolygon::new(polys))
        }
        _ => None,
    }
}

// GeoJSON positions are [lon, lat]
fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .filter(|pos| pos.len() >= 2)
            .map(|pos| Coord { x: pos[0], y: pos[1] })
            .collect::<LineString<f64>>()
    });
    let exterior = rings.next()?;
    if exterior.0.len() < 4 {
        return None;
    }
    Some(Polygon::new(exterior, rings.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two places named Springfield, a Chicago rectangle of about 96 km² and
    /// two features that cannot be used.
    const PLACES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME": "Springfield" },
                "geometry": { "type": "Polygon", "coordinates": [[
                    [-90.0, 39.0], [-89.9, 39.0], [-89.9, 39.1], [-90.0, 39.1], [-90.0, 39.0]
                ]] }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Springfield" },
                "geometry": { "type": "MultiPolygon", "coordinates": [[[
                    [-93.4, 37.1], [-93.2, 37.1], [-93.2, 37.3], [-93.4, 37.3], [-93.4, 37.1]
                ]]] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Chicago" },
                "geometry": { "type": "Polygon", "coordinates": [[
                    [-87.7, 41.84], [-87.57, 41.84], [-87.57, 41.92], [-87.7, 41.92], [-87.7, 41.84]
                ]] }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Nowhere" },
                "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": null
            }
        ]
    }"#;

    fn places() -> Boundaries {
        Boundaries::from_geojson_str(PLACES, "places.geojson").unwrap()
    }

    #[test]
    fn test_skips_unusable_features() {
        let b = places();
        assert!(!b.is_empty());
        assert!(b.for_city(&City::new("Chicago", 41.88, -87.63)).is_some());
        assert!(b.for_city(&City::new("Nowhere", 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_no_usable_feature_is_empty() {
        let only_points = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "NAME": "Dot" },
                    "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
                }
            ]
        }"#;
        let b = Boundaries::from_geojson_str(only_points, "x").unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn test_same_name_prefers_polygon_containing_centroid() {
        let b = places();
        let missouri = City::new("Springfield", 37.2, -93.3);
        let found = b.for_city(&missouri).unwrap();
        assert!(found.contains(&Point::new(-93.3, 37.2)));

        let elsewhere = City::new("springfield", 10.0, 10.0);
        let first = b.for_city(&elsewhere).unwrap();
        assert!(first.contains(&Point::new(-89.95, 39.05)));
    }

    #[test]
    fn test_contains_and_area() {
        let b = places();
        let chicago = b.for_city(&City::new("Chicago", 41.88, -87.63)).unwrap();

        assert!(chicago.contains(&Point::new(-87.63, 41.88)));
        assert!(!chicago.contains(&Point::new(-87.5, 41.88)));
        // 0.13° lon × 0.08° lat at 41.9°N ≈ 10.8 km × 8.9 km
        assert!(chicago.area_km2 > 90.0 && chicago.area_km2 < 105.0);
    }

    #[test]
    fn test_rejects_non_collection() {
        let single = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        assert!(Boundaries::from_geojson_str(single, "x").is_err());
    }
}
