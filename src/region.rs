use std::collections::HashMap;

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use geojson::{Feature, GeoJson, PolygonType, Value};

use crate::dataset::LoadError;

/// A boundary feature kept after region filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    /// Municipality name as found in the dataset. Some boundary features
    /// (unassigned land, for instance) carry none.
    pub municipality: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl RegionPolygon {
    pub fn trimmed_name(&self) -> Option<&str> {
        self.municipality.as_deref().map(str::trim)
    }
}

/// Which feature properties identify the region and the municipality.
#[derive(Debug, Clone, Copy)]
pub struct RegionFilter<'a> {
    pub region_property: &'a str,
    pub region_name: &'a str,
    pub municipality_property: &'a str,
}

/// Polygons of one administrative region with a name index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionMap {
    polygons: Vec<RegionPolygon>,
    by_name: HashMap<String, Vec<usize>>,
}

impl RegionMap {
    pub fn new(polygons: Vec<RegionPolygon>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, polygon) in polygons.iter().enumerate() {
            if let Some(name) = polygon.trimmed_name() {
                by_name.entry(name.to_string()).or_default().push(index);
            }
        }

        Self { polygons, by_name }
    }

    /// Parses a GeoJSON FeatureCollection, keeping only the features of
    /// `filter.region_name`.
    pub fn from_geojson_str(text: &str, filter: RegionFilter<'_>) -> Result<Self, LoadError> {
        let document: GeoJson = text
            .parse()
            .map_err(|error: geojson::Error| LoadError::GeoJson {
                reason: error.to_string(),
            })?;

        let GeoJson::FeatureCollection(collection) = document else {
            return Err(LoadError::NotFeatureCollection);
        };

        let total = collection.features.len();
        let polygons: Vec<RegionPolygon> = collection
            .features
            .iter()
            .filter(|feature| {
                string_property(feature, filter.region_property) == Some(filter.region_name)
            })
            .filter_map(|feature| to_region_polygon(feature, filter.municipality_property))
            .collect();

        if polygons.is_empty() {
            return Err(LoadError::EmptyRegion {
                region: filter.region_name.to_string(),
            });
        }

        tracing::info!(
            region = filter.region_name,
            kept = polygons.len(),
            total,
            "boundary features loaded"
        );

        Ok(Self::new(polygons))
    }

    pub fn polygons(&self) -> &[RegionPolygon] {
        &self.polygons
    }

    /// Indices of every polygon whose trimmed name equals the trimmed `name`.
    pub fn indices_named(&self, name: &str) -> Option<&[usize]> {
        self.by_name.get(name.trim()).map(Vec::as_slice)
    }

    pub fn polygons_named<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a RegionPolygon> + 'a {
        self.indices_named(name)
            .unwrap_or_default()
            .iter()
            .map(move |index| &self.polygons[*index])
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name.trim())
    }

    /// Bounding box of every kept polygon in lon/lat degrees.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.polygons
            .iter()
            .filter_map(|polygon| polygon.geometry.bounding_rect())
            .reduce(|left, right| {
                Rect::new(
                    Coord {
                        x: left.min().x.min(right.min().x),
                        y: left.min().y.min(right.min().y),
                    },
                    Coord {
                        x: left.max().x.max(right.max().x),
                        y: left.max().y.max(right.max().y),
                    },
                )
            })
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

fn string_property<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature.property(key).and_then(|value| value.as_str())
}

fn to_region_polygon(feature: &Feature, municipality_property: &str) -> Option<RegionPolygon> {
    let municipality = string_property(feature, municipality_property).map(str::to_string);

    let Some(geometry) = feature.geometry.as_ref() else {
        tracing::debug!(?municipality, "feature without geometry skipped");
        return None;
    };

    let geometry = match &geometry.value {
        Value::Polygon(rings) => MultiPolygon::new(vec![to_polygon(rings)?]),
        Value::MultiPolygon(parts) => {
            MultiPolygon::new(parts.iter().filter_map(|rings| to_polygon(rings)).collect())
        }
        _ => {
            tracing::debug!(?municipality, "non-polygon feature skipped");
            return None;
        }
    };

    if geometry.0.is_empty() {
        return None;
    }

    Some(RegionPolygon {
        municipality,
        geometry,
    })
}

fn to_polygon(rings: &PolygonType) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .filter(|position| position.len() >= 2)
            .map(|position| Coord {
                x: position[0],
                y: position[1],
            })
            .collect::<Vec<_>>()
    });

    let exterior = rings.next().filter(|ring| ring.len() >= 3)?;
    let interiors = rings
        .filter(|ring| ring.len() >= 3)
        .map(LineString::from)
        .collect();

    Some(Polygon::new(LineString::from(exterior), interiors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RegionFilter<'static> {
        RegionFilter {
            region_property: "N03_001",
            region_name: "北海道",
            municipality_property: "N03_004",
        }
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "N03_001": "北海道", "N03_004": "札幌市 " },
                "geometry": { "type": "Polygon", "coordinates": [[[141.0, 43.0], [141.5, 43.0], [141.5, 43.5], [141.0, 43.0]]] }
            },
            {
                "type": "Feature",
                "properties": { "N03_001": "北海道", "N03_004": "奥尻町" },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[139.4, 42.1], [139.6, 42.1], [139.6, 42.2], [139.4, 42.1]]],
                    [[[139.7, 42.1], [139.8, 42.1], [139.8, 42.2], [139.7, 42.1]]]
                ] }
            },
            {
                "type": "Feature",
                "properties": { "N03_001": "北海道", "N03_004": null },
                "geometry": { "type": "Polygon", "coordinates": [[[145.0, 44.0], [145.1, 44.0], [145.1, 44.1], [145.0, 44.0]]] }
            },
            {
                "type": "Feature",
                "properties": { "N03_001": "青森県", "N03_004": "青森市" },
                "geometry": { "type": "Polygon", "coordinates": [[[140.7, 40.8], [140.8, 40.8], [140.8, 40.9], [140.7, 40.8]]] }
            },
            {
                "type": "Feature",
                "properties": { "N03_001": "北海道", "N03_004": "点" },
                "geometry": { "type": "Point", "coordinates": [141.0, 43.0] }
            }
        ]
    }"#;

    #[test]
    fn keeps_only_region_polygons() {
        let map = RegionMap::from_geojson_str(COLLECTION, filter())
            .expect("collection should parse");

        assert_eq!(map.len(), 3);
        assert!(!map.contains_name("青森市"));
        assert!(!map.contains_name("点"));
    }

    #[test]
    fn name_lookup_trims_both_sides() {
        let map = RegionMap::from_geojson_str(COLLECTION, filter())
            .expect("collection should parse");

        assert!(map.contains_name("札幌市"));
        assert!(map.contains_name("  札幌市"));
        assert_eq!(map.polygons_named(" 札幌市").count(), 1);
    }

    #[test]
    fn multipolygon_keeps_every_part() {
        let map = RegionMap::from_geojson_str(COLLECTION, filter())
            .expect("collection should parse");
        let okushiri = map.polygons_named("奥尻町").next().expect("奥尻町 should be indexed");

        assert_eq!(okushiri.geometry.0.len(), 2);
    }

    #[test]
    fn unnamed_features_are_drawn_but_not_indexed() {
        let map = RegionMap::from_geojson_str(COLLECTION, filter())
            .expect("collection should parse");

        assert!(map.polygons().iter().any(|polygon| polygon.municipality.is_none()));
        assert_eq!(map.by_name.len(), 2);
    }

    #[test]
    fn bounds_cover_every_polygon() {
        let map = RegionMap::from_geojson_str(COLLECTION, filter())
            .expect("collection should parse");
        let bounds = map.bounds().expect("bounds exist");

        assert_eq!(bounds.min().x, 139.4);
        assert_eq!(bounds.max().x, 145.1);
        assert_eq!(bounds.min().y, 42.1);
        assert_eq!(bounds.max().y, 44.1);
    }

    #[test]
    fn errors_when_region_has_no_features() {
        let other = RegionFilter {
            region_name: "沖縄県",
            ..filter()
        };
        let error = RegionMap::from_geojson_str(COLLECTION, other).expect_err("no features kept");

        assert_eq!(
            error,
            LoadError::EmptyRegion {
                region: "沖縄県".to_string()
            }
        );
    }

    #[test]
    fn errors_on_bare_geometry() {
        let text = r#"{ "type": "Point", "coordinates": [141.0, 43.0] }"#;
        let error = RegionMap::from_geojson_str(text, filter()).expect_err("not a collection");

        assert_eq!(error, LoadError::NotFeatureCollection);
    }

    #[test]
    fn errors_on_malformed_json() {
        let error = RegionMap::from_geojson_str("{ not json", filter()).expect_err("malformed");

        assert!(matches!(error, LoadError::GeoJson { .. }));
    }
}
