use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::catalog::CityCatalog;
use crate::city::CityRecord;
use crate::config::AppConfig;
use crate::region::{RegionMap, RegionPolygon};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read dataset file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse city table: {source}")]
    Csv { source: csv::Error },
    #[error("invalid city row at line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
    #[error("city number {number} appears more than once")]
    DuplicateNumber { number: u32 },
    #[error("failed to parse boundary file: {reason}")]
    GeoJson { reason: String },
    #[error("boundary file must be a GeoJSON FeatureCollection")]
    NotFeatureCollection,
    #[error("no boundary polygons found for region {region}")]
    EmptyRegion { region: String },
    #[error("city table contains no numbered rows")]
    NoCities,
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Read { path: left, .. }, Self::Read { path: right, .. }) => left == right,
            (Self::Csv { .. }, Self::Csv { .. }) => true,
            (
                Self::InvalidRow {
                    line: left_line,
                    reason: left_reason,
                },
                Self::InvalidRow {
                    line: right_line,
                    reason: right_reason,
                },
            ) => left_line == right_line && left_reason == right_reason,
            (Self::DuplicateNumber { number: left }, Self::DuplicateNumber { number: right }) => {
                left == right
            }
            (Self::GeoJson { reason: left }, Self::GeoJson { reason: right }) => left == right,
            (Self::NotFeatureCollection, Self::NotFeatureCollection) => true,
            (Self::EmptyRegion { region: left }, Self::EmptyRegion { region: right }) => {
                left == right
            }
            (Self::NoCities, Self::NoCities) => true,
            _ => false,
        }
    }
}

/// Both datasets plus the city-to-polygon join, loaded once and then read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    catalog: CityCatalog,
    region: RegionMap,
    polygons_by_city: HashMap<u32, Vec<usize>>,
    unmatched: Vec<u32>,
}

impl Dataset {
    pub fn new(catalog: CityCatalog, region: RegionMap) -> Result<Self, LoadError> {
        if catalog.is_empty() {
            return Err(LoadError::NoCities);
        }

        let mut polygons_by_city = HashMap::new();
        let mut unmatched = Vec::new();

        for city in catalog.cities() {
            match region.indices_named(city.trimmed_name()) {
                Some(indices) => {
                    polygons_by_city.insert(city.number, indices.to_vec());
                }
                None => unmatched.push(city.number),
            }
        }

        for number in &unmatched {
            if let Some(city) = catalog.get(*number) {
                tracing::warn!(
                    number,
                    name = city.trimmed_name(),
                    "city has no matching boundary polygon"
                );
            }
        }

        Ok(Self {
            catalog,
            region,
            polygons_by_city,
            unmatched,
        })
    }

    /// Reads the city table and boundary file from disk.
    pub fn load(
        city_table: impl AsRef<Path>,
        region_geometry: impl AsRef<Path>,
        config: &AppConfig,
    ) -> Result<Self, LoadError> {
        let table = read_file(city_table.as_ref())?;
        let geometry = read_file(region_geometry.as_ref())?;
        let geometry = String::from_utf8(geometry).map_err(|error| LoadError::GeoJson {
            reason: error.to_string(),
        })?;

        Self::from_sources(&table, &geometry, config)
    }

    /// Builds the dataset from file contents that were fetched elsewhere.
    pub fn from_sources(
        city_table: &[u8],
        region_geometry: &str,
        config: &AppConfig,
    ) -> Result<Self, LoadError> {
        let catalog = CityCatalog::from_csv_reader(city_table)?;
        let region = RegionMap::from_geojson_str(region_geometry, config.region_filter())?;

        Self::new(catalog, region)
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn region(&self) -> &RegionMap {
        &self.region
    }

    pub fn city(&self, number: u32) -> Option<&CityRecord> {
        self.catalog.get(number)
    }

    /// Boundary polygons joined to a city number at load time.
    pub fn polygons_for(&self, number: u32) -> Vec<&RegionPolygon> {
        self.polygons_by_city
            .get(&number)
            .map(|indices| {
                indices
                    .iter()
                    .map(|index| &self.region.polygons()[*index])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Numbers of cities whose name matched no boundary polygon.
    pub fn unmatched_cities(&self) -> &[u32] {
        &self.unmatched
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })
}
