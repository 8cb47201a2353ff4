use std::fs;
use std::path::Path;

use crate::map::MapStyle;
use crate::region::RegionFilter;

/// Where the datasets and photos live and how the quiz page is drawn.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub page_title: String,
    /// City table (CSV). A path for the preview binary, a URL for the browser.
    pub city_table: String,
    /// Municipality boundaries (GeoJSON FeatureCollection).
    pub region_geometry: String,
    /// Feature property holding the prefecture name.
    pub region_property: String,
    /// Features whose `region_property` differs from this are dropped.
    pub region_name: String,
    /// Feature property holding the municipality name.
    pub municipality_property: String,
    pub photo_dir: String,
    pub photo_extension: String,
    pub map: MapStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_title: "北海道179市町村カントリーサイン".to_string(),
            city_table: "cities.csv".to_string(),
            region_geometry: "N03-20230101_01_GML/N03-23_01_230101.geojson".to_string(),
            region_property: "N03_001".to_string(),
            region_name: "北海道".to_string(),
            municipality_property: "N03_004".to_string(),
            photo_dir: "images".to_string(),
            photo_extension: "gif".to_string(),
            map: MapStyle::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {source}")]
    Parse { source: serde_json::Error },
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse { source })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json_str(&text)
    }

    /// Photo location for a city: the number zero-padded to three digits.
    pub fn photo_path(&self, number: u32) -> String {
        let dir = self.photo_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{:03}.{}", number, self.photo_extension)
        } else {
            format!("{}/{:03}.{}", dir, number, self.photo_extension)
        }
    }

    pub fn photo_mime(&self) -> &'static str {
        image::ImageFormat::from_extension(&self.photo_extension)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream")
    }

    pub fn region_filter(&self) -> RegionFilter<'_> {
        RegionFilter {
            region_property: &self.region_property,
            region_name: &self.region_name,
            municipality_property: &self.municipality_property,
        }
    }
}
