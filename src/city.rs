use std::fmt;

/// Separator used by the city table to list specialties in a single cell.
pub const POINTS_SEPARATOR: char = '/';

/// A municipality from the city table.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CityRecord {
    /// Sparse numeric id. Photos are named after it.
    pub number: u32,
    /// Municipality name as written in the table. May carry stray whitespace.
    pub name: String,
    /// Local specialties in table order.
    #[serde(default)]
    pub points: Vec<String>,
    /// Free-form introduction text.
    #[serde(default)]
    pub info: String,
    pub population: u64,
    /// Area in km².
    pub area: f64,
}

impl CityRecord {
    /// Name with surrounding whitespace removed, used as the join key
    /// against the boundary dataset.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    pub fn population_line(&self) -> String {
        format!("人口: {}人 / 面積: {} km²", self.population, self.area)
    }
}

/// Splits a `Points` cell into its specialties.
pub fn split_points(raw: &str) -> Vec<String> {
    raw.split(POINTS_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Display for CityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03} {}", self.number, self.trimmed_name())
    }
}
