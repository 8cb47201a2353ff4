use std::collections::BTreeMap;
use std::io::Read;

use crate::city::{CityRecord, split_points};
use crate::dataset::LoadError;

/// One row of the city table before validation.
#[derive(Debug, Clone, serde::Deserialize)]
struct CityRow {
    #[serde(rename = "Number", default)]
    number: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Points", default)]
    points: String,
    #[serde(rename = "Info", default)]
    info: String,
    #[serde(rename = "Population", default)]
    population: String,
    #[serde(rename = "Area", default)]
    area: String,
}

/// The city table keyed by number.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CityCatalog {
    cities: BTreeMap<u32, CityRecord>,
    valid_ids: Vec<u32>,
}

impl CityCatalog {
    pub fn new(records: Vec<CityRecord>) -> Result<Self, LoadError> {
        let mut cities = BTreeMap::new();

        for record in records {
            let number = record.number;
            if cities.insert(number, record).is_some() {
                return Err(LoadError::DuplicateNumber { number });
            }
        }

        let valid_ids = cities.keys().copied().collect();
        Ok(Self { cities, valid_ids })
    }

    /// Parses a CSV city table with a `Number,Name,Points,Info,Population,Area` header.
    ///
    /// Rows whose `Number` cell is blank are skipped; they can never be selected.
    pub fn from_csv_reader(reader: impl Read) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, row) in reader.deserialize::<CityRow>().enumerate() {
            // Header occupies line 1.
            let line = index + 2;
            let row = row.map_err(|source| LoadError::Csv { source })?;

            match parse_row(row, line)? {
                Some(record) => records.push(record),
                None => {
                    skipped += 1;
                    tracing::debug!(line, "skipping city row without a number");
                }
            }
        }

        let catalog = Self::new(records)?;
        tracing::info!(cities = catalog.len(), skipped, "city table loaded");

        Ok(catalog)
    }

    pub fn get(&self, number: u32) -> Option<&CityRecord> {
        self.cities.get(&number)
    }

    /// Sorted numbers of every selectable city.
    pub fn valid_ids(&self) -> &[u32] {
        &self.valid_ids
    }

    pub fn cities(&self) -> impl Iterator<Item = &CityRecord> {
        self.cities.values()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

fn parse_row(row: CityRow, line: usize) -> Result<Option<CityRecord>, LoadError> {
    let Some(number) = parse_number(&row.number, line)? else {
        return Ok(None);
    };

    let population = row
        .population
        .trim()
        .parse::<u64>()
        .map_err(|_| LoadError::InvalidRow {
            line,
            reason: format!("population {:?} is not an integer", row.population),
        })?;

    let area = row
        .area
        .trim()
        .parse::<f64>()
        .map_err(|_| LoadError::InvalidRow {
            line,
            reason: format!("area {:?} is not a number", row.area),
        })?;

    Ok(Some(CityRecord {
        number,
        name: row.name,
        points: split_points(&row.points),
        info: row.info,
        population,
        area,
    }))
}

/// Accepts `12` as well as `12.0`, the form a spreadsheet export produces
/// once the column holds blanks.
fn parse_number(raw: &str, line: usize) -> Result<Option<u32>, LoadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    if let Ok(number) = trimmed.parse::<u32>() {
        return Ok(Some(number));
    }

    let invalid = || LoadError::InvalidRow {
        line,
        reason: format!("number {trimmed:?} is not a non-negative integer"),
    };

    let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(invalid());
    }

    Ok(Some(value as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Number,Name,Points,Info,Population,Area
1,札幌市,時計台/ラーメン,道庁所在地,1973395,1121.26
,欠番,,,0,0
4.0, 小樽市 ,ガラス細工,運河,111299,243.83
";

    #[test]
    fn loads_rows_and_skips_blank_numbers() {
        let catalog = CityCatalog::from_csv_reader(TABLE.as_bytes()).expect("table should load");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.valid_ids(), &[1, 4]);
        assert_eq!(
            catalog.get(1).map(|city| city.points.clone()),
            Some(vec!["時計台".to_string(), "ラーメン".to_string()])
        );
    }

    #[test]
    fn keeps_raw_name_for_display() {
        let catalog = CityCatalog::from_csv_reader(TABLE.as_bytes()).expect("table should load");
        let otaru = catalog.get(4).expect("integral float number should parse");

        assert_eq!(otaru.name, " 小樽市 ");
        assert_eq!(otaru.trimmed_name(), "小樽市");
    }

    #[test]
    fn errors_on_fractional_number() {
        let table = "Number,Name,Points,Info,Population,Area\n1.5,x,,,1,1\n";
        let error = CityCatalog::from_csv_reader(table.as_bytes())
            .expect_err("fractional number should fail");

        assert!(matches!(error, LoadError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn errors_on_bad_population() {
        let table = "Number,Name,Points,Info,Population,Area\n3,x,,,many,1\n";
        let error = CityCatalog::from_csv_reader(table.as_bytes())
            .expect_err("non-numeric population should fail");

        assert!(matches!(error, LoadError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn errors_on_duplicate_number() {
        let table = "Number,Name,Points,Info,Population,Area\n3,x,,,1,1\n3,y,,,1,1\n";
        let error = CityCatalog::from_csv_reader(table.as_bytes())
            .expect_err("duplicate number should fail");

        assert_eq!(error, LoadError::DuplicateNumber { number: 3 });
    }

    #[test]
    fn empty_table_is_empty_catalog() {
        let table = "Number,Name,Points,Info,Population,Area\n";
        let catalog = CityCatalog::from_csv_reader(table.as_bytes()).expect("header only loads");

        assert!(catalog.is_empty());
        assert!(catalog.valid_ids().is_empty());
    }
}
