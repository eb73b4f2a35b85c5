// Data Loader
// Reads the four dashboard tables once at start-up into an immutable Dataset.

use crate::config::DashboardConfig;
use crate::error::LoadError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// RECORDS
// ============================================================================

/// One month of the healthy-basket affordability series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffordabilityRecord {
    pub date: NaiveDate,
    pub basket_cost_euro: f64,
    pub affordability_ratio: f64,
    pub affordability_index: f64,
}

/// Row shape as it sits in `affordability_final.csv`; the date is parsed after.
#[derive(Debug, Deserialize)]
struct AffordabilityRow {
    #[serde(rename = "Date")]
    date: String,

    #[serde(rename = "Basket_Cost_Euro")]
    basket_cost_euro: f64,

    #[serde(rename = "Affordability_Ratio")]
    affordability_ratio: f64,

    #[serde(rename = "Affordability_Index")]
    affordability_index: f64,
}

/// One (Item, Date) price observation from `food_afford.csv`.
///
/// The date stays as text: it is a grouping key, ordered with
/// [`parse_flexible_date`] where possible.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FoodPriceRecord {
    #[serde(rename = "Item")]
    pub item: String,

    #[serde(rename = "Date")]
    pub date: String,

    /// Empty cells load as `None` and are skipped by aggregations.
    #[serde(rename = "Price_per_kg_or_litre")]
    pub price: Option<f64>,

    #[serde(rename = "Tag")]
    pub tag: String,
}

/// A CSV table whose schema the dashboard does not interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything the render routines read. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub affordability: Vec<AffordabilityRecord>,
    pub food_prices: Vec<FoodPriceRecord>,
    pub item_summary: RawTable,
    pub tag_summary: RawTable,
}

impl Dataset {
    /// Load all four tables from the configured data directory.
    pub fn load(config: &DashboardConfig) -> Result<Self, LoadError> {
        info!(data_dir = %config.data_dir.display(), "Loading dashboard tables");

        let dataset = Dataset {
            affordability: load_affordability(&config.affordability_path())?,
            food_prices: load_food_prices(&config.food_prices_path())?,
            item_summary: load_raw_table(&config.item_summary_path())?,
            tag_summary: load_raw_table(&config.tag_summary_path())?,
        };

        info!(
            affordability = dataset.affordability.len(),
            food_prices = dataset.food_prices.len(),
            item_summary = dataset.item_summary.len(),
            tag_summary = dataset.tag_summary.len(),
            "Tables loaded"
        );

        Ok(dataset)
    }

    /// Distinct item labels, sorted; the first is the default selection.
    pub fn items(&self) -> Vec<String> {
        let mut items: Vec<String> = self.food_prices.iter().map(|r| r.item.clone()).collect();
        items.sort();
        items.dedup();
        items
    }
}

// ============================================================================
// LOADERS
// ============================================================================

fn open_reader(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

pub fn load_affordability(path: &Path) -> Result<Vec<AffordabilityRecord>, LoadError> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(csv_error(path))?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error(path))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: AffordabilityRow = record.deserialize(Some(&headers)).map_err(csv_error(path))?;

        let date = parse_flexible_date(&row.date).ok_or_else(|| LoadError::InvalidDate {
            path: path.to_path_buf(),
            line,
            value: row.date.clone(),
        })?;

        records.push(AffordabilityRecord {
            date,
            basket_cost_euro: row.basket_cost_euro,
            affordability_ratio: row.affordability_ratio,
            affordability_index: row.affordability_index,
        });
    }

    debug!(path = %path.display(), rows = records.len(), "Loaded affordability table");
    Ok(records)
}

pub fn load_food_prices(path: &Path) -> Result<Vec<FoodPriceRecord>, LoadError> {
    let mut reader = open_reader(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: FoodPriceRecord = result.map_err(csv_error(path))?;
        records.push(record);
    }

    debug!(path = %path.display(), rows = records.len(), "Loaded food price table");
    Ok(records)
}

pub fn load_raw_table(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(csv_error(path))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error(path))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded summary table");
    Ok(RawTable { headers, rows })
}

// ============================================================================
// DATES
// ============================================================================

/// Parse the date spellings found in CSO-derived exports.
///
/// Month-only forms resolve to the first of the month.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    const FULL: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in FULL {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // Month-only: pin to day 1 so chrono has a full date to parse.
    const MONTHLY: [(&str, &str); 7] = [
        ("%Y-%m-%d", "-01"),  // 2014-01
        ("%Y %B %d", " 01"),  // 2014 January
        ("%YM%m-%d", "-01"),  // 2014M01
        ("%b-%y-%d", "-01"),  // Jan-14
        ("%b-%Y-%d", "-01"),  // Jan-2014
        ("%b %Y %d", " 01"),  // Jan 2014
        ("%B %Y %d", " 01"),  // January 2014
    ];
    for (fmt, day) in MONTHLY {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}{}", s, day), fmt) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn write_fixture(dir: &Path) {
        write_file(
            dir,
            "affordability_final.csv",
            "Date,Basket_Cost_Euro,Affordability_Ratio,Affordability_Index\n\
             2014-01-01,270.10,9.1,102.38\n\
             2014-02-01,271.00,9.0,101.90\n",
        );
        write_file(
            dir,
            "food_afford.csv",
            "Item,Date,Price_per_kg_or_litre,Tag\n\
             Full Fat Milk,2014-01-01,1.05,Neutral\n\
             Smoked Salmon,2014-01-01,31.20,Healthy\n\
             Smoked Salmon,2014-02-01,,Healthy\n",
        );
        write_file(dir, "item_summary.csv", "Item,Mean,Std\nFull Fat Milk,1.05,0.02\n");
        write_file(dir, "tag_summary.csv", "Tag,Mean\nHealthy,7.52\nNeutral,6.53\n");
    }

    #[test]
    fn test_load_well_formed_dataset() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());

        let dataset = Dataset::load(&DashboardConfig::new(dir.path())).unwrap();

        assert_eq!(dataset.affordability.len(), 2);
        assert_eq!(dataset.affordability[0].date, NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
        assert_eq!(dataset.affordability[1].affordability_index, 101.90);
        assert_eq!(dataset.food_prices.len(), 3);
        assert_eq!(dataset.food_prices[2].price, None);
        assert_eq!(dataset.item_summary.headers, vec!["Item", "Mean", "Std"]);
        assert_eq!(dataset.tag_summary.len(), 2);
        assert_eq!(dataset.items(), vec!["Full Fat Milk", "Smoked Salmon"]);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        std::fs::remove_file(dir.path().join("tag_summary.csv")).unwrap();

        let err = Dataset::load(&DashboardConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile { ref path } if path.ends_with("tag_summary.csv")));
    }

    #[test]
    fn test_bad_date_reports_line() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        write_file(
            dir.path(),
            "affordability_final.csv",
            "Date,Basket_Cost_Euro,Affordability_Ratio,Affordability_Index\n\
             2014-01-01,270.10,9.1,102.38\n\
             not a date,271.00,9.0,101.90\n",
        );

        let err = Dataset::load(&DashboardConfig::new(dir.path())).unwrap_err();
        match err {
            LoadError::InvalidDate { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "not a date");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_cost_is_csv_error() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        write_file(
            dir.path(),
            "affordability_final.csv",
            "Date,Basket_Cost_Euro,Affordability_Ratio,Affordability_Index\n\
             2014-01-01,lots,9.1,102.38\n",
        );

        let err = Dataset::load(&DashboardConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn test_parse_flexible_date_forms() {
        let jan_2014 = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
        assert_eq!(parse_flexible_date("2014-01-01"), Some(jan_2014));
        assert_eq!(parse_flexible_date("01/01/2014"), Some(jan_2014));
        assert_eq!(parse_flexible_date("2014-01-01 00:00:00"), Some(jan_2014));
        assert_eq!(parse_flexible_date("2014-01"), Some(jan_2014));
        assert_eq!(parse_flexible_date("2014 January"), Some(jan_2014));
        assert_eq!(parse_flexible_date("2014M01"), Some(jan_2014));
        assert_eq!(parse_flexible_date("Jan-14"), Some(jan_2014));
        assert_eq!(parse_flexible_date("Jan 2014"), Some(jan_2014));
        assert_eq!(parse_flexible_date("January 2014"), Some(jan_2014));
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("yesterday"), None);
    }
}
