#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident and police station tables.
//!
//! Both tables are headered CSV. Incidents need latitude and longitude
//! columns (`lat`/`latitude`, `lon`/`lng`/`longitude`) and may carry
//! `category` and `date` (`YYYY-MM-DD`). Stations need `name`, latitude, and
//! longitude. A [`Dataset`] is loaded once and shared read-only.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use crime_oracle_incident_models::{IncidentPoint, PoliceStation};
use thiserror::Error;

const LATITUDE_COLUMNS: &[&str] = &["lat", "latitude"];
const LONGITUDE_COLUMNS: &[&str] = &["lon", "lng", "long", "longitude"];
const CATEGORY_COLUMNS: &[&str] = &["category", "type", "crime_type"];
const DATE_COLUMNS: &[&str] = &["date", "occurred_on", "occurred_at"];
const NAME_COLUMNS: &[&str] = &["name", "station", "station_name"];

/// Errors that can occur while loading tables.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The file could not be opened.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The CSV stream could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("{table} table has no {column} column")]
    MissingColumn {
        /// Table being read.
        table: &'static str,
        /// Column description.
        column: &'static str,
    },

    /// A row could not be converted.
    #[error("{table} table line {line}: {message}")]
    Record {
        /// Table being read.
        table: &'static str,
        /// 1-based line number in the file.
        line: u64,
        /// Description of what went wrong.
        message: String,
    },
}

/// Incidents and stations for one pipeline, loaded once and shared.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Historical incidents.
    pub incidents: Arc<[IncidentPoint]>,
    /// Police stations for map annotation.
    pub stations: Arc<[PoliceStation]>,
}

impl Dataset {
    /// Wraps already-loaded tables.
    #[must_use]
    pub fn new(incidents: Vec<IncidentPoint>, stations: Vec<PoliceStation>) -> Self {
        Self {
            incidents: incidents.into(),
            stations: stations.into(),
        }
    }

    /// Loads the incident table and, if given, the station table.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if either file cannot be read or parsed.
    pub fn load(incidents_path: &Path, stations_path: Option<&Path>) -> Result<Self, DatasetError> {
        let incidents = read_incidents(open(incidents_path)?)?;
        log::info!(
            "Loaded {} incidents from {}",
            incidents.len(),
            incidents_path.display()
        );

        let stations = match stations_path {
            Some(path) => {
                let stations = read_stations(open(path)?)?;
                log::info!("Loaded {} police stations from {}", stations.len(), path.display());
                stations
            }
            None => Vec::new(),
        };

        Ok(Self::new(incidents, stations))
    }
}

fn open(path: &Path) -> Result<std::fs::File, DatasetError> {
    std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reads incidents from CSV.
///
/// Empty or unparsable dates are dropped with a debug log; coordinates must
/// always parse.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header lacks coordinate columns, or a
/// row has a missing or non-numeric coordinate.
pub fn read_incidents<R: Read>(reader: R) -> Result<Vec<IncidentPoint>, DatasetError> {
    const TABLE: &str = "incident";

    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let lat_idx = find_column(&headers, LATITUDE_COLUMNS).ok_or(DatasetError::MissingColumn {
        table: TABLE,
        column: "latitude",
    })?;
    let lon_idx = find_column(&headers, LONGITUDE_COLUMNS).ok_or(DatasetError::MissingColumn {
        table: TABLE,
        column: "longitude",
    })?;
    let category_idx = find_column(&headers, CATEGORY_COLUMNS);
    let date_idx = find_column(&headers, DATE_COLUMNS);

    let mut incidents = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let line = line_of(&record);

        let latitude = parse_coordinate(&record, lat_idx, TABLE, line)?;
        let longitude = parse_coordinate(&record, lon_idx, TABLE, line)?;

        let category = category_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        let occurred_on = date_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .and_then(|s| match parse_date(s) {
                Some(date) => Some(date),
                None => {
                    log::debug!("Ignoring unparsable date '{s}' on line {line}");
                    None
                }
            });

        incidents.push(IncidentPoint {
            latitude,
            longitude,
            category,
            occurred_on,
        });
    }

    Ok(incidents)
}

/// Reads police stations from CSV. Rows with an empty name are labeled
/// `"Police"`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header lacks coordinate columns, or a
/// row has a missing or non-numeric coordinate.
pub fn read_stations<R: Read>(reader: R) -> Result<Vec<PoliceStation>, DatasetError> {
    const TABLE: &str = "station";

    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let name_idx = find_column(&headers, NAME_COLUMNS);
    let lat_idx = find_column(&headers, LATITUDE_COLUMNS).ok_or(DatasetError::MissingColumn {
        table: TABLE,
        column: "latitude",
    })?;
    let lon_idx = find_column(&headers, LONGITUDE_COLUMNS).ok_or(DatasetError::MissingColumn {
        table: TABLE,
        column: "longitude",
    })?;

    let mut stations = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let line = line_of(&record);

        let name = name_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .unwrap_or("Police")
            .to_string();

        stations.push(PoliceStation {
            name,
            latitude: parse_coordinate(&record, lat_idx, TABLE, line)?,
            longitude: parse_coordinate(&record, lon_idx, TABLE, line)?,
        });
    }

    Ok(stations)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Case-insensitive header lookup over a list of aliases.
fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|alias| h.eq_ignore_ascii_case(alias)))
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

fn parse_coordinate(
    record: &csv::StringRecord,
    idx: usize,
    table: &'static str,
    line: u64,
) -> Result<f64, DatasetError> {
    let raw = record.get(idx).unwrap_or_default();
    raw.parse::<f64>().map_err(|e| DatasetError::Record {
        table,
        line,
        message: format!("invalid coordinate '{raw}': {e}"),
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
