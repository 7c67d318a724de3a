//! CSV flight dataset loading.
//!
//! Rows are type-coerced into [`FlightRecord`]s, invalid rows become
//! [`RejectedRecord`]s tagged with their data row number, and valid records are
//! ordered by departure (then carrier, departure and arrival airport) so the
//! engine can consume them as an ordered pull source.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use flightarc_core::{FlightRecord, FlightRecordError, GeoPoint, RejectedRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot open dataset {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read dataset header: {0}")]
    Header(#[from] csv::Error),
}

/// One row of the flights CSV, before coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRow {
    pub carrier: String,
    #[serde(default)]
    pub dep_airport: Option<String>,
    #[serde(default)]
    pub arr_airport: Option<String>,
    pub dep_latitude: Option<f64>,
    pub dep_longitude: Option<f64>,
    pub arr_latitude: Option<f64>,
    pub arr_longitude: Option<f64>,
    pub dep_datetime_utc: String,
    pub air_time_minutes: Option<f64>,
}

impl FlightRow {
    /// Coerce the row into a record and validate it.
    pub fn into_record(self) -> Result<FlightRecord, FlightRecordError> {
        let departure_time = parse_departure(&self.dep_datetime_utc)
            .ok_or_else(|| FlightRecordError::UnparsableDeparture(self.dep_datetime_utc.clone()))?;

        let record = FlightRecord {
            carrier: self.carrier,
            departure_airport: self.dep_airport.filter(|s| !s.is_empty()),
            arrival_airport: self.arr_airport.filter(|s| !s.is_empty()),
            departure_point: GeoPoint::new(
                self.dep_longitude
                    .ok_or(FlightRecordError::MissingField("dep_longitude"))?,
                self.dep_latitude
                    .ok_or(FlightRecordError::MissingField("dep_latitude"))?,
            ),
            arrival_point: GeoPoint::new(
                self.arr_longitude
                    .ok_or(FlightRecordError::MissingField("arr_longitude"))?,
                self.arr_latitude
                    .ok_or(FlightRecordError::MissingField("arr_latitude"))?,
            ),
            departure_time,
            duration_minutes: self
                .air_time_minutes
                .ok_or(FlightRecordError::MissingField("air_time_minutes"))?,
            row: None,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Parse a departure timestamp; naive values are taken as UTC.
pub fn parse_departure(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A loaded, ordered dataset ready to feed the scheduler.
#[derive(Debug, Default)]
pub struct Dataset {
    rejected: Vec<RejectedRecord>,
    records: Vec<FlightRecord>,
    carriers: Vec<String>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} flights from {} ({} rows rejected, {} carriers)",
            dataset.records.len(),
            path.display(),
            dataset.rejected.len(),
            dataset.carriers.len()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        csv_reader.headers()?;

        let mut rejected = Vec::new();
        let mut records = Vec::new();
        for (index, row) in csv_reader.deserialize::<FlightRow>().enumerate() {
            let row_number = Some(index + 1);
            let result = row
                .map_err(|err| FlightRecordError::Malformed(err.to_string()))
                .and_then(FlightRow::into_record);
            match result {
                Ok(record) => records.push(FlightRecord {
                    row: row_number,
                    ..record
                }),
                Err(error) => rejected.push(RejectedRecord::new(row_number, error)),
            }
        }

        Ok(Self::from_parts(records, rejected))
    }

    /// Order valid records and collect carriers in first-appearance order.
    pub fn from_parts(mut records: Vec<FlightRecord>, rejected: Vec<RejectedRecord>) -> Self {
        records.sort_by(|a, b| {
            a.departure_time
                .cmp(&b.departure_time)
                .then_with(|| a.carrier.cmp(&b.carrier))
                .then_with(|| a.departure_airport.cmp(&b.departure_airport))
                .then_with(|| a.arrival_airport.cmp(&b.arrival_airport))
        });

        let mut carriers: Vec<String> = Vec::new();
        for record in &records {
            if !carriers.contains(&record.carrier) {
                carriers.push(record.carrier.clone());
            }
        }

        Self {
            rejected,
            records,
            carriers,
        }
    }

    pub fn unique_carriers(&self) -> &[String] {
        &self.carriers
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered pull source: rejected rows first, then records by departure.
    pub fn into_source(self) -> impl Iterator<Item = Result<FlightRecord, RejectedRecord>> {
        self.rejected
            .into_iter()
            .map(Err)
            .chain(self.records.into_iter().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = "carrier,dep_airport,arr_airport,dep_latitude,dep_longitude,arr_latitude,arr_longitude,dep_datetime_utc,air_time_minutes\n";

    fn load(rows: &str) -> Dataset {
        Dataset::from_reader(format!("{HEADER}{rows}").as_bytes()).unwrap()
    }

    #[test]
    fn test_rows_are_sorted_by_departure_then_carrier() {
        let dataset = load(concat!(
            "UA,ORD,SFO,41.97,-87.90,37.62,-122.37,2019-01-01 06:00:00,240\n",
            "DL,ATL,LGA,33.64,-84.43,40.78,-73.87,2019-01-01 05:30:00,110\n",
            "AA,DFW,MIA,32.90,-97.04,25.79,-80.29,2019-01-01 06:00:00,150\n",
        ));

        let carriers: Vec<&str> = dataset.records().iter().map(|r| r.carrier.as_str()).collect();
        assert_eq!(carriers, vec!["DL", "AA", "UA"]);
        assert_eq!(dataset.unique_carriers(), &["DL", "AA", "UA"]);
        assert_eq!(
            dataset.records()[0].departure_time,
            Utc.with_ymd_and_hms(2019, 1, 1, 5, 30, 0).unwrap()
        );
        let rows: Vec<Option<usize>> = dataset.records().iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![Some(2), Some(3), Some(1)]);
    }

    #[test]
    fn test_invalid_rows_are_rejected_with_row_numbers() {
        let dataset = load(concat!(
            "UA,ORD,SFO,41.97,-87.90,37.62,-122.37,2019-01-01 06:00:00,240\n",
            "DL,ATL,LGA,33.64,-84.43,40.78,-73.87,2019-01-01 05:30:00,0\n",
            "AA,DFW,MIA,,-97.04,25.79,-80.29,2019-01-01 06:00:00,150\n",
            "WN,DAL,HOU,32.84,-96.85,29.65,-95.28,not a date,55\n",
            "B6,JFK,BOS,40.64,-73.78,42.36,-71.01,2019-01-01 07:00:00,abc\n",
        ));

        assert_eq!(dataset.len(), 1);
        let rows: Vec<Option<usize>> = dataset.rejected().iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![Some(2), Some(3), Some(4), Some(5)]);
        assert_eq!(
            dataset.rejected()[0].error,
            FlightRecordError::NonPositiveDuration(0.0)
        );
        assert_eq!(
            dataset.rejected()[1].error,
            FlightRecordError::MissingField("dep_latitude")
        );
        assert!(matches!(
            dataset.rejected()[2].error,
            FlightRecordError::UnparsableDeparture(_)
        ));
        assert!(matches!(
            dataset.rejected()[3].error,
            FlightRecordError::Malformed(_)
        ));
    }

    #[test]
    fn test_source_yields_rejections_before_records() {
        let dataset = load(concat!(
            "UA,ORD,SFO,41.97,-87.90,37.62,-122.37,2019-01-01 06:00:00,240\n",
            "DL,ATL,LGA,33.64,-84.43,40.78,-73.87,2019-01-01 05:30:00,-10\n",
        ));
        let items: Vec<_> = dataset.into_source().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_err());
        assert!(items[1].is_ok());
    }

    #[test]
    fn test_parse_departure_formats() {
        let expected = Utc.with_ymd_and_hms(2019, 1, 1, 5, 0, 0).unwrap();
        assert_eq!(parse_departure("2019-01-01 05:00:00"), Some(expected));
        assert_eq!(parse_departure("2019-01-01T05:00:00"), Some(expected));
        assert_eq!(parse_departure("2019-01-01T05:00:00Z"), Some(expected));
        assert_eq!(parse_departure("2019-01-01T00:00:00-05:00"), Some(expected));
        assert_eq!(parse_departure("2019-01-01 05:00"), Some(expected));
        assert_eq!(parse_departure("Jan 1st"), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Dataset::load(Path::new("/nonexistent/flights.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
    }
}
