//! Seeded demo dataset between major North American airports.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use flightarc_core::{Ellipsoid, GeoPoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::FlightRow;

/// (code, latitude, longitude)
pub const AIRPORTS: &[(&str, f64, f64)] = &[
    ("ATL", 33.6407, -84.4277),
    ("BOS", 42.3656, -71.0096),
    ("DEN", 39.8561, -104.6737),
    ("DFW", 32.8998, -97.0403),
    ("DTW", 42.2162, -83.3554),
    ("JFK", 40.6413, -73.7781),
    ("LAS", 36.0840, -115.1537),
    ("LAX", 33.9416, -118.4085),
    ("MIA", 25.7959, -80.2870),
    ("MSP", 44.8848, -93.2223),
    ("ORD", 41.9742, -87.9073),
    ("PHX", 33.4352, -112.0101),
    ("SEA", 47.4502, -122.3088),
    ("SFO", 37.6213, -122.3790),
    ("SLC", 40.7899, -111.9791),
    ("YUL", 45.4706, -73.7408),
    ("YVR", 49.1967, -123.1815),
    ("YYZ", 43.6777, -79.6248),
    ("MEX", 19.4361, -99.0719),
    ("ANC", 61.1743, -149.9962),
    ("HNL", 21.3245, -157.9251),
];

pub const CARRIERS: &[&str] = &["AA", "AS", "B6", "DL", "F9", "NK", "UA", "WN"];

// Block speed and taxi allowance used to turn distance into air time.
const CRUISE_KM_PER_MIN: f64 = 13.0;
const OVERHEAD_MIN: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct SynthOptions {
    pub count: usize,
    pub seed: u64,
    pub start: DateTime<Utc>,
    pub span_hours: u32,
}

/// Generate `count` flights departing on whole minutes within the span, sorted by departure.
pub fn generate(options: &SynthOptions) -> Vec<FlightRow> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let ellipsoid = Ellipsoid::default();
    let room = (DateTime::<Utc>::MAX_UTC - options.start).num_minutes();
    let span_minutes = (i64::from(options.span_hours.max(1)) * 60).min(room.max(1));

    let mut flights: Vec<(DateTime<Utc>, FlightRow)> = (0..options.count)
        .map(|_| {
            let from = rng.random_range(0..AIRPORTS.len());
            let mut to = rng.random_range(0..AIRPORTS.len() - 1);
            if to >= from {
                to += 1;
            }
            let (dep_code, dep_lat, dep_lon) = AIRPORTS[from];
            let (arr_code, arr_lat, arr_lon) = AIRPORTS[to];
            let carrier = CARRIERS[rng.random_range(0..CARRIERS.len())];

            let distance_km = ellipsoid
                .inverse(GeoPoint::new(dep_lon, dep_lat), GeoPoint::new(arr_lon, arr_lat))
                .distance_m
                / 1000.0;
            let jitter: f64 = rng.random_range(0.9..1.1);
            let air_time = (distance_km / CRUISE_KM_PER_MIN * jitter + OVERHEAD_MIN).round();
            let departure = options.start + Duration::minutes(rng.random_range(0..span_minutes));

            let row = FlightRow {
                carrier: carrier.to_string(),
                dep_airport: Some(dep_code.to_string()),
                arr_airport: Some(arr_code.to_string()),
                dep_latitude: Some(dep_lat),
                dep_longitude: Some(dep_lon),
                arr_latitude: Some(arr_lat),
                arr_longitude: Some(arr_lon),
                dep_datetime_utc: departure.format("%Y-%m-%d %H:%M:%S").to_string(),
                air_time_minutes: Some(air_time),
            };
            (departure, row)
        })
        .collect();

    flights.sort_by_key(|(departure, _)| *departure);
    flights.into_iter().map(|(_, row)| row).collect()
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write>(writer: W, rows: &[FlightRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
