//! Core data models for the flight arc simulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FlightRecordError;
use crate::geodesic::Geodesic;

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Planar plotting coordinate produced by a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

impl PlotPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Stable flight identity, assigned in ingestion order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(pub u64);

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One scheduled trip as it arrives from the input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub carrier: String,
    /// Airport codes are informational only
    #[serde(default)]
    pub departure_airport: Option<String>,
    #[serde(default)]
    pub arrival_airport: Option<String>,
    pub departure_point: GeoPoint,
    pub arrival_point: GeoPoint,
    pub departure_time: DateTime<Utc>,
    pub duration_minutes: f64,
    /// Data row in the input file, when the source has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl FlightRecord {
    /// Check the record can be simulated: positive finite duration and in-range coordinates.
    pub fn validate(&self) -> Result<(), FlightRecordError> {
        if !self.duration_minutes.is_finite() {
            return Err(FlightRecordError::NonFiniteDuration);
        }
        if self.duration_minutes <= 0.0 {
            return Err(FlightRecordError::NonPositiveDuration(self.duration_minutes));
        }

        check_coordinate("departure longitude", self.departure_point.lon, 180.0)?;
        check_coordinate("departure latitude", self.departure_point.lat, 90.0)?;
        check_coordinate("arrival longitude", self.arrival_point.lon, 180.0)?;
        check_coordinate("arrival latitude", self.arrival_point.lat, 90.0)?;
        Ok(())
    }

    /// Short route label for log lines, e.g. `AA JFK->LAX`.
    pub fn route_label(&self) -> String {
        format!(
            "{} {}->{}",
            self.carrier,
            self.departure_airport.as_deref().unwrap_or("?"),
            self.arrival_airport.as_deref().unwrap_or("?"),
        )
    }
}

fn check_coordinate(field: &'static str, value: f64, limit: f64) -> Result<(), FlightRecordError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(())
    } else {
        Err(FlightRecordError::InvalidCoordinate { field, value })
    }
}

/// Lifecycle of a flight as simulated time advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Ingested, not yet drawn
    #[default]
    Pending,
    /// Airborne; the arc grows every tick
    Active,
    /// Arrived; the line fades out
    Decaying,
    /// Fully faded and no longer tracked
    Removed,
}

impl LifecycleState {
    /// Transitions are strictly forward, one step at a time.
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        matches!(
            (self, next),
            (LifecycleState::Pending, LifecycleState::Active)
                | (LifecycleState::Active, LifecycleState::Decaying)
                | (LifecycleState::Decaying, LifecycleState::Removed)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Pending => write!(f, "PENDING"),
            LifecycleState::Active => write!(f, "ACTIVE"),
            LifecycleState::Decaying => write!(f, "DECAYING"),
            LifecycleState::Removed => write!(f, "REMOVED"),
        }
    }
}

/// A tracked flight and its lifecycle record.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub id: FlightId,
    pub carrier: String,
    pub departure_point: GeoPoint,
    pub arrival_point: GeoPoint,
    pub departure_time: DateTime<Utc>,
    pub duration_minutes: f64,
    pub state: LifecycleState,
    /// Defined while Active and on the tick the flight starts decaying
    pub completion_fraction: Option<f64>,
    /// Defined while Decaying
    pub opacity: Option<f64>,
    /// Number of decay steps applied so far
    pub(crate) decay_ticks: u32,
    /// Full-route geodesic, solved on activation
    pub(crate) route: Option<Geodesic>,
}

impl Flight {
    /// Create a Pending flight from an already validated record.
    pub fn from_record(id: FlightId, record: FlightRecord) -> Self {
        Self {
            id,
            carrier: record.carrier,
            departure_point: record.departure_point,
            arrival_point: record.arrival_point,
            departure_time: record.departure_time,
            duration_minutes: record.duration_minutes,
            state: LifecycleState::Pending,
            completion_fraction: None,
            opacity: None,
            decay_ticks: 0,
            route: None,
        }
    }

    /// Elapsed fraction of the scheduled duration at `now`.
    pub fn completion_fraction_at(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_minutes = (now - self.departure_time).num_milliseconds() as f64 / 60_000.0;
        elapsed_minutes / self.duration_minutes
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.departure_time <= now
    }
}

/// Number of tracked flights in each live state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub pending: usize,
    pub active: usize,
    pub decaying: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.pending + self.active + self.decaying
    }

    pub(crate) fn increment(&mut self, state: LifecycleState) {
        match state {
            LifecycleState::Pending => self.pending += 1,
            LifecycleState::Active => self.active += 1,
            LifecycleState::Decaying => self.decaying += 1,
            LifecycleState::Removed => {}
        }
    }

    pub(crate) fn decrement(&mut self, state: LifecycleState) {
        match state {
            LifecycleState::Pending => self.pending = self.pending.saturating_sub(1),
            LifecycleState::Active => self.active = self.active.saturating_sub(1),
            LifecycleState::Decaying => self.decaying = self.decaying.saturating_sub(1),
            LifecycleState::Removed => {}
        }
    }
}
