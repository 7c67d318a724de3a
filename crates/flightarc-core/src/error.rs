//! Error types for ingestion, collaborators and the tick loop.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::FlightId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a single flight record was refused at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlightRecordError {
    #[error("duration must be positive, got {0} minutes")]
    NonPositiveDuration(f64),
    #[error("duration is not a finite number")]
    NonFiniteDuration,
    #[error("{field} is invalid: {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("unparsable departure time {0:?}")]
    UnparsableDeparture(String),
    #[error("departure {found} precedes previous departure {previous}")]
    DepartureOutOfOrder {
        previous: DateTime<Utc>,
        found: DateTime<Utc>,
    },
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// A rejected record with its data row in the input, or its 1-based pull
/// position when the record carries no row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record {}: {error}", display_row(.row))]
pub struct RejectedRecord {
    pub row: Option<usize>,
    #[source]
    pub error: FlightRecordError,
}

fn display_row(row: &Option<usize>) -> String {
    row.map(|r| r.to_string()).unwrap_or_else(|| "?".into())
}

impl RejectedRecord {
    pub fn new(row: Option<usize>, error: FlightRecordError) -> Self {
        Self { row, error }
    }
}

/// Failure reported by a render adapter, frame sink or palette.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation rules: {0}")]
    InvalidRules(String),
    #[error("flight source contains no valid record")]
    NoFlights,
    #[error("render adapter failed at tick {tick} for flight {flight}: {source}")]
    Render {
        tick: u64,
        flight: FlightId,
        #[source]
        source: CollaboratorError,
    },
    #[error("frame {sequence} could not be written: {source}")]
    FrameSink {
        sequence: u64,
        #[source]
        source: CollaboratorError,
    },
}
