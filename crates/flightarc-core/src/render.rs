//! Interfaces to the rendering collaborators.
//!
//! The core never touches a drawing surface directly: the scheduler is handed
//! a render adapter, a frame sink, a projection and a carrier palette, which
//! lets the whole tick loop run headless in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::models::{FlightId, GeoPoint, PlotPoint};

/// RGBA line color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl LineColor {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Owns the visual lines, one per flight id.
pub trait RenderAdapter {
    /// Create the line for `id` or replace the points of the existing one.
    fn upsert_line(
        &mut self,
        id: FlightId,
        carrier: &str,
        points: &[PlotPoint],
        color: LineColor,
    ) -> Result<(), CollaboratorError>;

    /// Dim an existing line.
    fn set_opacity(&mut self, id: FlightId, opacity: f64) -> Result<(), CollaboratorError>;
}

/// Identifies the frame being persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    /// Consecutive from 0
    pub sequence: u64,
    pub clock: DateTime<Utc>,
}

/// Persists the current visual state of a surface as a numbered frame.
pub trait FrameSink<S: ?Sized> {
    fn write_frame(&mut self, frame: &FrameInfo, surface: &S) -> Result<(), CollaboratorError>;
}

/// Converts geographic coordinates to plotting coordinates.
pub trait Projection {
    fn project_point(&self, point: GeoPoint) -> PlotPoint;

    fn project(&self, points: &[GeoPoint]) -> Vec<PlotPoint> {
        points.iter().map(|p| self.project_point(*p)).collect()
    }
}

/// Plots longitude as x and latitude as y.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Projection for Identity {
    fn project_point(&self, point: GeoPoint) -> PlotPoint {
        PlotPoint::new(point.lon, point.lat)
    }
}

/// Fixed color per carrier.
pub trait CarrierPalette {
    fn color_for(&self, carrier: &str) -> LineColor;
}

/// Same color for every carrier.
#[derive(Debug, Clone, Copy)]
pub struct SingleColor(pub LineColor);

impl CarrierPalette for SingleColor {
    fn color_for(&self, _carrier: &str) -> LineColor {
        self.0
    }
}
