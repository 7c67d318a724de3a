//! In-memory drawing surface holding one polyline per flight.

use std::collections::BTreeMap;

use flightarc_core::{CollaboratorError, FlightId, LineColor, PlotPoint, RenderAdapter};

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLine {
    pub carrier: String,
    pub points: Vec<PlotPoint>,
    pub color: LineColor,
}

impl CanvasLine {
    pub fn is_visible(&self) -> bool {
        self.color.a > 0.0 && self.points.len() >= 2
    }
}

/// Lines keyed by flight id, iterated in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    lines: BTreeMap<FlightId, CanvasLine>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self, id: FlightId) -> Option<&CanvasLine> {
        self.lines.get(&id)
    }

    pub fn lines(&self) -> impl Iterator<Item = (&FlightId, &CanvasLine)> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl RenderAdapter for Canvas {
    fn upsert_line(
        &mut self,
        id: FlightId,
        carrier: &str,
        points: &[PlotPoint],
        color: LineColor,
    ) -> Result<(), CollaboratorError> {
        match self.lines.get_mut(&id) {
            Some(line) => {
                line.points.clear();
                line.points.extend_from_slice(points);
            }
            None => {
                self.lines.insert(
                    id,
                    CanvasLine {
                        carrier: carrier.to_string(),
                        points: points.to_vec(),
                        color,
                    },
                );
            }
        }
        Ok(())
    }

    fn set_opacity(&mut self, id: FlightId, opacity: f64) -> Result<(), CollaboratorError> {
        if opacity <= 0.0 {
            self.lines.remove(&id);
            return Ok(());
        }
        let line = self
            .lines
            .get_mut(&id)
            .ok_or_else(|| CollaboratorError::new(format!("no line drawn for flight {id}")))?;
        line.color = line.color.with_alpha(opacity);
        Ok(())
    }
}
