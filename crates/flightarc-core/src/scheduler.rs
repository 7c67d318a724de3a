//! Simulation clock and tick loop.
//!
//! Each tick runs strictly in order: admit newly due flights, advance the
//! lifecycle, push paths and fades to the render adapter, write one frame,
//! then move the clock forward. A collaborator failure aborts the run so that
//! frame N always shows tick N.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{RejectedRecord, SimulationError};
use crate::geodesic::GreatCircleInterpolator;
use crate::lifecycle::{FlightLifecycleManager, TickUpdate};
use crate::models::{FlightRecord, StateCounts};
use crate::render::{CarrierPalette, FrameInfo, FrameSink, Projection, RenderAdapter};
use crate::rules::SimulationRules;

/// The external collaborators a scheduler drives.
pub struct Collaborators<R, S, P, C> {
    pub render: R,
    pub sink: S,
    pub projection: P,
    pub palette: C,
}

/// Start and end of the simulated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub clock: DateTime<Utc>,
    pub admitted: usize,
    pub arrived: usize,
    pub removed: usize,
    pub counts: StateCounts,
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub tick_seconds: i64,
    pub frames_written: u64,
    pub flights_admitted: usize,
    pub flights_arrived: usize,
    pub flights_removed: usize,
    /// Flights still Active or Decaying when the window closed
    pub still_tracked: usize,
    pub rejected_records: usize,
}

/// Drives the simulation clock from the first departure to the horizon.
pub struct TimeStepScheduler<I, R, S, P, C>
where
    I: Iterator<Item = Result<FlightRecord, RejectedRecord>>,
{
    manager: FlightLifecycleManager<I>,
    interpolator: GreatCircleInterpolator,
    rules: SimulationRules,
    render: R,
    sink: S,
    projection: P,
    palette: C,
    window: Option<SimulationWindow>,
    clock: Option<DateTime<Utc>>,
    frames_written: u64,
}

impl<I, R, S, P, C> TimeStepScheduler<I, R, S, P, C>
where
    I: Iterator<Item = Result<FlightRecord, RejectedRecord>>,
    R: RenderAdapter,
    S: FrameSink<R>,
    P: Projection,
    C: CarrierPalette,
{
    pub fn new(
        source: I,
        rules: SimulationRules,
        interpolator: GreatCircleInterpolator,
        collaborators: Collaborators<R, S, P, C>,
    ) -> Result<Self, SimulationError> {
        rules.validate()?;
        let Collaborators {
            render,
            sink,
            projection,
            palette,
        } = collaborators;

        Ok(Self {
            manager: FlightLifecycleManager::new(source, rules.clone()),
            interpolator,
            rules,
            render,
            sink,
            projection,
            palette,
            window: None,
            clock: None,
            frames_written: 0,
        })
    }

    /// Fix the window at the first valid departure. Idempotent.
    pub fn start(&mut self) -> Result<SimulationWindow, SimulationError> {
        if let Some(window) = self.window {
            return Ok(window);
        }
        let start = self
            .manager
            .peek_first_departure()
            .ok_or(SimulationError::NoFlights)?;
        let end = start
            .checked_add_signed(self.rules.horizon())
            .ok_or_else(|| {
                SimulationError::InvalidRules(format!(
                    "horizon of {} minutes after {} is past the representable calendar",
                    self.rules.horizon_minutes, start
                ))
            })?;
        let window = SimulationWindow { start, end };
        self.window = Some(window);
        self.clock = Some(start);
        Ok(window)
    }

    /// Run one tick. Returns `None` once the clock has reached the end of the window.
    pub fn step(&mut self) -> Result<Option<TickReport>, SimulationError> {
        let window = self.start()?;
        let now = self.clock.unwrap_or(window.start);
        if now >= window.end {
            return Ok(None);
        }
        let tick = self.frames_written;

        let admitted = self.manager.admit_due(now);
        let update = self.manager.advance(now, &self.interpolator);
        self.push_to_renderer(tick, &update)?;

        let frame = FrameInfo {
            sequence: tick,
            clock: now,
        };
        self.sink
            .write_frame(&frame, &self.render)
            .map_err(|source| SimulationError::FrameSink {
                sequence: tick,
                source,
            })?;
        self.frames_written += 1;
        // A step past the calendar is past the window too
        self.clock = Some(
            now.checked_add_signed(self.rules.tick_duration())
                .unwrap_or(window.end),
        );

        let report = TickReport {
            tick,
            clock: now,
            admitted: admitted.len(),
            arrived: update.arrived.len(),
            removed: update.removed.len(),
            counts: self.manager.counts(),
        };
        tracing::debug!(
            "Tick {} @ {}: {} active, {} decaying, +{} admitted, {} arrived, {} removed",
            report.tick,
            now.format("%Y-%m-%d %H:%M"),
            report.counts.active,
            report.counts.decaying,
            report.admitted,
            report.arrived,
            report.removed
        );
        Ok(Some(report))
    }

    fn push_to_renderer(&mut self, tick: u64, update: &TickUpdate) -> Result<(), SimulationError> {
        for active in &update.paths {
            let points = self.projection.project(&active.path.points);
            let color = self
                .palette
                .color_for(&active.carrier)
                .with_alpha(self.rules.base_opacity);
            self.render
                .upsert_line(active.id, &active.carrier, &points, color)
                .map_err(|source| SimulationError::Render {
                    tick,
                    flight: active.id,
                    source,
                })?;
        }

        for fade in &update.fades {
            self.render
                .set_opacity(fade.id, fade.opacity)
                .map_err(|source| SimulationError::Render {
                    tick,
                    flight: fade.id,
                    source,
                })?;
        }
        Ok(())
    }

    /// Run every tick of the window.
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        let window = self.start()?;
        tracing::info!(
            "Simulating {} -> {} in {} ticks of {}s",
            window.start,
            window.end,
            self.rules.frame_count(),
            self.rules.tick_seconds
        );

        while self.step()?.is_some() {}

        let summary = self.summary(window);
        tracing::info!(
            "Run complete: {} frames, {} flights admitted, {} rejected, {} still on screen",
            summary.frames_written,
            summary.flights_admitted,
            summary.rejected_records,
            summary.still_tracked
        );
        Ok(summary)
    }

    fn summary(&self, window: SimulationWindow) -> RunSummary {
        RunSummary {
            start_time: window.start,
            end_time: window.end,
            tick_seconds: self.rules.tick_seconds,
            frames_written: self.frames_written,
            flights_admitted: self.manager.admitted_total(),
            flights_arrived: self.manager.arrived_total(),
            flights_removed: self.manager.removed_total(),
            still_tracked: self.manager.tracked_len(),
            rejected_records: self.manager.rejected().len(),
        }
    }

    pub fn clock(&self) -> Option<DateTime<Utc>> {
        self.clock
    }

    pub fn window(&self) -> Option<SimulationWindow> {
        self.window
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn manager(&self) -> &FlightLifecycleManager<I> {
        &self.manager
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Hand back the render adapter and frame sink.
    pub fn into_parts(self) -> (R, S) {
        (self.render, self.sink)
    }
}
