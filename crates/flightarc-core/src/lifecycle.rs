//! Flight lifecycle tracking.
//!
//! Flights are pulled one at a time from a departure-ordered source, given a
//! stable id, and moved Pending -> Active -> Decaying -> Removed as the
//! simulation clock advances. Tracked flights live in an id-indexed map so a
//! tick only visits flights that are still on screen.

use std::collections::BTreeMap;
use std::iter::Peekable;

use chrono::{DateTime, Utc};

use crate::error::{FlightRecordError, RejectedRecord};
use crate::geodesic::{GreatCircleInterpolator, GreatCirclePath};
use crate::models::{Flight, FlightId, FlightRecord, LifecycleState, StateCounts};
use crate::rules::SimulationRules;

/// Path to draw for one Active flight this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePath {
    pub id: FlightId,
    pub carrier: String,
    pub completion_fraction: f64,
    pub path: GreatCirclePath,
}

/// Opacity update for one Decaying flight this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub id: FlightId,
    pub opacity: f64,
}

/// Everything that changed during one tick, in ingestion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickUpdate {
    /// Pending flights that became Active
    pub activated: Vec<FlightId>,
    pub paths: Vec<ActivePath>,
    /// Active flights whose fraction passed 1.0
    pub arrived: Vec<FlightId>,
    pub fades: Vec<Fade>,
    pub removed: Vec<FlightId>,
}

/// Owns every known flight and drives its state machine.
pub struct FlightLifecycleManager<I>
where
    I: Iterator<Item = Result<FlightRecord, RejectedRecord>>,
{
    source: Peekable<I>,
    rules: SimulationRules,
    flights: BTreeMap<FlightId, Flight>,
    counts: StateCounts,
    next_id: u64,
    /// Records pulled so far, used to locate rejects without a row number
    position: usize,
    last_departure: Option<DateTime<Utc>>,
    rejected: Vec<RejectedRecord>,
    arrived_total: usize,
    removed_total: usize,
}

impl<I> FlightLifecycleManager<I>
where
    I: Iterator<Item = Result<FlightRecord, RejectedRecord>>,
{
    pub fn new(source: I, rules: SimulationRules) -> Self {
        Self {
            source: source.peekable(),
            rules,
            flights: BTreeMap::new(),
            counts: StateCounts::default(),
            next_id: 0,
            position: 0,
            last_departure: None,
            rejected: Vec::new(),
            arrived_total: 0,
            removed_total: 0,
        }
    }

    /// Departure time of the first valid record, skipping (and reporting) invalid ones.
    pub fn peek_first_departure(&mut self) -> Option<DateTime<Utc>> {
        loop {
            let valid = match self.source.peek()? {
                Ok(record) => record.validate().is_ok(),
                Err(_) => false,
            };
            if valid {
                return self
                    .source
                    .peek()
                    .and_then(|item| item.as_ref().ok())
                    .map(|record| record.departure_time);
            }
            let item = self.source.next()?;
            self.position += 1;
            if let Err(rejected) = self.accept(item) {
                self.reject(rejected);
            }
        }
    }

    /// Pull every record departing at or before `now` and track it as Pending.
    ///
    /// Source order is kept, so flights with equal departure times get ids in
    /// input order. Invalid records are reported and skipped.
    pub fn admit_due(&mut self, now: DateTime<Utc>) -> Vec<FlightId> {
        let mut admitted = Vec::new();
        loop {
            let due = match self.source.peek() {
                None => break,
                Some(Err(_)) => true,
                Some(Ok(record)) => record.departure_time <= now,
            };
            if !due {
                break;
            }
            let Some(item) = self.source.next() else {
                break;
            };
            self.position += 1;
            match self.accept(item) {
                Ok(id) => admitted.push(id),
                Err(rejected) => self.reject(rejected),
            }
        }
        admitted
    }

    fn accept(
        &mut self,
        item: Result<FlightRecord, RejectedRecord>,
    ) -> Result<FlightId, RejectedRecord> {
        let record = item?;
        let at = record.row.or(Some(self.position));
        record
            .validate()
            .map_err(|error| RejectedRecord::new(at, error))?;

        if let Some(previous) = self.last_departure {
            if record.departure_time < previous {
                return Err(RejectedRecord::new(
                    at,
                    FlightRecordError::DepartureOutOfOrder {
                        previous,
                        found: record.departure_time,
                    },
                ));
            }
        }
        self.last_departure = Some(record.departure_time);

        let id = FlightId(self.next_id);
        self.next_id += 1;
        tracing::trace!("Admitted {} as flight {}", record.route_label(), id);

        self.flights.insert(id, Flight::from_record(id, record));
        self.counts.increment(LifecycleState::Pending);
        Ok(id)
    }

    fn reject(&mut self, rejected: RejectedRecord) {
        tracing::warn!("Rejected flight record: {}", rejected);
        self.rejected.push(rejected);
    }

    /// Update every tracked flight for time `now`.
    ///
    /// Due Pending flights become Active. Active flights get a fresh fraction
    /// and path; a fraction above 1.0 moves the flight to Decaying at base
    /// opacity, after its full-length path is emitted one last time. Every
    /// Decaying flight (including one that just arrived) then loses one
    /// opacity step, and a flight whose opacity reaches 0 is Removed.
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        interpolator: &GreatCircleInterpolator,
    ) -> TickUpdate {
        let mut update = TickUpdate::default();
        let decay_ticks = self.rules.decay_ticks();

        for flight in self.flights.values_mut() {
            if flight.state == LifecycleState::Pending && flight.is_due(now) {
                transition(flight, &mut self.counts, LifecycleState::Active);
                flight.route = Some(interpolator.route(flight.departure_point, flight.arrival_point));
                update.activated.push(flight.id);
            }

            if flight.state == LifecycleState::Active {
                let previous = flight.completion_fraction.unwrap_or(0.0);
                let fraction = flight.completion_fraction_at(now).max(previous);
                flight.completion_fraction = Some(fraction);

                let (from, to) = (flight.departure_point, flight.arrival_point);
                let route = *flight
                    .route
                    .get_or_insert_with(|| interpolator.route(from, to));
                update.paths.push(ActivePath {
                    id: flight.id,
                    carrier: flight.carrier.clone(),
                    completion_fraction: fraction,
                    path: interpolator.interpolate_along(flight.departure_point, &route, fraction),
                });

                if fraction > 1.0 {
                    transition(flight, &mut self.counts, LifecycleState::Decaying);
                    flight.opacity = Some(self.rules.base_opacity);
                    flight.decay_ticks = 0;
                    update.arrived.push(flight.id);
                }
            }

            if flight.state == LifecycleState::Decaying {
                flight.decay_ticks += 1;
                let opacity = self.rules.opacity_after(flight.decay_ticks);
                flight.opacity = Some(opacity);
                update.fades.push(Fade {
                    id: flight.id,
                    opacity,
                });

                if flight.decay_ticks >= decay_ticks {
                    transition(flight, &mut self.counts, LifecycleState::Removed);
                    update.removed.push(flight.id);
                }
            }
        }

        for id in &update.removed {
            self.flights.remove(id);
        }
        self.arrived_total += update.arrived.len();
        self.removed_total += update.removed.len();

        update
    }

    /// Current state of a flight; Removed once it has been dropped.
    pub fn state_of(&self, id: FlightId) -> Option<LifecycleState> {
        match self.flights.get(&id) {
            Some(flight) => Some(flight.state),
            None if id.0 < self.next_id => Some(LifecycleState::Removed),
            None => None,
        }
    }

    pub fn flight(&self, id: FlightId) -> Option<&Flight> {
        self.flights.get(&id)
    }

    pub fn active_ids(&self) -> Vec<FlightId> {
        self.ids_in(LifecycleState::Active)
    }

    pub fn decaying_ids(&self) -> Vec<FlightId> {
        self.ids_in(LifecycleState::Decaying)
    }

    fn ids_in(&self, state: LifecycleState) -> Vec<FlightId> {
        self.flights
            .values()
            .filter(|f| f.state == state)
            .map(|f| f.id)
            .collect()
    }

    pub fn tracked_len(&self) -> usize {
        self.flights.len()
    }

    pub fn counts(&self) -> StateCounts {
        self.counts
    }

    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    pub fn admitted_total(&self) -> usize {
        self.next_id as usize
    }

    pub fn arrived_total(&self) -> usize {
        self.arrived_total
    }

    pub fn removed_total(&self) -> usize {
        self.removed_total
    }

    pub fn rules(&self) -> &SimulationRules {
        &self.rules
    }

    /// True once the source is drained and no flight is tracked.
    pub fn is_exhausted(&mut self) -> bool {
        self.flights.is_empty() && self.source.peek().is_none()
    }
}

fn transition(flight: &mut Flight, counts: &mut StateCounts, next: LifecycleState) {
    debug_assert!(
        flight.state.can_advance_to(next),
        "illegal transition {} -> {} for flight {}",
        flight.state,
        next,
        flight.id
    );
    counts.decrement(flight.state);
    counts.increment(next);
    flight.state = next;
    if next != LifecycleState::Active && next != LifecycleState::Decaying {
        flight.completion_fraction = None;
    }
}
