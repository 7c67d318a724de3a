//! Property tests for interpolation and lifecycle laws.

use chrono::{DateTime, Duration, TimeZone, Utc};
use flightarc_core::{
    FlightId, FlightLifecycleManager, FlightRecord, GeoPoint, GreatCircleInterpolator,
    LifecycleState, RejectedRecord, SimulationRules,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, 15, 0, 0, 0).unwrap()
}

fn geo_point() -> impl Strategy<Value = GeoPoint> {
    (-179.0f64..179.0, -80.0f64..80.0).prop_map(|(lon, lat)| GeoPoint::new(lon, lat))
}

fn flight_plan() -> impl Strategy<Value = Vec<(i64, f64, GeoPoint, GeoPoint)>> {
    prop::collection::vec((0i64..120, 1.0f64..240.0, geo_point(), geo_point()), 1..12).prop_map(
        |mut flights| {
            flights.sort_by_key(|f| f.0);
            flights
        },
    )
}

fn rank(state: LifecycleState) -> u8 {
    match state {
        LifecycleState::Pending => 0,
        LifecycleState::Active => 1,
        LifecycleState::Decaying => 2,
        LifecycleState::Removed => 3,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn path_grows_with_fraction(p0 in geo_point(), p1 in geo_point(), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let (t1, t2) = if a <= b { (a, b) } else { (b, a) };
        let interpolator = GreatCircleInterpolator::default();
        let short = interpolator.interpolate(p0, p1, t1);
        let long = interpolator.interpolate(p0, p1, t2);

        prop_assert!(long.len() >= short.len());
        prop_assert!(long.traversed_m >= short.traversed_m);
        prop_assert_eq!(short.first(), Some(&p0));
        prop_assert_eq!(long.first(), Some(&p0));
    }

    #[test]
    fn zero_fraction_or_same_point_is_departure_only(p0 in geo_point(), p1 in geo_point(), t in 0.0f64..1.0) {
        let interpolator = GreatCircleInterpolator::default();
        prop_assert_eq!(interpolator.interpolate(p0, p1, 0.0).points, vec![p0]);
        prop_assert_eq!(interpolator.interpolate(p0, p0, t).points, vec![p0]);
    }

    #[test]
    fn lifecycle_moves_forward_with_monotonic_fraction(plan in flight_plan()) {
        let records: Vec<Result<FlightRecord, RejectedRecord>> = plan
            .iter()
            .map(|(offset, duration, from, to)| {
                Ok(FlightRecord {
                    carrier: "ZZ".to_string(),
                    departure_airport: None,
                    arrival_airport: None,
                    departure_point: *from,
                    arrival_point: *to,
                    departure_time: t0() + Duration::minutes(*offset),
                    duration_minutes: *duration,
                    row: None,
                })
            })
            .collect();
        let rules = SimulationRules::default();
        let base = rules.base_opacity;
        let mut manager = FlightLifecycleManager::new(records.into_iter(), rules);
        let interpolator = GreatCircleInterpolator::new(Default::default(), 1_000_000.0);

        let mut last_state: HashMap<FlightId, LifecycleState> = HashMap::new();
        let mut last_fraction: HashMap<FlightId, f64> = HashMap::new();

        for minute in 0..400 {
            let now = t0() + Duration::minutes(minute);
            for id in manager.admit_due(now) {
                last_state.insert(id, LifecycleState::Pending);
            }
            let update = manager.advance(now, &interpolator);

            for fade in &update.fades {
                prop_assert!((0.0..=base).contains(&fade.opacity));
            }
            for path in &update.paths {
                let previous = last_fraction.insert(path.id, path.completion_fraction);
                if let Some(previous) = previous {
                    prop_assert!(path.completion_fraction >= previous);
                }
            }

            for (id, previous) in last_state.iter_mut() {
                let current = manager.state_of(*id).unwrap();
                prop_assert!(rank(current) >= rank(*previous));
                // One step per tick, never skipping a state
                prop_assert!(rank(current) - rank(*previous) <= 1);
                *previous = current;
            }
        }

        // 240 min max flight + 6 fade ticks fit in 400 minutes
        prop_assert!(last_state.values().all(|s| *s == LifecycleState::Removed));
        prop_assert_eq!(manager.admitted_total(), plan.len());
    }
}
