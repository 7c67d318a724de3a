//! Dataset to PNG frames, end to end.

use std::fs;
use std::io::Write;

use flightarc_cli::{
    Canvas, Dataset, LambertConformalConic, PngFrameSink, RainbowPalette, Viewport,
};
use flightarc_core::{
    Collaborators, Ellipsoid, GreatCircleInterpolator, SimulationRules, TimeStepScheduler,
};

const CSV: &str = "\
carrier,dep_airport,arr_airport,dep_latitude,dep_longitude,arr_latitude,arr_longitude,dep_datetime_utc,air_time_minutes
DL,ATL,LGA,33.6407,-84.4277,40.7769,-73.8740,2019-01-01 05:10:00,20
AS,SEA,MIA,47.4502,-122.3088,25.7959,-80.2870,2019-01-01 05:00:00,12
UA,ORD,SFO,41.9742,-87.9073,37.6213,-122.3790,2019-01-01 05:05:00,0
";

#[test]
fn test_dataset_renders_numbered_frames() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("flights.csv");
    fs::File::create(&csv_path)
        .unwrap()
        .write_all(CSV.as_bytes())
        .unwrap();

    let dataset = Dataset::load(&csv_path).unwrap();
    assert_eq!(dataset.unique_carriers(), &["AS", "DL"]);
    assert_eq!(dataset.rejected().len(), 1);

    let rules = SimulationRules {
        horizon_minutes: 40,
        ..Default::default()
    };
    let projection = LambertConformalConic::north_america(Ellipsoid::CLARKE_1866);
    let (extent_width, extent_height) = projection.extent();
    let frame_dir = dir.path().join("img");
    let sink = PngFrameSink::new(
        &frame_dir,
        Viewport {
            width_px: 120,
            height_px: 80,
            extent_width,
            extent_height,
        },
    )
    .unwrap();

    let mut scheduler = TimeStepScheduler::new(
        dataset.into_source(),
        rules.clone(),
        GreatCircleInterpolator::from_rules(Ellipsoid::CLARKE_1866, &rules),
        Collaborators {
            render: Canvas::new(),
            sink,
            projection,
            palette: RainbowPalette::new(&["AS".to_string(), "DL".to_string()], 0.3),
        },
    )
    .unwrap();
    let summary = scheduler.run().unwrap();

    assert_eq!(summary.frames_written, 40);
    assert_eq!(summary.flights_admitted, 2);
    assert_eq!(summary.rejected_records, 1);
    // AS lands at 05:12 and DL at 05:30; both fade out within six ticks
    assert_eq!(summary.flights_removed, 2);

    let mut names: Vec<String> = fs::read_dir(&frame_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 40);
    assert_eq!(names.first().map(String::as_str), Some("0000000.png"));
    assert_eq!(names.last().map(String::as_str), Some("0000039.png"));

    let (canvas, _) = scheduler.into_parts();
    assert!(canvas.is_empty());
}
