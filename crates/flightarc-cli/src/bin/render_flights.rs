//! Render every flight of a dataset as growing great-circle arcs, one PNG per tick.
//!
//! Usage:
//!   cargo run -p flightarc-cli --bin render_flights -- --dataset flights.csv --frame-dir img

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use flightarc_cli::{
    Canvas, Config, Dataset, LambertConformalConic, PngFrameSink, RainbowPalette, Viewport,
};
use flightarc_core::{
    Collaborators, Ellipsoid, GreatCircleInterpolator, SimulationRules, TimeStepScheduler,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EllipsoidArg {
    /// Clarke 1866, matching the map projection
    Clarke1866,
    Wgs84,
}

impl From<EllipsoidArg> for Ellipsoid {
    fn from(arg: EllipsoidArg) -> Self {
        match arg {
            EllipsoidArg::Clarke1866 => Ellipsoid::CLARKE_1866,
            EllipsoidArg::Wgs84 => Ellipsoid::WGS84,
        }
    }
}

/// Flight arc renderer
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Flights CSV (overrides FLIGHTARC_DATASET)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Output directory for frames (overrides FLIGHTARC_FRAME_DIR)
    #[arg(long)]
    frame_dir: Option<PathBuf>,

    /// Frame width in pixels (overrides FLIGHTARC_WIDTH_PX)
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels (overrides FLIGHTARC_HEIGHT_PX)
    #[arg(long)]
    height: Option<u32>,

    /// Simulated time after the first departure
    #[arg(long, default_value_t = 48)]
    horizon_hours: i64,

    /// Simulated seconds per frame
    #[arg(long, default_value_t = 60)]
    tick_seconds: i64,

    /// Reference ellipsoid for geodesics and projection
    #[arg(long, value_enum, default_value = "clarke1866")]
    ellipsoid: EllipsoidArg,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flightarc_core=info".parse()?)
                .add_directive("flightarc_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }
    if let Some(frame_dir) = args.frame_dir {
        config.frame_dir = frame_dir;
    }
    if let Some(width) = args.width {
        config.width_px = width;
    }
    if let Some(height) = args.height {
        config.height_px = height;
    }

    let rules = SimulationRules {
        horizon_minutes: args
            .horizon_hours
            .checked_mul(60)
            .context("--horizon-hours is too large")?,
        tick_seconds: args.tick_seconds,
        ..Default::default()
    };
    let ellipsoid = Ellipsoid::from(args.ellipsoid);

    let dataset = Dataset::load(&config.dataset)
        .with_context(|| format!("loading {}", config.dataset.display()))?;
    let palette = RainbowPalette::new(dataset.unique_carriers(), rules.base_opacity);
    let projection = LambertConformalConic::north_america(ellipsoid);
    let (extent_width, extent_height) = projection.extent();
    let sink = PngFrameSink::new(
        &config.frame_dir,
        Viewport {
            width_px: config.width_px,
            height_px: config.height_px,
            extent_width,
            extent_height,
        },
    )
    .with_context(|| format!("creating {}", config.frame_dir.display()))?;

    tracing::info!(
        "Rendering {} flights into {} ({}x{})",
        dataset.len(),
        config.frame_dir.display(),
        config.width_px,
        config.height_px
    );

    let mut scheduler = TimeStepScheduler::new(
        dataset.into_source(),
        rules.clone(),
        GreatCircleInterpolator::from_rules(ellipsoid, &rules),
        Collaborators {
            render: Canvas::new(),
            sink,
            projection,
            palette,
        },
    )?;
    let summary = scheduler.run()?;

    let summary_path = config.frame_dir.join("run.json");
    let file = File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;
    tracing::info!("Run summary written to {}", summary_path.display());

    if args.summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
