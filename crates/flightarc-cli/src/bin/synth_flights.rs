//! Write a seeded demo flights CSV.
//!
//! Usage:
//!   cargo run -p flightarc-cli --bin synth_flights -- --count 2000 --output flights.csv

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use flightarc_cli::synth::{self, SynthOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo dataset generator
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Output CSV path
    #[arg(long, default_value = "flights.csv")]
    output: PathBuf,

    /// Number of flights
    #[arg(long, default_value_t = 500)]
    count: usize,

    /// RNG seed
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Earliest departure (RFC 3339)
    #[arg(long, default_value = "2019-01-01T05:00:00Z")]
    start: DateTime<Utc>,

    /// Departures are spread over this many hours
    #[arg(long, default_value_t = 24)]
    span_hours: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flightarc_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let rows = synth::generate(&SynthOptions {
        count: args.count,
        seed: args.seed,
        start: args.start,
        span_hours: args.span_hours,
    });

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    synth::write_csv(file, &rows)?;
    tracing::info!("Wrote {} flights to {}", rows.len(), args.output.display());
    Ok(())
}
