//! Flight arc CLI - dataset loading, raster output and binaries around the engine.
//!
//! Binaries:
//! - render_flights: renders one PNG frame per simulated minute
//! - synth_flights: writes a seeded demo dataset

pub mod canvas;
pub mod config;
pub mod dataset;
pub mod frames;
pub mod glyphs;
pub mod palette;
pub mod projection;
pub mod synth;

pub use canvas::{Canvas, CanvasLine};
pub use config::Config;
pub use dataset::{Dataset, DatasetError, FlightRow};
pub use frames::{PngFrameSink, Viewport};
pub use palette::RainbowPalette;
pub use projection::{ConicParams, LambertConformalConic};
