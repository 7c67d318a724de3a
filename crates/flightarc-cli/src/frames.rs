//! PNG frame persistence.
//!
//! Every frame rasterizes the whole canvas onto a black background with
//! anti-aliased, alpha-blended segments, stamps the clock in the lower-left
//! corner and writes `<dir>/<sequence:07>.png`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use flightarc_core::{CollaboratorError, FrameInfo, FrameSink, LineColor, PlotPoint};
use image::{Rgb, RgbImage};

use crate::canvas::Canvas;
use crate::glyphs;

const LABEL_COLOR: Rgb<u8> = Rgb([204, 204, 204]);
const LABEL_OFFSET_HOURS: i64 = -5;

/// Clock label shown on each frame, in Eastern Standard Time.
pub fn clock_label(clock: DateTime<Utc>) -> String {
    let local = clock + Duration::hours(LABEL_OFFSET_HOURS);
    format!("{} EST", local.format("%H:%M:%S"))
}

/// Maps plot coordinates (map meters, origin lower-left) onto the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width_px: u32,
    pub height_px: u32,
    pub extent_width: f64,
    pub extent_height: f64,
}

impl Viewport {
    pub fn to_pixel(&self, point: PlotPoint) -> (f64, f64) {
        (
            point.x / self.extent_width * self.width_px as f64 - 0.5,
            (1.0 - point.y / self.extent_height) * self.height_px as f64 - 0.5,
        )
    }
}

/// Draw every visible canvas line into a fresh image.
pub fn rasterize(canvas: &Canvas, viewport: &Viewport) -> RgbImage {
    let mut image = RgbImage::new(viewport.width_px, viewport.height_px);
    for (_, line) in canvas.lines() {
        if !line.is_visible() {
            continue;
        }
        for pair in line.points.windows(2) {
            draw_segment(
                &mut image,
                viewport.to_pixel(pair[0]),
                viewport.to_pixel(pair[1]),
                line.color,
            );
        }
    }
    image
}

fn blend(image: &mut RgbImage, x: i64, y: i64, color: LineColor, coverage: f64) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let weight = (color.a * coverage).clamp(0.0, 1.0);
    if weight <= 0.0 {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (channel, target) in pixel.0.iter_mut().zip([color.r, color.g, color.b]) {
        let current = *channel as f64 / 255.0;
        let mixed = current + (target - current) * weight;
        *channel = (mixed * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn fract(v: f64) -> f64 {
    v - v.floor()
}

/// Xiaolin Wu's anti-aliased line between two pixel-space points.
pub fn draw_segment(image: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: LineColor) {
    let (mut x0, mut y0) = from;
    let (mut x1, mut y1) = to;
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
        return;
    }

    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }
    let span = (if steep { image.height() } else { image.width() }) as i64;

    let mut plot = |x: i64, y: i64, coverage: f64| {
        if steep {
            blend(image, y, x, color, coverage);
        } else {
            blend(image, x, y, color, coverage);
        }
    };

    let dx = x1 - x0;
    let gradient = if dx.abs() < f64::EPSILON {
        1.0
    } else {
        (y1 - y0) / dx
    };

    let x_start = x0.round();
    let y_start = y0 + gradient * (x_start - x0);
    let gap = 1.0 - fract(x0 + 0.5);
    plot(x_start as i64, y_start.floor() as i64, (1.0 - fract(y_start)) * gap);
    plot(x_start as i64, y_start.floor() as i64 + 1, fract(y_start) * gap);

    let x_end = x1.round();
    let y_end = y1 + gradient * (x_end - x1);
    let gap = fract(x1 + 0.5);
    plot(x_end as i64, y_end.floor() as i64, (1.0 - fract(y_end)) * gap);
    plot(x_end as i64, y_end.floor() as i64 + 1, fract(y_end) * gap);

    // Only walk the columns that can land on the image.
    let first = (x_start as i64 + 1).max(0);
    let last = (x_end as i64).min(span);
    for x in first..last {
        let y = y_start + gradient * (x as f64 - x_start);
        plot(x, y.floor() as i64, 1.0 - fract(y));
        plot(x, y.floor() as i64 + 1, fract(y));
    }
}

/// Writes one PNG per frame into a directory.
#[derive(Debug, Clone)]
pub struct PngFrameSink {
    dir: PathBuf,
    viewport: Viewport,
    label_scale: u32,
}

impl PngFrameSink {
    /// Create the sink, making `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>, viewport: Viewport) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let label_scale = (viewport.height_px / 200).max(1);
        Ok(Self {
            dir,
            viewport,
            label_scale,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("{sequence:07}.png"))
    }

    fn stamp_label(&self, image: &mut RgbImage, clock: DateTime<Utc>) {
        let label = clock_label(clock);
        let (_, text_height) = glyphs::text_size(&label, self.label_scale);
        let margin = 2 * self.label_scale;
        let y = self
            .viewport
            .height_px
            .saturating_sub(text_height + margin);
        glyphs::draw_text(image, &label, margin, y, self.label_scale, LABEL_COLOR);
    }
}

impl FrameSink<Canvas> for PngFrameSink {
    fn write_frame(&mut self, frame: &FrameInfo, canvas: &Canvas) -> Result<(), CollaboratorError> {
        let mut image = rasterize(canvas, &self.viewport);
        self.stamp_label(&mut image, frame.clock);

        let path = self.frame_path(frame.sequence);
        image.save(&path).map_err(|err| {
            CollaboratorError::with_source(format!("cannot write {}", path.display()), err)
        })?;
        tracing::trace!("Wrote frame {}", path.display());
        Ok(())
    }
}
