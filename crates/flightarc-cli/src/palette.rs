//! Carrier colors sampled from the gist_rainbow color map.

use std::collections::HashMap;

use flightarc_core::{CarrierPalette, LineColor};

type Segments = &'static [(f64, f64)];

const RED: Segments = &[
    (0.0, 1.0),
    (0.03, 1.0),
    (0.215, 1.0),
    (0.4, 0.0),
    (0.586, 0.0),
    (0.77, 0.0),
    (0.954, 1.0),
    (1.0, 1.0),
];
const GREEN: Segments = &[
    (0.0, 0.0),
    (0.03, 0.0),
    (0.215, 1.0),
    (0.4, 1.0),
    (0.586, 1.0),
    (0.77, 0.0),
    (0.954, 0.0),
    (1.0, 0.0),
];
const BLUE: Segments = &[
    (0.0, 0.16),
    (0.03, 0.0),
    (0.215, 0.0),
    (0.4, 0.0),
    (0.586, 1.0),
    (0.77, 1.0),
    (0.954, 1.0),
    (1.0, 0.75),
];

pub const UNKNOWN_CARRIER: LineColor = LineColor::new(0.5, 0.5, 0.5, 1.0);

fn sample(segments: Segments, x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    for pair in segments.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if x1 - x0 <= f64::EPSILON {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    segments.last().map(|&(_, y)| y).unwrap_or(0.0)
}

/// Color at position `x` in [0, 1] along the map.
pub fn gist_rainbow(x: f64) -> LineColor {
    LineColor::new(sample(RED, x), sample(GREEN, x), sample(BLUE, x), 1.0)
}

/// One fixed color per carrier, spread evenly over the map.
#[derive(Debug, Clone, Default)]
pub struct RainbowPalette {
    colors: HashMap<String, LineColor>,
}

impl RainbowPalette {
    pub fn new(carriers: &[String], alpha: f64) -> Self {
        let last = carriers.len().saturating_sub(1).max(1) as f64;
        let colors = carriers
            .iter()
            .enumerate()
            .map(|(i, carrier)| {
                let position = if carriers.len() == 1 { 0.0 } else { i as f64 / last };
                (carrier.clone(), gist_rainbow(position).with_alpha(alpha))
            })
            .collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl CarrierPalette for RainbowPalette {
    fn color_for(&self, carrier: &str) -> LineColor {
        self.colors.get(carrier).copied().unwrap_or(UNKNOWN_CARRIER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: LineColor, b: LineColor) -> bool {
        (a.r - b.r).abs() < 1e-9 && (a.g - b.g).abs() < 1e-9 && (a.b - b.b).abs() < 1e-9
    }

    #[test]
    fn test_gist_rainbow_anchor_points() {
        assert!(close(gist_rainbow(0.0), LineColor::new(1.0, 0.0, 0.16, 1.0)));
        assert!(close(gist_rainbow(0.4), LineColor::new(0.0, 1.0, 0.0, 1.0)));
        assert!(close(gist_rainbow(0.77), LineColor::new(0.0, 0.0, 1.0, 1.0)));
        assert!(close(gist_rainbow(1.0), LineColor::new(1.0, 0.0, 0.75, 1.0)));
        // halfway between 0.215 and 0.4
        let mid = gist_rainbow(0.3075);
        assert!((mid.r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_palette_spreads_carriers_and_sets_alpha() {
        let carriers: Vec<String> = ["AA", "DL", "UA"].iter().map(|s| s.to_string()).collect();
        let palette = RainbowPalette::new(&carriers, 0.3);

        assert_eq!(palette.len(), 3);
        assert!(close(palette.color_for("AA"), gist_rainbow(0.0)));
        assert!(close(palette.color_for("DL"), gist_rainbow(0.5)));
        assert!(close(palette.color_for("UA"), gist_rainbow(1.0)));
        assert!((palette.color_for("UA").a - 0.3).abs() < 1e-12);
        assert_eq!(palette.color_for("ZZ"), UNKNOWN_CARRIER);
    }

    #[test]
    fn test_single_carrier_takes_start_of_map() {
        let palette = RainbowPalette::new(&["WN".to_string()], 1.0);
        assert!(close(palette.color_for("WN"), gist_rainbow(0.0)));
    }
}
