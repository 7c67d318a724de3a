//! Renderer configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub dataset: PathBuf,
    pub frame_dir: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("flights.csv"),
            frame_dir: PathBuf::from("img"),
            width_px: 1200,
            height_px: 800,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            dataset: lookup("FLIGHTARC_DATASET")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset),
            frame_dir: lookup("FLIGHTARC_FRAME_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.frame_dir),
            width_px: lookup("FLIGHTARC_WIDTH_PX")
                .and_then(|s| s.parse().ok())
                .filter(|&px: &u32| px > 0)
                .unwrap_or(defaults.width_px),
            height_px: lookup("FLIGHTARC_HEIGHT_PX")
                .and_then(|s| s.parse().ok())
                .filter(|&px: &u32| px > 0)
                .unwrap_or(defaults.height_px),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.dataset, PathBuf::from("flights.csv"));
        assert_eq!(config.width_px, 1200);
    }

    #[test]
    fn test_values_read_from_environment() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("FLIGHTARC_DATASET", "/data/jan.csv"),
            ("FLIGHTARC_FRAME_DIR", "/tmp/frames"),
            ("FLIGHTARC_WIDTH_PX", "640"),
            ("FLIGHTARC_HEIGHT_PX", "zero"),
        ]);
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.dataset, PathBuf::from("/data/jan.csv"));
        assert_eq!(config.frame_dir, PathBuf::from("/tmp/frames"));
        assert_eq!(config.width_px, 640);
        assert_eq!(config.height_px, 800);
    }
}
