// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Persistent rendering and batch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallframeConfig {
    /// Root directory for rendered mockups (one subdirectory per job).
    pub output_dir: PathBuf,
    /// Directory where finished job manifests are written.
    pub manifest_dir: PathBuf,
    /// Worker pool size per batch job.
    pub concurrency: usize,
    /// JPEG quality for encoded output (1-100).
    pub jpeg_quality: u8,
    /// Pixels painted past the zone boundary to hide chroma-edge bleed.
    pub overshoot_px: u32,
    /// Relative aspect-ratio tolerance for a "good" match.
    pub match_tolerance: f64,
    /// Linear expansion applied when a template has no explicit safe zone.
    pub safe_zone_expansion: f64,
    /// Per-item timeout for the external forwarding hop.
    pub forward_timeout_ms: u64,
    /// Logo overlaid on platform mockups; no branding when unset.
    pub logo_path: Option<PathBuf>,
}

impl Default for WallframeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output/mockups"),
            manifest_dir: PathBuf::from("output/manifests"),
            concurrency: 3,
            jpeg_quality: 90,
            overshoot_px: 8,
            match_tolerance: 0.15,
            safe_zone_expansion: 0.3,
            forward_timeout_ms: 10_000,
            logo_path: None,
        }
    }
}

impl WallframeConfig {
    /// Load settings from a JSON file. A missing file yields the defaults;
    /// a malformed one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&data)?;
        if config.concurrency == 0 {
            warn!("concurrency of 0 in config, using 1");
            config.concurrency = 1;
        }
        Ok(config)
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = WallframeConfig::load(dir.path().join("nope.json")).expect("load");
        assert_eq!(config, WallframeConfig::default());
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wallframe.json");
        let config = WallframeConfig {
            concurrency: 6,
            logo_path: Some(PathBuf::from("brand/logo.png")),
            ..WallframeConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(WallframeConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"jpeg_quality": 75, "concurrency": 0}"#).expect("write");
        let config = WallframeConfig::load(&path).expect("load");
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.overshoot_px, 8);
    }
}
