//! Daemon configuration.
//!
//! Loaded from an optional TOML file (path from `--config` or the
//! `FACEGUARD_CONFIG` environment variable), merged over defaults and
//! validated. Defaults follow the deployment this daemon replaces:
//! tolerance 0.6, a 10 s unknown-event window, a 25 s known-log window,
//! detection on every 4th frame at quarter resolution.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;
const DEFAULT_REOPEN_BACKOFF_MS: u64 = 500;
const DEFAULT_ENGINE: &str = "stub";
const DEFAULT_TOLERANCE: f32 = 0.6;
const DEFAULT_DETECT_EVERY: u64 = 4;
const DEFAULT_DETECT_SCALE: u32 = 4;
const DEFAULT_MAX_FACES: usize = 10;
const DEFAULT_MIN_FACE_PX: u32 = 20;
const DEFAULT_UNKNOWN_WINDOW_SECS: u64 = 10;
const DEFAULT_KNOWN_LOG_WINDOW_SECS: u64 = 25;
const DEFAULT_CATALOG: &str = "known_faces.json";
const DEFAULT_REGISTRY: &str = "intruder_descriptors.json";
const DEFAULT_ENTRY_LOG: &str = "entry_log.txt";
const DEFAULT_SNAPSHOT_DIR: &str = "intruders";

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    feeds: Option<Vec<String>>,
    capture: Option<CaptureFile>,
    recognition: Option<RecognitionFile>,
    debounce: Option<DebounceFile>,
    storage: Option<StorageFile>,
    alert: Option<AlertFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureFile {
    width: Option<u32>,
    height: Option<u32>,
    reopen_backoff_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RecognitionFile {
    engine: Option<String>,
    tolerance: Option<f32>,
    detect_every: Option<u64>,
    detect_scale: Option<u32>,
    max_faces: Option<usize>,
    min_face_px: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DebounceFile {
    unknown_secs: Option<u64>,
    known_log_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct StorageFile {
    catalog: Option<PathBuf>,
    registry: Option<PathBuf>,
    entry_log: Option<PathBuf>,
    snapshots: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertFile {
    webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Camera feed URIs (`stub:<name>`, `v4l2:<device>`).
    pub feeds: Vec<String>,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Wait between releasing a failed source and reopening it.
    pub reopen_backoff: Duration,
    /// Detection backend name.
    pub engine: String,
    /// Match acceptance distance; lower is stricter.
    pub tolerance: f32,
    /// Run detection on every Nth frame; others pass through untouched.
    pub detect_every: u64,
    /// Integer divisor applied to frames before detection.
    pub detect_scale: u32,
    /// Detection counts above this drop the frame as garbled.
    pub max_faces: usize,
    /// Minimum detection box side, in downscaled-frame pixels.
    pub min_face_px: u32,
    pub unknown_window: Duration,
    pub known_log_window: Duration,
    pub catalog_path: PathBuf,
    pub registry_path: PathBuf,
    pub entry_log_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub webhook_url: Option<String>,
}

impl Config {
    /// Load configuration, preferring `path`, then `FACEGUARD_CONFIG`,
    /// then built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("FACEGUARD_CONFIG").ok().map(PathBuf::from);
        let file = match path.or(env_path.as_deref()) {
            Some(p) => read_config_file(p)?,
            None => ConfigFile::default(),
        };
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let capture = file.capture.unwrap_or_default();
        let recognition = file.recognition.unwrap_or_default();
        let debounce = file.debounce.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let alert = file.alert.unwrap_or_default();

        Self {
            feeds: file.feeds.unwrap_or_default(),
            frame_width: capture.width.unwrap_or(DEFAULT_WIDTH),
            frame_height: capture.height.unwrap_or(DEFAULT_HEIGHT),
            reopen_backoff: Duration::from_millis(
                capture.reopen_backoff_ms.unwrap_or(DEFAULT_REOPEN_BACKOFF_MS),
            ),
            engine: recognition.engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            tolerance: recognition.tolerance.unwrap_or(DEFAULT_TOLERANCE),
            detect_every: recognition.detect_every.unwrap_or(DEFAULT_DETECT_EVERY),
            detect_scale: recognition.detect_scale.unwrap_or(DEFAULT_DETECT_SCALE),
            max_faces: recognition.max_faces.unwrap_or(DEFAULT_MAX_FACES),
            min_face_px: recognition.min_face_px.unwrap_or(DEFAULT_MIN_FACE_PX),
            unknown_window: Duration::from_secs(
                debounce.unknown_secs.unwrap_or(DEFAULT_UNKNOWN_WINDOW_SECS),
            ),
            known_log_window: Duration::from_secs(
                debounce.known_log_secs.unwrap_or(DEFAULT_KNOWN_LOG_WINDOW_SECS),
            ),
            catalog_path: storage.catalog.unwrap_or_else(|| DEFAULT_CATALOG.into()),
            registry_path: storage.registry.unwrap_or_else(|| DEFAULT_REGISTRY.into()),
            entry_log_path: storage.entry_log.unwrap_or_else(|| DEFAULT_ENTRY_LOG.into()),
            snapshot_dir: storage.snapshots.unwrap_or_else(|| DEFAULT_SNAPSHOT_DIR.into()),
            webhook_url: alert.webhook_url,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            bail!("capture resolution must be non-zero");
        }
        if !(self.tolerance > 0.0) {
            bail!("recognition tolerance must be positive, got {}", self.tolerance);
        }
        if self.detect_every == 0 {
            bail!("detect_every must be at least 1");
        }
        if self.detect_scale == 0 {
            bail!("detect_scale must be at least 1");
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_file(ConfigFile::default());
        assert_eq!(cfg.tolerance, 0.6);
        assert_eq!(cfg.detect_every, 4);
        assert_eq!(cfg.detect_scale, 4);
        assert_eq!(cfg.max_faces, 10);
        assert_eq!(cfg.min_face_px, 20);
        assert_eq!(cfg.unknown_window, Duration::from_secs(10));
        assert_eq!(cfg.known_log_window, Duration::from_secs(25));
        assert_eq!((cfg.frame_width, cfg.frame_height), (320, 240));
        assert!(cfg.webhook_url.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_full_file() {
        let raw = r#"
            feeds = ["stub:lobby", "v4l2:/dev/video0"]

            [capture]
            width = 640
            height = 480
            reopen_backoff_ms = 250

            [recognition]
            tolerance = 0.5
            detect_every = 2

            [debounce]
            unknown_secs = 30

            [storage]
            snapshots = "captures"

            [alert]
            webhook_url = "http://127.0.0.1:9000/alerts"
        "#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        let cfg = Config::from_file(file);

        assert_eq!(cfg.feeds.len(), 2);
        assert_eq!((cfg.frame_width, cfg.frame_height), (640, 480));
        assert_eq!(cfg.reopen_backoff, Duration::from_millis(250));
        assert_eq!(cfg.tolerance, 0.5);
        assert_eq!(cfg.detect_every, 2);
        assert_eq!(cfg.unknown_window, Duration::from_secs(30));
        assert_eq!(cfg.known_log_window, Duration::from_secs(25));
        assert_eq!(cfg.snapshot_dir, PathBuf::from("captures"));
        assert_eq!(cfg.webhook_url.as_deref(), Some("http://127.0.0.1:9000/alerts"));
    }

    #[test]
    fn test_validate_rejects_zero_skip_rate() {
        let mut cfg = Config::from_file(ConfigFile::default());
        cfg.detect_every = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        let mut cfg = Config::from_file(ConfigFile::default());
        cfg.tolerance = 0.0;
        assert!(cfg.validate().is_err());
    }
}
