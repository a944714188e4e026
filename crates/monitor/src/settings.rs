//! Monitor settings

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use camera_capture::CameraConfig;
use config::{Config, ConfigError, Environment, File, FileFormat};
use detection_scheduler::SchedulerConfig;
use overlay::OverlayStyle;
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, e.g. `EXPRESSION_MONITOR__SCHEDULER__PERIOD_MS`
pub const ENV_PREFIX: &str = "EXPRESSION_MONITOR";

/// Top-level configuration of the expression monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub log: LogConfig,
    pub camera: CameraConfig,
    pub scheduler: SchedulerConfig,
    pub overlay: OverlayStyle,
    pub session: SessionDefaults,
    pub detector: DetectorConfig,
    /// Stop after this many seconds instead of waiting for Ctrl-C
    pub run_seconds: Option<u64>,
    /// Write the final overlay as PNG here on shutdown. Boxes and label tags
    /// are drawn; label text is not rasterized.
    pub snapshot_path: Option<PathBuf>,
    /// Serve Prometheus metrics on this address
    pub metrics_addr: Option<SocketAddr>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Max level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Which toggles are switched on when the session starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub camera_on_start: bool,
    pub detection_on_start: bool,
    pub expression_mode_on_start: bool,
}

/// Mock detector settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Simulated inference time per frame
    pub latency_ms: u64,
}

impl MonitorConfig {
    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay::{Color, LabelPlacement};

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_toml("").unwrap();
        assert_eq!(config.scheduler.period_ms, 200);
        assert_eq!(config.camera.width, 720);
        assert_eq!(config.camera.height, 560);
        assert_eq!(config.overlay, OverlayStyle::default());
        assert!(!config.session.camera_on_start);
        assert!(!config.session.detection_on_start);
        assert!(!config.session.expression_mode_on_start);
        assert_eq!(config.log.level, "info");
        assert!(config.run_seconds.is_none());
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn test_toml_overrides() {
        let config = MonitorConfig::from_toml(
            r##"
            run_seconds = 5
            snapshot_path = "overlay.png"
            metrics_addr = "127.0.0.1:9100"

            [scheduler]
            period_ms = 100

            [overlay]
            box_color = "#ff0000"
            placement = "allow_clip"

            [session]
            camera_on_start = true
            expression_mode_on_start = true

            [detector]
            latency_ms = 40
            "##,
        )
        .unwrap();

        assert_eq!(config.scheduler.period_ms, 100);
        assert_eq!(config.overlay.box_color, Color::rgb(255, 0, 0));
        assert_eq!(config.overlay.placement, LabelPlacement::AllowClip);
        assert_eq!(config.overlay.line_width, 3.0);
        assert!(config.session.camera_on_start);
        assert!(!config.session.detection_on_start);
        assert_eq!(config.detector.latency_ms, 40);
        assert_eq!(config.run_seconds, Some(5));
        assert_eq!(config.snapshot_path, Some(PathBuf::from("overlay.png")));
        assert_eq!(
            config.metrics_addr,
            Some("127.0.0.1:9100".parse().unwrap())
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = MonitorConfig::load(Some(Path::new("/nonexistent/monitor.toml")));
        assert!(result.is_err());
    }
}
