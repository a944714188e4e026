//! Expression Monitor
//!
//! Wires a camera, a detector and an overlay canvas into a monitoring
//! session and drives it headlessly:
//! - `Session`: camera/detection/expression toggles over one shared state
//! - `MonitorConfig`: file + environment configuration
//! - `run`: the `expression-monitor` main loop

pub mod settings;
pub mod session;

pub use settings::{DetectorConfig, LogConfig, MonitorConfig, SessionDefaults};
pub use session::{Session, SessionError};

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use camera_capture::SyntheticCamera;
use expression::MockDetector;
use metrics_exporter_prometheus::PrometheusBuilder;
use overlay::{OverlayRenderer, RasterCanvas};
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics exporter failed: {0}")]
    Metrics(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to write overlay snapshot: {0}")]
    Snapshot(#[from] image::ImageError),

    #[error("Signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

/// Initialize logging
pub fn init_logging(config: &LogConfig) -> Result<(), MonitorError> {
    let level = Level::from_str(&config.level)
        .map_err(|e| MonitorError::Logging(format!("{}: {e}", config.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| MonitorError::Logging(e.to_string()))
}

/// Serve Prometheus metrics over HTTP
pub fn install_metrics(addr: SocketAddr) -> Result<(), MonitorError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MonitorError::Metrics(e.to_string()))?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Run a session with the synthetic camera and mock detector until Ctrl-C
/// or until `run_seconds` elapse
pub async fn run(config: MonitorConfig) -> Result<(), MonitorError> {
    if let Some(addr) = config.metrics_addr {
        install_metrics(addr)?;
    }

    let detector = MockDetector::new()
        .with_latency(Duration::from_millis(config.detector.latency_ms));
    let canvas = RasterCanvas::new(config.camera.width, config.camera.height);
    let mut session = Session::new(
        SyntheticCamera::new(config.camera.clone()),
        Arc::new(detector),
        canvas,
        config.scheduler.clone(),
        OverlayRenderer::new(config.overlay.clone()),
    )?;
    session.apply_defaults(&config.session)?;

    let deadline = async {
        match config.run_seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut report = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = report.tick() => {
                let snapshot = session.snapshot();
                let [faces, top] = snapshot.status_lines();
                info!(
                    background = snapshot.background_hex,
                    "{} | {}", faces, top
                );
            }
            _ = &mut deadline => {
                info!("Run time elapsed, shutting down");
                break;
            }
            result = &mut ctrl_c => {
                result?;
                info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    if let Some(path) = &config.snapshot_path {
        session.shared().with_canvas(|canvas| canvas.save(path))?;
        info!("Overlay snapshot written to {}", path.display());
    }

    let summary = serde_json::to_string(&session.snapshot()).unwrap_or_default();
    info!("Final session state: {}", summary);
    session.teardown();
    Ok(())
}
