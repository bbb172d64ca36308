//! trafficd - vehicle counting sensor daemon
//!
//! This daemon:
//! 1. Opens the configured camera stream (HTTP MJPEG/JPEG or stub)
//! 2. Runs a detector backend on each sampled frame
//! 3. Filters detections into a per-frame vehicle count
//! 4. POSTs the count to the remote controller at each report boundary
//! 5. Stops cleanly on SIGINT or terminal stream failure

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use trafficwatch::{
    detect::select_backend, Coordinator, CoordinatorConfig, HttpReportSink, SensorConfig,
    VehicleFilter,
};
use trafficwatch::ingest::{open_source, CameraConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON config file (defaults to $TRAFFIC_CONFIG when unset).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Camera stream URL, overriding the config file.
    #[arg(long)]
    camera_url: Option<String>,
    /// Report endpoint URL, overriding the config file.
    #[arg(long)]
    report_url: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = match args.config.as_deref() {
        Some(path) => SensorConfig::load_from(Some(path))?,
        None => SensorConfig::load()?,
    };
    if let Some(url) = args.camera_url {
        cfg.camera.url = url;
    }
    if let Some(url) = args.report_url {
        cfg.report.url = url;
    }

    log::info!(
        "trafficd v{}: camera={} report={} period={} threshold={} classes={:?} frame={}x{}",
        env!("CARGO_PKG_VERSION"),
        cfg.camera.url,
        cfg.report.url,
        cfg.report.period_frames,
        cfg.detect.confidence_threshold,
        cfg.detect.vehicle_classes,
        cfg.detect.frame_width,
        cfg.detect.frame_height
    );

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        ctrlc::set_handler(move || {
            quit.store(true, Ordering::SeqCst);
        })
        .context("install quit handler")?;
    }

    let source = open_source(&CameraConfig {
        url: cfg.camera.url.clone(),
        target_fps: cfg.camera.target_fps,
        width: cfg.detect.frame_width,
        height: cfg.detect.frame_height,
    })?;
    let detector = select_backend(&cfg.detect.backend)?;
    let filter = VehicleFilter::new(
        cfg.detect.vehicle_classes.clone(),
        cfg.detect.confidence_threshold,
    );
    let sink = HttpReportSink::new(cfg.report.url.clone(), cfg.report.timeout);

    let coordinator = Coordinator::new(
        source,
        detector,
        filter,
        sink,
        CoordinatorConfig {
            report_period: cfg.report.period_frames,
            frame_width: cfg.detect.frame_width,
            frame_height: cfg.detect.frame_height,
            read_error_policy: cfg.read_error_policy,
        },
        quit,
    );

    // A failed stream open propagates here and exits non-zero; a clean stop
    // (quit or end-of-stream) exits zero.
    coordinator.run()?;
    Ok(())
}
