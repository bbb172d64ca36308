//! Runtime configuration.
//!
//! All settings are process-wide constants resolved once at startup: a JSON
//! config file (path from `TRAFFIC_CONFIG` or the CLI), then environment
//! overrides, then validation. There is no dynamic reconfiguration.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::coordinator::ReadErrorPolicy;
use crate::detect::{CLASS_BUS, CLASS_CAR, CLASS_MOTORCYCLE, CLASS_TRUCK};

const DEFAULT_CAMERA_URL: &str = "stub://camera";
const DEFAULT_REPORT_URL: &str = "http://192.168.110.41/vehiclecount";
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_REPORT_PERIOD: u64 = 10;
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_FRAME_WIDTH: u32 = 320;
const DEFAULT_FRAME_HEIGHT: u32 = 240;
const DEFAULT_BACKEND: &str = "stub";

#[derive(Debug, Deserialize, Default)]
struct SensorConfigFile {
    camera: Option<CameraConfigFile>,
    report: Option<ReportConfigFile>,
    detect: Option<DetectConfigFile>,
    read_error_policy: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ReportConfigFile {
    url: Option<String>,
    period_frames: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectConfigFile {
    backend: Option<String>,
    confidence_threshold: Option<f32>,
    vehicle_classes: Option<Vec<u32>>,
    frame_width: Option<u32>,
    frame_height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub camera: CameraSettings,
    pub report: ReportSettings,
    pub detect: DetectSettings,
    pub read_error_policy: ReadErrorPolicy,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub url: String,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub url: String,
    pub period_frames: u64,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DetectSettings {
    pub backend: String,
    pub confidence_threshold: f32,
    pub vehicle_classes: Vec<u32>,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl SensorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRAFFIC_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => SensorConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SensorConfigFile) -> Result<Self> {
        let camera = CameraSettings {
            url: file
                .camera
                .as_ref()
                .and_then(|camera| camera.url.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let report = ReportSettings {
            url: file
                .report
                .as_ref()
                .and_then(|report| report.url.clone())
                .unwrap_or_else(|| DEFAULT_REPORT_URL.to_string()),
            period_frames: file
                .report
                .as_ref()
                .and_then(|report| report.period_frames)
                .unwrap_or(DEFAULT_REPORT_PERIOD),
            timeout: Duration::from_secs(
                file.report
                    .as_ref()
                    .and_then(|report| report.timeout_secs)
                    .unwrap_or(DEFAULT_SEND_TIMEOUT_SECS),
            ),
        };
        let detect = DetectSettings {
            backend: file
                .detect
                .as_ref()
                .and_then(|detect| detect.backend.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            confidence_threshold: file
                .detect
                .as_ref()
                .and_then(|detect| detect.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            vehicle_classes: file
                .detect
                .as_ref()
                .and_then(|detect| detect.vehicle_classes.clone())
                .unwrap_or_else(default_vehicle_classes),
            frame_width: file
                .detect
                .as_ref()
                .and_then(|detect| detect.frame_width)
                .unwrap_or(DEFAULT_FRAME_WIDTH),
            frame_height: file
                .detect
                .as_ref()
                .and_then(|detect| detect.frame_height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
        };
        let read_error_policy = match file.read_error_policy.as_deref() {
            Some(policy) => parse_read_error_policy(policy)?,
            None => ReadErrorPolicy::default(),
        };
        Ok(Self {
            camera,
            report,
            detect,
            read_error_policy,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("TRAFFIC_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(url) = std::env::var("TRAFFIC_REPORT_URL") {
            if !url.trim().is_empty() {
                self.report.url = url;
            }
        }
        if let Ok(period) = std::env::var("TRAFFIC_REPORT_PERIOD") {
            let frames: u64 = period
                .parse()
                .map_err(|_| anyhow!("TRAFFIC_REPORT_PERIOD must be an integer frame count"))?;
            self.report.period_frames = frames;
        }
        if let Ok(threshold) = std::env::var("TRAFFIC_CONFIDENCE_THRESHOLD") {
            let value: f32 = threshold
                .parse()
                .map_err(|_| anyhow!("TRAFFIC_CONFIDENCE_THRESHOLD must be a number"))?;
            self.detect.confidence_threshold = value;
        }
        if let Ok(classes) = std::env::var("TRAFFIC_VEHICLE_CLASSES") {
            let parsed = split_csv_classes(&classes)?;
            if !parsed.is_empty() {
                self.detect.vehicle_classes = parsed;
            }
        }
        if let Ok(policy) = std::env::var("TRAFFIC_READ_ERROR_POLICY") {
            if !policy.trim().is_empty() {
                self.read_error_policy = parse_read_error_policy(&policy)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detect.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be within 0..=1"));
        }
        if self.report.period_frames == 0 {
            return Err(anyhow!("report period_frames must be greater than zero"));
        }
        if self.report.timeout.as_secs() == 0 {
            return Err(anyhow!("report timeout_secs must be greater than zero"));
        }
        if self.detect.frame_width == 0 || self.detect.frame_height == 0 {
            return Err(anyhow!("frame dimensions must be greater than zero"));
        }
        if self.detect.vehicle_classes.is_empty() {
            return Err(anyhow!("vehicle_classes must not be empty"));
        }
        Ok(())
    }
}

fn default_vehicle_classes() -> Vec<u32> {
    vec![CLASS_CAR, CLASS_MOTORCYCLE, CLASS_BUS, CLASS_TRUCK]
}

fn parse_read_error_policy(value: &str) -> Result<ReadErrorPolicy> {
    match value.trim().to_lowercase().as_str() {
        "stop" => Ok(ReadErrorPolicy::Stop),
        "skip" => Ok(ReadErrorPolicy::SkipFrame),
        other => Err(anyhow!(
            "read_error_policy must be 'stop' or 'skip', got '{}'",
            other
        )),
    }
}

fn read_config_file(path: &Path) -> Result<SensorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv_classes(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse()
                .map_err(|_| anyhow!("TRAFFIC_VEHICLE_CLASSES entries must be integers"))
        })
        .collect()
}
