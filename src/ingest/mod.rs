//! Frame ingestion sources.
//!
//! This module provides sources for raw frames:
//! - HTTP MJPEG/JPEG camera streams (ESP32-CAM class devices)
//! - Stub source (synthetic frames for tests and bring-up)
//!
//! All sources produce `RawFrame` instances on demand. The ingestion layer
//! is responsible for:
//! - Opening the stream connection exactly once, before the first frame
//! - Decoding frames to RGB24
//! - Rate limiting / frame decimation to the configured target fps
//!
//! Sources distinguish three read outcomes: a frame, terminal end-of-stream,
//! and a per-frame read error. How the loop reacts to a read error is the
//! coordinator's policy, not the source's.

pub mod camera;
pub mod stub;

pub use camera::CameraSource;
pub use stub::StubSource;

use anyhow::{anyhow, Context, Result};

use crate::frame::RawFrame;

/// Configuration for a frame source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Stream URL. Supported schemes: http(s):// for MJPEG/JPEG, stub:// for synthetic frames.
    pub url: String,
    /// Target frame rate (frames per second). Source will decimate to this rate.
    pub target_fps: u32,
    /// Frame width (for synthetic frames only; real sources report their own).
    pub width: u32,
    /// Frame height (for synthetic frames only).
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "stub://camera".to_string(),
            target_fps: 10,
            width: 320,
            height: 240,
        }
    }
}

/// Outcome of a single frame read.
pub enum FrameRead {
    Frame(RawFrame),
    /// The stream terminated; no further frames will arrive.
    EndOfStream,
}

/// A lazy, non-restartable sequence of frames from one camera connection.
pub trait FrameSource {
    /// Open the stream. Must be called once before `next_frame`.
    fn open(&mut self) -> Result<()>;

    /// Block until the next frame is available.
    ///
    /// `Err` means a single read failed; the source stays usable and the
    /// caller decides whether to retry or stop.
    fn next_frame(&mut self) -> Result<FrameRead>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn next_frame(&mut self) -> Result<FrameRead> {
        (**self).next_frame()
    }
}

/// Construct a source for the configured URL scheme.
pub fn open_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    let url = url::Url::parse(&config.url).context("parse camera url")?;
    match url.scheme() {
        "http" | "https" => Ok(Box::new(CameraSource::new(config.clone()))),
        "stub" => Ok(Box::new(StubSource::new(config.clone()))),
        other => Err(anyhow!(
            "unsupported camera scheme '{}'; expected http(s) or stub",
            other
        )),
    }
}
