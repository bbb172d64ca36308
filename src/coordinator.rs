//! Sampling and reporting coordinator.
//!
//! The core control loop: pulls frames from the source, runs detection and
//! the vehicle filter, and decides when to transmit the count. This is the
//! only component with state that survives an iteration: the monotonic
//! sample counter and running stats.
//!
//! # State machine
//!
//! Two states, `Running` and `Stopped` (terminal). Per iteration while
//! running:
//!
//! 1. Pull and normalize the next frame. End-of-stream stops the loop; a
//!    per-frame read error is handled by the configured [`ReadErrorPolicy`].
//! 2. Detect, then filter to this frame's vehicle count. Detector errors
//!    skip the frame and continue.
//! 3. Increment the sample counter.
//! 4. When the counter hits a report-period boundary AND the count is
//!    non-zero, attempt exactly one send. Send failures never stop the loop.
//! 5. Poll the quit flag; if set, stop and release the source.
//!
//! Sampling every Nth frame bounds outbound network calls independent of
//! the camera frame rate. The count-above-zero guard keeps zero-vehicle
//! reports off the wire, which also means the remote device cannot tell
//! "no update" from "observed zero" (a documented protocol weakness).

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detect::DetectorBackend;
use crate::filter::VehicleFilter;
use crate::ingest::{FrameRead, FrameSource};
use crate::report::ReportSink;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Named policy for a single failed frame read.
///
/// `Stop` treats a failed read as stream loss and ends the loop;
/// `SkipFrame` drops the frame and keeps going. Either way it is an
/// explicit, testable decision rather than incidental control flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadErrorPolicy {
    #[default]
    Stop,
    SkipFrame,
}

/// Why the loop left `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitRequested,
    EndOfStream,
    SourceRead,
}

#[derive(Clone, Copy, Debug)]
pub struct CoordinatorConfig {
    /// Report every Nth processed frame (1-based boundary).
    pub report_period: u64,
    /// Detector input width after normalization.
    pub frame_width: u32,
    /// Detector input height after normalization.
    pub frame_height: u32,
    pub read_error_policy: ReadErrorPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            report_period: 10,
            frame_width: 320,
            frame_height: 240,
            read_error_policy: ReadErrorPolicy::default(),
        }
    }
}

/// Running counters, logged periodically and on shutdown.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinatorStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub reports_sent: u64,
    pub reports_failed: u64,
}

/// Terminal state of a completed run.
#[derive(Clone, Copy, Debug)]
pub struct RunOutcome {
    pub reason: StopReason,
    pub stats: CoordinatorStats,
}

enum Step {
    Continue,
    Stop(StopReason),
}

pub struct Coordinator<S, D, R> {
    source: S,
    detector: D,
    filter: VehicleFilter,
    sink: R,
    config: CoordinatorConfig,
    quit: Arc<AtomicBool>,
    sample_counter: u64,
    stats: CoordinatorStats,
}

impl<S, D, R> Coordinator<S, D, R>
where
    S: FrameSource,
    D: DetectorBackend,
    R: ReportSink,
{
    pub fn new(
        source: S,
        detector: D,
        filter: VehicleFilter,
        sink: R,
        config: CoordinatorConfig,
        quit: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            detector,
            filter,
            sink,
            config,
            quit,
            sample_counter: 0,
            stats: CoordinatorStats::default(),
        }
    }

    /// Run until a terminal condition. Consumes the coordinator so the
    /// source connection is released on every exit path.
    ///
    /// An error here is a failed stream open; everything after open either
    /// stops cleanly with a reason or is absorbed per-iteration.
    pub fn run(mut self) -> Result<RunOutcome> {
        self.source.open().context("open camera stream")?;
        self.detector.warm_up().context("warm up detector")?;
        log::info!(
            "stream open; detector={} report_period={} frames",
            self.detector.name(),
            self.config.report_period
        );

        let mut last_health_log = Instant::now();
        let reason = loop {
            match self.step() {
                Step::Continue => {}
                Step::Stop(reason) => break reason,
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let s = self.stats;
                log::info!(
                    "health: frames={} skipped={} reports_sent={} reports_failed={}",
                    s.frames_processed,
                    s.frames_skipped,
                    s.reports_sent,
                    s.reports_failed
                );
                last_health_log = Instant::now();
            }
        };

        let s = self.stats;
        log::info!(
            "stopped ({:?}): frames={} skipped={} reports_sent={} reports_failed={}",
            reason,
            s.frames_processed,
            s.frames_skipped,
            s.reports_sent,
            s.reports_failed
        );
        Ok(RunOutcome {
            reason,
            stats: s,
        })
    }

    fn step(&mut self) -> Step {
        let frame = match self.source.next_frame() {
            Ok(FrameRead::Frame(frame)) => frame,
            Ok(FrameRead::EndOfStream) => {
                log::error!("camera stream ended");
                return Step::Stop(StopReason::EndOfStream);
            }
            Err(e) => {
                self.stats.frames_skipped += 1;
                return match self.config.read_error_policy {
                    ReadErrorPolicy::Stop => {
                        log::error!("failed to read frame: {:#}", e);
                        Step::Stop(StopReason::SourceRead)
                    }
                    ReadErrorPolicy::SkipFrame => {
                        log::warn!("failed to read frame, skipping: {:#}", e);
                        Step::Continue
                    }
                };
            }
        };

        let frame = match frame.normalize(self.config.frame_width, self.config.frame_height) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.frames_skipped += 1;
                log::warn!("failed to normalize frame, skipping: {:#}", e);
                return self.check_quit();
            }
        };

        let detections = match self
            .detector
            .detect(frame.pixels(), frame.width, frame.height)
        {
            Ok(detections) => detections,
            Err(e) => {
                self.stats.frames_skipped += 1;
                log::warn!("inference failed, skipping frame: {:#}", e);
                return self.check_quit();
            }
        };

        let count = self.filter.count(&detections);
        self.sample_counter += 1;
        self.stats.frames_processed += 1;
        log::debug!("frame {}: {} vehicles", self.sample_counter, count);

        if self.sample_counter % self.config.report_period == 0 && count > 0 {
            match self.sink.send(count) {
                Ok(()) => self.stats.reports_sent += 1,
                Err(e) => {
                    self.stats.reports_failed += 1;
                    log::warn!("report of {} vehicles failed: {:#}", count, e);
                }
            }
        }

        self.check_quit()
    }

    /// Quit is polled once per iteration; mid-inference cancellation is not
    /// supported.
    fn check_quit(&self) -> Step {
        if self.quit.load(Ordering::SeqCst) {
            log::info!("quit requested");
            Step::Stop(StopReason::QuitRequested)
        } else {
            Step::Continue
        }
    }
}
