//! End-to-end properties of the sampling/reporting coordinator, exercised
//! with scripted source, detector, and sink collaborators.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use trafficwatch::{
    BoundingBox, Coordinator, CoordinatorConfig, Detection, DetectorBackend, FrameRead,
    FrameSource, RawFrame, ReadErrorPolicy, ReportSink, StopReason, VehicleFilter,
};

const CAR: u32 = 2;

fn frame(fill: u8) -> RawFrame {
    RawFrame::new(vec![fill; 4 * 4 * 3], 4, 4).expect("test frame")
}

fn car(confidence: f32) -> Detection {
    Detection {
        class_id: CAR,
        confidence,
        bbox: BoundingBox::new(0, 0, 4, 4),
    }
}

/// Source that replays a fixed sequence of reads, then ends the stream.
struct ScriptedSource {
    reads: VecDeque<Result<FrameRead>>,
    fail_open: bool,
}

impl ScriptedSource {
    fn frames(n: usize) -> Self {
        Self {
            reads: (0..n)
                .map(|i| Ok(FrameRead::Frame(frame(i as u8))))
                .collect(),
            fail_open: false,
        }
    }

    fn from_reads(reads: Vec<Result<FrameRead>>) -> Self {
        Self {
            reads: reads.into(),
            fail_open: false,
        }
    }

    fn failing_open() -> Self {
        Self {
            reads: VecDeque::new(),
            fail_open: true,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(anyhow!("camera unreachable"));
        }
        Ok(())
    }

    fn next_frame(&mut self) -> Result<FrameRead> {
        self.reads.pop_front().unwrap_or(Ok(FrameRead::EndOfStream))
    }
}

/// Detector that replays per-frame results; frames beyond the script see
/// no detections.
struct ScriptedDetector {
    results: VecDeque<Result<Vec<Detection>>>,
}

impl ScriptedDetector {
    fn new(results: Vec<Result<Vec<Detection>>>) -> Self {
        Self {
            results: results.into(),
        }
    }

    fn empty() -> Self {
        Self::new(vec![])
    }

    /// Script where frame `index` (1-based) yields the given detections and
    /// every other frame up to `total` yields none.
    fn only_at(total: usize, index: usize, detections: Vec<Detection>) -> Self {
        let mut results: Vec<Result<Vec<Detection>>> =
            (0..total).map(|_| Ok(vec![])).collect();
        results[index - 1] = Ok(detections);
        Self::new(results)
    }
}

impl DetectorBackend for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        self.results.pop_front().unwrap_or(Ok(vec![]))
    }
}

#[derive(Default)]
struct SinkLog {
    attempts: Vec<u32>,
}

/// Sink that records every attempted count and fails the first
/// `fail_first` attempts with a simulated transport error.
struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    fail_first: usize,
}

impl RecordingSink {
    fn new() -> (Self, Arc<Mutex<SinkLog>>) {
        Self::failing_first(0)
    }

    fn failing_first(fail_first: usize) -> (Self, Arc<Mutex<SinkLog>>) {
        let log = Arc::new(Mutex::new(SinkLog::default()));
        (
            Self {
                log: log.clone(),
                fail_first,
            },
            log,
        )
    }
}

impl ReportSink for RecordingSink {
    fn send(&mut self, count: u32) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.attempts.push(count);
        if log.attempts.len() <= self.fail_first {
            return Err(anyhow!("simulated network timeout"));
        }
        Ok(())
    }
}

fn test_config(policy: ReadErrorPolicy) -> CoordinatorConfig {
    CoordinatorConfig {
        report_period: 10,
        frame_width: 4,
        frame_height: 4,
        read_error_policy: policy,
    }
}

fn default_filter() -> VehicleFilter {
    VehicleFilter::new(vec![2, 3, 5, 7], 0.5)
}

fn run_coordinator(
    source: ScriptedSource,
    detector: ScriptedDetector,
    sink: RecordingSink,
) -> trafficwatch::RunOutcome {
    let coordinator = Coordinator::new(
        source,
        detector,
        default_filter(),
        sink,
        test_config(ReadErrorPolicy::Stop),
        Arc::new(AtomicBool::new(false)),
    );
    coordinator.run().expect("run")
}

#[test]
fn reports_exactly_at_period_boundary_with_nonzero_count() {
    let detector =
        ScriptedDetector::only_at(20, 10, vec![car(0.9), car(0.8), car(0.7)]);
    let (sink, log) = RecordingSink::new();

    let outcome = run_coordinator(ScriptedSource::frames(20), detector, sink);

    assert_eq!(outcome.reason, StopReason::EndOfStream);
    assert_eq!(log.lock().unwrap().attempts, vec![3]);
    assert_eq!(outcome.stats.reports_sent, 1);
    assert_eq!(outcome.stats.frames_processed, 20);
}

#[test]
fn zero_count_at_boundary_sends_nothing() {
    let (sink, log) = RecordingSink::new();

    let outcome = run_coordinator(ScriptedSource::frames(10), ScriptedDetector::empty(), sink);

    assert_eq!(outcome.stats.frames_processed, 10);
    assert!(log.lock().unwrap().attempts.is_empty());
}

#[test]
fn nonzero_count_off_boundary_sends_nothing() {
    // Vehicles on frames 3 and 7, nothing at the frame-10 boundary.
    let mut results: Vec<anyhow::Result<Vec<Detection>>> =
        (0..10).map(|_| Ok(vec![])).collect();
    results[2] = Ok(vec![car(0.9)]);
    results[6] = Ok(vec![car(0.9), car(0.8)]);
    let (sink, log) = RecordingSink::new();

    let outcome = run_coordinator(
        ScriptedSource::frames(10),
        ScriptedDetector::new(results),
        sink,
    );

    assert_eq!(outcome.stats.frames_processed, 10);
    assert!(log.lock().unwrap().attempts.is_empty());
}

#[test]
fn inference_failure_skips_frame_and_loop_continues() {
    let detector = ScriptedDetector::new(vec![
        Ok(vec![]),
        Err(anyhow!("malformed frame")),
        Ok(vec![car(0.9)]),
    ]);
    let (sink, _log) = RecordingSink::new();

    let outcome = run_coordinator(ScriptedSource::frames(3), detector, sink);

    assert_eq!(outcome.reason, StopReason::EndOfStream);
    assert_eq!(outcome.stats.frames_processed, 2);
    assert_eq!(outcome.stats.frames_skipped, 1);
}

#[test]
fn send_failure_does_not_stop_loop_or_block_next_report() {
    let mut results: Vec<anyhow::Result<Vec<Detection>>> =
        (0..20).map(|_| Ok(vec![])).collect();
    results[9] = Ok(vec![car(0.9), car(0.8)]);
    results[19] = Ok(vec![car(0.9), car(0.8), car(0.7), car(0.6)]);
    let (sink, log) = RecordingSink::failing_first(1);

    let outcome = run_coordinator(
        ScriptedSource::frames(20),
        ScriptedDetector::new(results),
        sink,
    );

    assert_eq!(outcome.reason, StopReason::EndOfStream);
    assert_eq!(log.lock().unwrap().attempts, vec![2, 4]);
    assert_eq!(outcome.stats.reports_failed, 1);
    assert_eq!(outcome.stats.reports_sent, 1);
}

#[test]
fn read_error_stops_loop_under_stop_policy() {
    let source = ScriptedSource::from_reads(vec![
        Ok(FrameRead::Frame(frame(0))),
        Err(anyhow!("truncated frame")),
        Ok(FrameRead::Frame(frame(1))),
    ]);
    let (sink, _log) = RecordingSink::new();

    let outcome = run_coordinator(source, ScriptedDetector::empty(), sink);

    assert_eq!(outcome.reason, StopReason::SourceRead);
    assert_eq!(outcome.stats.frames_processed, 1);
}

#[test]
fn read_error_is_skipped_under_skip_policy() {
    let source = ScriptedSource::from_reads(vec![
        Ok(FrameRead::Frame(frame(0))),
        Err(anyhow!("truncated frame")),
        Ok(FrameRead::Frame(frame(1))),
    ]);
    let (sink, _log) = RecordingSink::new();

    let coordinator = Coordinator::new(
        source,
        ScriptedDetector::empty(),
        default_filter(),
        sink,
        test_config(ReadErrorPolicy::SkipFrame),
        Arc::new(AtomicBool::new(false)),
    );
    let outcome = coordinator.run().expect("run");

    assert_eq!(outcome.reason, StopReason::EndOfStream);
    assert_eq!(outcome.stats.frames_processed, 2);
    assert_eq!(outcome.stats.frames_skipped, 1);
}

#[test]
fn open_failure_terminates_without_any_send_attempt() {
    let (sink, log) = RecordingSink::new();

    let coordinator = Coordinator::new(
        ScriptedSource::failing_open(),
        ScriptedDetector::empty(),
        default_filter(),
        sink,
        test_config(ReadErrorPolicy::Stop),
        Arc::new(AtomicBool::new(false)),
    );

    assert!(coordinator.run().is_err());
    assert!(log.lock().unwrap().attempts.is_empty());
}

#[test]
fn quit_flag_stops_after_current_iteration() {
    let (sink, _log) = RecordingSink::new();
    let quit = Arc::new(AtomicBool::new(true));

    let coordinator = Coordinator::new(
        ScriptedSource::frames(50),
        ScriptedDetector::empty(),
        default_filter(),
        sink,
        test_config(ReadErrorPolicy::Stop),
        quit,
    );
    let outcome = coordinator.run().expect("run");

    // The in-flight iteration completes before the flag is honored.
    assert_eq!(outcome.reason, StopReason::QuitRequested);
    assert_eq!(outcome.stats.frames_processed, 1);
}
