//! trafficwatch - camera-based vehicle counting sensor
//!
//! This crate implements a traffic sensor that samples frames from a
//! networked camera, counts vehicles per sampled frame with a pluggable
//! object detector, and periodically reports an aggregate count to a remote
//! controller over a plain-text HTTP protocol.
//!
//! # Architecture
//!
//! Data flows strictly downstream per frame:
//!
//! frame source -> coordinator -> (detector -> vehicle filter) -> coordinator -> report sink
//!
//! The only state carried between iterations lives in the coordinator: the
//! monotonic sample counter and running stats. Frames are owned by exactly
//! one loop iteration and dropped when it ends.
//!
//! # Module Structure
//!
//! - `frame`: RGB frame container and fixed-size normalization
//! - `ingest`: frame sources (HTTP MJPEG camera, synthetic stub)
//! - `detect`: detection data model and detector backends
//! - `filter`: vehicle class allow-list + confidence threshold policy
//! - `report`: count transmission to the remote controller
//! - `coordinator`: the sampling/reporting loop and its state machine
//! - `config`: process-wide runtime configuration

pub mod config;
pub mod coordinator;
pub mod detect;
pub mod filter;
pub mod frame;
pub mod ingest;
pub mod report;

pub use config::SensorConfig;
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorStats, ReadErrorPolicy, RunOutcome, StopReason,
};
pub use detect::{BoundingBox, Detection, DetectorBackend, StubBackend};
pub use filter::VehicleFilter;
pub use frame::RawFrame;
pub use ingest::{open_source, CameraConfig, CameraSource, FrameRead, FrameSource, StubSource};
pub use report::{format_payload, HttpReportSink, ReportSink};
