//! Vehicle filter policy.
//!
//! Maps a frame's detection set to a vehicle count by applying the class
//! allow-list and the confidence threshold. A detection counts iff its
//! confidence is strictly greater than the threshold AND its class is in
//! the allow-list. `confidence == threshold` never counts.
//!
//! There is no deduplication or tracking across frames: each frame's count
//! is computed independently.

use crate::detect::Detection;

/// Process-wide vehicle counting policy, built once at startup.
#[derive(Clone, Debug)]
pub struct VehicleFilter {
    classes: Vec<u32>,
    threshold: f32,
}

impl VehicleFilter {
    pub fn new(classes: Vec<u32>, threshold: f32) -> Self {
        Self { classes, threshold }
    }

    /// Detections that pass the policy, in input order. Exposed so an
    /// annotation layer can draw the counted boxes.
    pub fn passing<'a>(&self, detections: &'a [Detection]) -> Vec<&'a Detection> {
        detections
            .iter()
            .filter(|d| d.confidence > self.threshold && self.classes.contains(&d.class_id))
            .collect()
    }

    /// Vehicle count for one frame.
    pub fn count(&self, detections: &[Detection]) -> u32 {
        self.passing(detections).len() as u32
    }
}
