use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, CLASS_CAR};

/// Stub backend for testing and bring-up. Uses pixel hashing to detect
/// change between consecutive frames and reports a single full-frame
/// vehicle detection when the frame changed.
#[derive(Default)]
pub struct StubBackend {
    last_hash: Option<[u8; 32]>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let current_hash: [u8; 32] = Sha256::digest(pixels).into();

        let changed = self.last_hash.is_some_and(|prev| prev != current_hash);

        self.last_hash = Some(current_hash);

        if changed {
            Ok(vec![Detection {
                class_id: CLASS_CAR,
                confidence: 0.85,
                bbox: BoundingBox::new(0, 0, width as i32, height as i32),
            }])
        } else {
            Ok(vec![])
        }
    }
}
