//! RGB frame container and fixed-size normalization.
//!
//! Frames arrive from the source at whatever resolution the camera serves
//! and are normalized to the configured detector input size before
//! inference. A frame is owned by exactly one loop iteration.

use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::RgbImage;

/// An immutable RGB24 raster image.
pub struct RawFrame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawFrame {
    /// Create a frame from tightly packed RGB24 bytes.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Resize to the target dimensions. Pass-through when already sized.
    pub fn normalize(self, width: u32, height: u32) -> Result<RawFrame> {
        if self.width == width && self.height == height {
            return Ok(self);
        }
        let image = RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| anyhow!("frame buffer does not match dimensions"))?;
        let resized = image::imageops::resize(&image, width, height, FilterType::Triangle);
        Ok(RawFrame {
            data: resized.into_raw(),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer_length() {
        assert!(RawFrame::new(vec![0u8; 10], 2, 2).is_err());
    }

    #[test]
    fn normalize_is_pass_through_at_target_size() -> Result<()> {
        let frame = RawFrame::new(vec![7u8; 2 * 2 * 3], 2, 2)?;
        let normalized = frame.normalize(2, 2)?;
        assert_eq!(normalized.pixels(), &[7u8; 12][..]);
        Ok(())
    }

    #[test]
    fn normalize_resizes_to_target_dimensions() -> Result<()> {
        let frame = RawFrame::new(vec![128u8; 4 * 4 * 3], 4, 4)?;
        let normalized = frame.normalize(2, 2)?;
        assert_eq!(normalized.width, 2);
        assert_eq!(normalized.height, 2);
        assert_eq!(normalized.pixels().len(), 2 * 2 * 3);
        Ok(())
    }
}
