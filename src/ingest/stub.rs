//! Synthetic frame source for tests and bring-up.
//!
//! Produces frames with a per-frame shifting fill so the stub detector
//! backend sees pixel change between consecutive frames. Paced to the
//! configured target fps like a real camera.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

use super::{CameraConfig, FrameRead, FrameSource};
use crate::frame::RawFrame;

pub struct StubSource {
    config: CameraConfig,
    connected: bool,
    last_frame_at: Option<Instant>,
    frame_count: u64,
}

impl StubSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            connected: false,
            last_frame_at: None,
            frame_count: 0,
        }
    }
}

impl FrameSource for StubSource {
    fn open(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<FrameRead> {
        if !self.connected {
            return Err(anyhow!("stub source not connected; call open() first"));
        }

        if self.config.target_fps > 0 {
            let min_interval = Duration::from_millis(1000 / u64::from(self.config.target_fps));
            if let Some(last) = self.last_frame_at {
                let elapsed = last.elapsed();
                if elapsed < min_interval {
                    std::thread::sleep(min_interval - elapsed);
                }
            }
        }
        self.last_frame_at = Some(Instant::now());

        let fill = (self.frame_count % 251) as u8;
        self.frame_count += 1;
        let len = (self.config.width * self.config.height * 3) as usize;
        let frame = RawFrame::new(vec![fill; len], self.config.width, self.config.height)?;
        Ok(FrameRead::Frame(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CameraConfig {
        CameraConfig {
            url: "stub://camera".into(),
            target_fps: 0,
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn produces_frames_at_configured_dimensions() -> Result<()> {
        let mut source = StubSource::new(test_config());
        source.open()?;
        let FrameRead::Frame(frame) = source.next_frame()? else {
            panic!("stub source never ends");
        };
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 4);
        Ok(())
    }

    #[test]
    fn consecutive_frames_differ() -> Result<()> {
        let mut source = StubSource::new(test_config());
        source.open()?;
        let FrameRead::Frame(first) = source.next_frame()? else {
            panic!("stub source never ends");
        };
        let FrameRead::Frame(second) = source.next_frame()? else {
            panic!("stub source never ends");
        };
        assert_ne!(first.pixels(), second.pixels());
        Ok(())
    }

    #[test]
    fn read_before_open_fails() {
        let mut source = StubSource::new(test_config());
        assert!(source.next_frame().is_err());
    }
}
