use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// This is the seam where the black-box detection capability plugs in.
/// `detect` is blocking and non-cancellable: the coordinator waits for it to
/// complete before anything else happens in the iteration. A slow backend
/// stalls the whole loop by design.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB24 frame.
    ///
    /// Implementations must treat the pixel slice as read-only and
    /// ephemeral. Errors are per-frame: the caller skips the frame and
    /// continues.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<B: DetectorBackend + ?Sized> DetectorBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        (**self).detect(pixels, width, height)
    }

    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }
}
