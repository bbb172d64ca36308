mod stub;

pub use stub::StubBackend;

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;

/// Construct a backend by configured name.
pub fn select_backend(name: &str) -> Result<Box<dyn DetectorBackend>> {
    match name {
        "stub" => Ok(Box::new(StubBackend::new())),
        other => Err(anyhow!("unknown detector backend '{}'", other)),
    }
}
