//! Count transmission to the remote controller.
//!
//! Reports are best-effort telemetry: one POST attempt with a bounded
//! timeout, no retry. A failed send is logged with the attempted payload;
//! the next reporting opportunity is the de facto retry.

use anyhow::{Context, Result};
use std::time::Duration;

/// Sends one formatted count payload to the remote endpoint.
pub trait ReportSink {
    fn send(&mut self, count: u32) -> Result<()>;
}

impl<R: ReportSink + ?Sized> ReportSink for Box<R> {
    fn send(&mut self, count: u32) -> Result<()> {
        (**self).send(count)
    }
}

/// Wire payload: two comma-separated integers. The protocol reserves two
/// fields for directional counts, but only one undirected count is
/// computed, so the same scalar fills both fields as a placeholder.
pub fn format_payload(count: u32) -> String {
    format!("{},{}", count, count)
}

/// HTTP POST report sink. Opens a short-lived connection per send.
pub struct HttpReportSink {
    url: String,
    timeout: Duration,
}

impl HttpReportSink {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self { url, timeout }
    }
}

impl ReportSink for HttpReportSink {
    fn send(&mut self, count: u32) -> Result<()> {
        let payload = format_payload(count);
        let request = ureq::post(&self.url)
            .timeout(self.timeout)
            .set("Content-Type", "text/plain");
        // Any HTTP response counts as delivered; the status code is not
        // interpreted. Only transport failure or timeout is a send error.
        let body = match request.send_string(&payload) {
            Ok(response) => response
                .into_string()
                .context("read report response body")?,
            Err(ureq::Error::Status(_, response)) => {
                response.into_string().unwrap_or_default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("post report to {}", self.url));
            }
        };
        log::info!("report sent: {} -> {}", payload, body.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_duplicates_count_into_both_fields() {
        assert_eq!(format_payload(3), "3,3");
        assert_eq!(format_payload(0), "0,0");
        assert_eq!(format_payload(42), "42,42");
    }
}
