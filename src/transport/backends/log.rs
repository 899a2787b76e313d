use anyhow::Result;
use tracing::info;

use crate::transport::CursorTransport;

/// Dry-run transport that only logs the reports it receives.
#[derive(Debug, Default)]
pub struct LogTransport {
    reports: u64,
}

impl LogTransport {
    pub fn reports(&self) -> u64 {
        self.reports
    }
}

impl CursorTransport for LogTransport {
    fn report_absolute(&mut self, x: i32, y: i32, buttons: u8) -> Result<()> {
        self.reports += 1;
        info!(x, y, buttons, n = self.reports, "cursor report (dry run)");
        Ok(())
    }
}
